//! answers whether a person may serve a given job on a given date

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::config::{Config, JOB_LECTORES, JOB_MONAGUILLOS, Job, Person};
use crate::error::BlockReason;

/// unavailability ranges of one person
///
/// absolute ranges are sorted by start and carry a running maximum of range
/// ends, so one binary search answers whether any range reaches a date
#[derive(Debug, Default, Clone)]
struct PersonRanges {
    absolute: Vec<(NaiveDate, NaiveDate)>,
    max_end: Vec<NaiveDate>,
    recurring: Vec<((u32, u32), (u32, u32))>,
}

/// precomputed availability lookup over the whole roster
#[derive(Debug, Default, Clone)]
pub struct AvailabilityIndex {
    ranges: BTreeMap<String, PersonRanges>,
}

impl AvailabilityIndex {
    pub fn new(config: &Config) -> Self {
        let mut ranges: BTreeMap<String, PersonRanges> = BTreeMap::new();

        for unavailability in &config.unavailability {
            let entry = ranges.entry(unavailability.person_id.clone()).or_default();
            if unavailability.recurring {
                entry.recurring.push((
                    (
                        unavailability.start_date.month(),
                        unavailability.start_date.day(),
                    ),
                    (
                        unavailability.end_date.month(),
                        unavailability.end_date.day(),
                    ),
                ));
            } else {
                entry
                    .absolute
                    .push((unavailability.start_date, unavailability.end_date));
            }
        }

        for entry in ranges.values_mut() {
            entry.absolute.sort();
            let mut running_max: Option<NaiveDate> = None;
            entry.max_end = entry
                .absolute
                .iter()
                .map(|(_, end)| {
                    let max = running_max.map_or(*end, |m| m.max(*end));
                    running_max = Some(max);
                    max
                })
                .collect();
        }

        Self { ranges }
    }

    /// check the hard availability rules in order, the first broken rule is
    /// reported
    pub fn is_eligible(&self, person: &Person, job: &Job, date: NaiveDate) -> Result<(), BlockReason> {
        if !person.active {
            return Err(BlockReason::Inactive);
        }
        if !person.is_qualified(&job.id) {
            return Err(BlockReason::NotQualified);
        }
        if (person.exclude_monaguillos && job.name == JOB_MONAGUILLOS)
            || (person.exclude_lectores && job.name == JOB_LECTORES)
        {
            return Err(BlockReason::ExcludedFromJob);
        }
        if self.is_unavailable(&person.id, date) {
            return Err(BlockReason::Unavailable);
        }
        Ok(())
    }

    /// true when any unavailability range of the person covers the date
    pub fn is_unavailable(&self, person_id: &str, date: NaiveDate) -> bool {
        let Some(ranges) = self.ranges.get(person_id) else {
            return false;
        };

        let starting_before = ranges.absolute.partition_point(|(start, _)| *start <= date);
        if starting_before > 0 && ranges.max_end[starting_before - 1] >= date {
            return true;
        }

        let month_day = (date.month(), date.day());
        ranges.recurring.iter().any(|(start, end)| {
            if start <= end {
                *start <= month_day && month_day <= *end
            } else {
                // window wraps over new year's eve
                month_day >= *start || month_day <= *end
            }
        })
    }
}
