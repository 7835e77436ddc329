use chrono::Datelike;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::{Config, Person};
use crate::dates::prior_month;

/// one published assignment, the append-only log the engine reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub person_id: String,
    pub job_id: String,
    pub service_date: NaiveDate,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Service {
    date: NaiveDate,
    job_id: String,
    position: u32,
}

#[derive(Debug, Default, Clone)]
struct PersonHistory {
    services: Vec<Service>, // sorted by (date, job, position)
    dates: BTreeSet<NaiveDate>,
}

/// per-person view over the assignment history plus whatever the current run
/// has committed so far
#[derive(Debug, Default, Clone)]
pub struct HistoryIndex {
    by_person: BTreeMap<String, PersonHistory>,
}

impl HistoryIndex {
    pub fn from_records(records: &[HistoryRecord]) -> Self {
        let mut index = Self::default();
        for record in records {
            index.record(
                &record.person_id,
                &record.job_id,
                record.service_date,
                record.position,
            );
        }
        index
    }

    pub fn record(&mut self, person_id: &str, job_id: &str, date: NaiveDate, position: u32) {
        let history = self.by_person.entry(person_id.to_string()).or_default();
        let service = Service {
            date,
            job_id: job_id.to_string(),
            position,
        };
        let insert_at = history.services.partition_point(|s| *s <= service);
        history.services.insert(insert_at, service);
        history.dates.insert(date);
    }

    pub fn count_this_year(&self, person_id: &str, year: i32) -> u32 {
        self.by_person.get(person_id).map_or(0, |history| {
            history.services.iter().filter(|s| s.date.year() == year).count() as u32
        })
    }

    pub fn count_by_job_this_year(&self, person_id: &str, job_id: &str, year: i32) -> u32 {
        self.by_person.get(person_id).map_or(0, |history| {
            history
                .services
                .iter()
                .filter(|s| s.date.year() == year && s.job_id == job_id)
                .count() as u32
        })
    }

    pub fn last_service_date(&self, person_id: &str) -> Option<NaiveDate> {
        self.by_person
            .get(person_id)
            .and_then(|history| history.dates.last().copied())
    }

    pub fn served_on(&self, person_id: &str, date: NaiveDate) -> bool {
        self.by_person
            .get(person_id)
            .is_some_and(|history| history.dates.contains(&date))
    }

    /// unbroken run of weekly services ending on the sunday strictly before
    /// the date
    pub fn consecutive_weeks_ending_at(&self, person_id: &str, date: NaiveDate) -> u32 {
        let mut run = 0;
        let mut current = date - Duration::days(7);
        while self.served_on(person_id, current) {
            run += 1;
            current -= Duration::days(7);
        }
        run
    }

    /// length of the weekly run the date would become part of if the person
    /// served on it
    pub fn run_through(&self, person_id: &str, date: NaiveDate) -> u32 {
        let mut run = 1 + self.consecutive_weeks_ending_at(person_id, date);
        let mut current = date + Duration::days(7);
        while self.served_on(person_id, current) {
            run += 1;
            current += Duration::days(7);
        }
        run
    }

    pub fn served_in_month(&self, person_id: &str, job_id: &str, year: i32, month: u32) -> bool {
        self.by_person.get(person_id).is_some_and(|history| {
            history.services.iter().any(|s| {
                s.job_id == job_id && s.date.year() == year && s.date.month() == month
            })
        })
    }

    /// true iff the person served the job in the calendar month immediately
    /// before (year, month), wrapping december into january
    pub fn served_in_prior_month(
        &self,
        person_id: &str,
        job_id: &str,
        year: i32,
        month: u32,
    ) -> bool {
        let (prior_year, prior) = prior_month(year, month);
        self.served_in_month(person_id, job_id, prior_year, prior)
    }

    /// positions of the job the person has not performed yet in the current
    /// rotation cycle
    ///
    /// a used-up bag starts a fresh cycle, so the result is never empty
    pub fn rotation_bag(&self, person_id: &str, job_id: &str, position_count: u32) -> BTreeSet<u32> {
        let all: BTreeSet<u32> = (1..=position_count).collect();
        let Some(history) = self.by_person.get(person_id) else {
            return all;
        };

        let mut covered: BTreeSet<u32> = BTreeSet::new();
        for service in history.services.iter().filter(|s| s.job_id == job_id) {
            if all.contains(&service.position) {
                covered.insert(service.position);
            }
            if covered.len() == all.len() {
                covered.clear();
            }
        }

        all.difference(&covered).copied().collect()
    }

    /// per-person workload summary over one year, people in the given order
    pub fn fairness(&self, people: &[&Person], year: i32) -> Vec<FairnessScore> {
        people
            .iter()
            .map(|person| {
                let mut by_job: BTreeMap<String, u32> = BTreeMap::new();
                if let Some(history) = self.by_person.get(&person.id) {
                    for service in history.services.iter().filter(|s| s.date.year() == year) {
                        *by_job.entry(service.job_id.clone()).or_default() += 1;
                    }
                }
                FairnessScore {
                    person_id: person.id.clone(),
                    total_this_year: self.count_this_year(&person.id, year),
                    by_job,
                    last_service_date: self.last_service_date(&person.id),
                }
            })
            .collect()
    }
}

/// per-person workload summary for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FairnessScore {
    pub person_id: String,
    pub total_this_year: u32,
    pub by_job: BTreeMap<String, u32>,
    pub last_service_date: Option<NaiveDate>,
}

/// summarize the log for every configured person, sorted by person id
pub fn fairness_report(config: &Config, history: &[HistoryRecord], year: i32) -> Vec<FairnessScore> {
    let index = HistoryIndex::from_records(history);
    let mut people: Vec<&Person> = config.person.iter().collect();
    people.sort_by(|a, b| a.id.cmp(&b.id));
    index.fairness(&people, year)
}
