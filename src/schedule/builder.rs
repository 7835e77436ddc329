//! core business logic, fill one month's schedule slot by slot

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::availability::AvailabilityIndex;
use crate::config::{Config, Job, Person};
use crate::dates::sundays_of_month;
use crate::error::{BlockReason, GenerateError};
use crate::score::{ScoreInput, score};
use crate::siblings::SiblingIndex;

use super::history::{HistoryIndex, HistoryRecord};
use super::{Assignment, Conflict, Schedule, SchedulePreview, ServiceDate, SlotKey, Status};

/// which month to plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub year: i32,
    pub month: u32,
    pub name: Option<String>,
}

/// cooperative cancellation flag, checked between service dates
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// plan one month and return the proposed schedule together with unresolved
/// conflicts and the resulting per-person workload
pub fn generate(
    config: &Config,
    history: &[HistoryRecord],
    request: &GenerateRequest,
) -> Result<SchedulePreview, GenerateError> {
    ScheduleBuilder::new(config, history, request)?.build(&CancelToken::new())
}

/// the hard rules a candidate must pass for one slot, first failure wins
pub(crate) struct HardRules<'a> {
    pub config: &'a Config,
    pub availability: &'a AvailabilityIndex,
    pub siblings: &'a SiblingIndex,
    pub year: i32,
    pub month: u32,
}

impl HardRules<'_> {
    pub(crate) fn block_reason(
        &self,
        history: &HistoryIndex,
        person: &Person,
        job: &Job,
        date: NaiveDate,
        same_day: &[(String, String)],
    ) -> Option<BlockReason> {
        if let Err(reason) = self.availability.is_eligible(person, job, date) {
            return Some(reason);
        }
        if history.run_through(&person.id, date) > person.max_consecutive_weeks {
            return Some(BlockReason::ExceedsConsecutiveWeeks);
        }
        if same_day
            .iter()
            .any(|(job_id, person_id)| *person_id == person.id && *job_id == job.id)
        {
            return Some(BlockReason::DuplicatePersonOnSchedule);
        }
        if history.served_in_month(&person.id, &job.id, self.year, self.month) {
            return Some(BlockReason::AlreadyAssignedThisMonth);
        }
        if job.consecutive_month_restricted
            && history.served_in_prior_month(&person.id, &job.id, self.year, self.month)
        {
            return Some(BlockReason::ConsecutiveMonthForbidden);
        }
        if same_day.iter().any(|(job_id, person_id)| {
            *person_id == person.id && self.config.day_exclusive(job_id, &job.id)
        }) {
            return Some(BlockReason::DayExclusivityViolation);
        }
        if same_day
            .iter()
            .any(|(_, person_id)| self.siblings.is_separate(&person.id, person_id))
        {
            return Some(BlockReason::SiblingSeparateViolation);
        }
        None
    }
}

struct Ranked {
    score: f64,
    count_this_year: u32,
    last_service: Option<NaiveDate>,
    person_id: String,
}

/// builds the schedule for one month, consumed by `build`
pub struct ScheduleBuilder<'a> {
    config: &'a Config,
    people: Vec<&'a Person>,
    jobs: Vec<&'a Job>,
    availability: AvailabilityIndex,
    siblings: SiblingIndex,
    history: HistoryIndex,
    year: i32,
    month: u32,
    schedule: Schedule,
    conflicts: Vec<Conflict>,
}

impl<'a> ScheduleBuilder<'a> {
    /// validate the input snapshot and materialize one empty slot per
    /// (date, job, position)
    pub fn new(
        config: &'a Config,
        history: &[HistoryRecord],
        request: &GenerateRequest,
    ) -> Result<Self, GenerateError> {
        if !(1..=12).contains(&request.month) {
            return Err(GenerateError::InvalidMonth {
                month: request.month,
            });
        }
        if !(2000..=2100).contains(&request.year) {
            return Err(GenerateError::InvalidYear { year: request.year });
        }
        config.validate()?;
        for record in history {
            if config.person(&record.person_id).is_none() {
                return Err(GenerateError::UnknownHistoryPerson {
                    person_id: record.person_id.clone(),
                });
            }
            if config.job(&record.job_id).is_none() {
                return Err(GenerateError::UnknownHistoryJob {
                    job_id: record.job_id.clone(),
                });
            }
        }

        let mut people: Vec<&Person> = config.person.iter().collect();
        people.sort_by(|a, b| a.id.cmp(&b.id));
        let jobs = config.active_jobs();

        let service_dates = sundays_of_month(request.year, request.month)
            .into_iter()
            .map(|date| ServiceDate {
                date,
                assignments: jobs
                    .iter()
                    .flat_map(|job| {
                        (1..=job.people_required).map(|position| Assignment {
                            job_id: job.id.clone(),
                            position,
                            person_id: None,
                            manual_override: false,
                        })
                    })
                    .collect(),
            })
            .collect();

        let schedule = Schedule {
            year: request.year,
            month: request.month,
            name: request
                .name
                .clone()
                .unwrap_or_else(|| format!("{:04}-{:02}", request.year, request.month)),
            status: Status::Draft,
            service_dates,
        };

        Ok(Self {
            config,
            people,
            jobs,
            availability: AvailabilityIndex::new(config),
            siblings: SiblingIndex::new(&config.sibling_group),
            history: HistoryIndex::from_records(history),
            year: request.year,
            month: request.month,
            schedule,
            conflicts: Vec::new(),
        })
    }

    /// visit every slot, dates ascending, scarcest job first, positions
    /// ascending
    pub fn build(mut self, cancel: &CancelToken) -> Result<SchedulePreview, GenerateError> {
        info!(
            year = self.year,
            month = self.month,
            dates = self.schedule.service_dates.len(),
            "generating schedule"
        );

        for date_index in 0..self.schedule.service_dates.len() {
            if cancel.is_cancelled() {
                return Err(GenerateError::Cancelled);
            }
            let date = self.schedule.service_dates[date_index].date;
            for job_index in self.scarcity_order(date) {
                let job = self.jobs[job_index];
                for position in 1..=job.people_required {
                    self.fill_slot(date_index, job, position);
                }
            }
        }

        let fairness = self.history.fairness(&self.people, self.year);
        info!(conflicts = self.conflicts.len(), "schedule generated");

        Ok(SchedulePreview {
            schedule: self.schedule,
            conflicts: self.conflicts,
            fairness,
        })
    }

    /// job indices for this date, fewest eligible people first
    fn scarcity_order(&self, date: NaiveDate) -> Vec<usize> {
        let mut order: Vec<(usize, usize)> = self
            .jobs
            .iter()
            .enumerate()
            .map(|(index, job)| {
                let eligible = self
                    .people
                    .iter()
                    .filter(|person| self.availability.is_eligible(person, job, date).is_ok())
                    .count();
                (eligible, index)
            })
            .collect();
        // jobs are sorted by id, so the index breaks ties deterministically
        order.sort();
        order.into_iter().map(|(_, index)| index).collect()
    }

    fn fill_slot(&mut self, date_index: usize, job: &Job, position: u32) {
        let date = self.schedule.service_dates[date_index].date;
        let same_day = self.schedule.assigned_on(date, &[]);
        let rules = HardRules {
            config: self.config,
            availability: &self.availability,
            siblings: &self.siblings,
            year: self.year,
            month: self.month,
        };

        let mut eliminated: BTreeMap<BlockReason, usize> = BTreeMap::new();
        let mut candidates: Vec<Ranked> = Vec::new();
        for person in &self.people {
            match rules.block_reason(&self.history, person, job, date, &same_day) {
                // inactive and unqualified people were never in contention
                Some(BlockReason::Inactive | BlockReason::NotQualified) => {}
                Some(reason) => *eliminated.entry(reason).or_insert(0) += 1,
                None => {
                    let bag = self
                        .history
                        .rotation_bag(&person.id, &job.id, job.people_required);
                    let input = ScoreInput {
                        count_this_year: self.history.count_this_year(&person.id, self.year),
                        last_service: self.history.last_service_date(&person.id),
                        preference_level: person.preference_level,
                        preferred_frequency: person.preferred_frequency,
                        together_sibling_on_date: same_day
                            .iter()
                            .any(|(_, person_id)| self.siblings.is_together(&person.id, person_id)),
                        position_in_bag: bag.contains(&position),
                    };
                    candidates.push(Ranked {
                        score: score(&self.config.weights, date, &input),
                        count_this_year: input.count_this_year,
                        last_service: input.last_service,
                        person_id: person.id.clone(),
                    });
                }
            }
        }

        if candidates.is_empty() {
            let near_miss = eliminated
                .iter()
                .fold(None::<(BlockReason, usize)>, |best, (&reason, &count)| {
                    match best {
                        Some((_, best_count)) if best_count >= count => best,
                        _ => Some((reason, count)),
                    }
                })
                .map(|(reason, _)| reason);
            warn!(%date, job = %job.id, position, "no eligible person");
            self.conflicts.push(Conflict {
                slot: SlotKey::new(date, job.id.clone(), position),
                near_miss,
            });
            return;
        }

        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.count_this_year.cmp(&b.count_this_year))
                .then_with(|| a.last_service.cmp(&b.last_service))
                .then_with(|| a.person_id.cmp(&b.person_id))
        });
        let chosen = &candidates[0];
        debug!(%date, job = %job.id, position, person = %chosen.person_id, score = chosen.score, "slot filled");

        if let Some(slot) = self.schedule.service_dates[date_index]
            .assignments
            .iter_mut()
            .find(|a| a.job_id == job.id && a.position == position)
        {
            slot.person_id = Some(chosen.person_id.clone());
        }
        let person_id = chosen.person_id.clone();
        self.history.record(&person_id, &job.id, date, position);
    }
}
