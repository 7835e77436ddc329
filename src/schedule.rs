//! the generated schedule: service dates, assignments and their lifecycle

use std::fmt;

use chrono::NaiveDate;

use crate::config::Config;
use crate::error::{BlockReason, PublishError};

pub mod builder;
pub mod edit;
pub mod history;

pub use builder::{CancelToken, GenerateRequest, ScheduleBuilder, generate};
pub use edit::{Edit, apply_edit, validate_edit};
pub use history::{FairnessScore, HistoryIndex, HistoryRecord, fairness_report};

/// lifecycle of a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Draft,
    Published,
    Archived,
}

/// one month worth of service dates and their assignments
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub year: i32,
    pub month: u32,
    pub name: String,
    pub status: Status,
    pub service_dates: Vec<ServiceDate>,
}

/// a single sunday with one assignment per (job, position) slot
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDate {
    pub date: NaiveDate,
    pub assignments: Vec<Assignment>,
}

/// one slot of the (date, job) cross product, possibly still empty
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub job_id: String,
    pub position: u32,
    pub person_id: Option<String>,
    pub manual_override: bool,
}

/// coordinates of one slot
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub job_id: String,
    pub position: u32,
}

impl SlotKey {
    pub fn new(date: NaiveDate, job_id: impl Into<String>, position: u32) -> Self {
        Self {
            date,
            job_id: job_id.into(),
            position,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} #{}", self.date, self.job_id, self.position)
    }
}

/// a slot the builder could not fill
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub slot: SlotKey,
    /// the rule that eliminated the most otherwise eligible people
    pub near_miss: Option<BlockReason>,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.near_miss {
            Some(reason) => write!(f, "no eligible person for {} ({reason})", self.slot),
            None => write!(f, "no eligible person for {}", self.slot),
        }
    }
}

/// slot coordinates readable by humans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptySlot {
    pub date: NaiveDate,
    pub job_name: String,
    pub position_name: String,
}

/// whether every slot of a schedule has a person
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completeness {
    Complete,
    Incomplete { empty_slots: Vec<EmptySlot> },
}

/// what one generation run returns
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulePreview {
    pub schedule: Schedule,
    pub conflicts: Vec<Conflict>,
    pub fairness: Vec<FairnessScore>,
}

impl Schedule {
    pub fn slot(&self, key: &SlotKey) -> Option<&Assignment> {
        self.service_date(key.date)?
            .assignments
            .iter()
            .find(|a| a.job_id == key.job_id && a.position == key.position)
    }

    pub(crate) fn slot_mut(&mut self, key: &SlotKey) -> Option<&mut Assignment> {
        self.service_dates
            .iter_mut()
            .find(|d| d.date == key.date)?
            .assignments
            .iter_mut()
            .find(|a| a.job_id == key.job_id && a.position == key.position)
    }

    pub fn service_date(&self, date: NaiveDate) -> Option<&ServiceDate> {
        self.service_dates.iter().find(|d| d.date == date)
    }

    /// (job_id, person_id) pairs filled on the date, slots in `exclude` skipped
    pub(crate) fn assigned_on(&self, date: NaiveDate, exclude: &[&SlotKey]) -> Vec<(String, String)> {
        let Some(service_date) = self.service_date(date) else {
            return Vec::new();
        };
        service_date
            .assignments
            .iter()
            .filter(|a| {
                !exclude
                    .iter()
                    .any(|key| key.job_id == a.job_id && key.position == a.position)
            })
            .filter_map(|a| {
                a.person_id
                    .as_ref()
                    .map(|person_id| (a.job_id.clone(), person_id.clone()))
            })
            .collect()
    }

    /// list every slot without a person
    pub fn completeness(&self, config: &Config) -> Completeness {
        let mut empty_slots = Vec::new();
        for service_date in &self.service_dates {
            for assignment in &service_date.assignments {
                if assignment.person_id.is_none() {
                    let job_name = config
                        .job(&assignment.job_id)
                        .map(|j| j.name.clone())
                        .unwrap_or_else(|| assignment.job_id.clone());
                    let position_name = config
                        .position_name(&assignment.job_id, assignment.position)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("#{}", assignment.position));
                    empty_slots.push(EmptySlot {
                        date: service_date.date,
                        job_name,
                        position_name,
                    });
                }
            }
        }
        if empty_slots.is_empty() {
            Completeness::Complete
        } else {
            Completeness::Incomplete { empty_slots }
        }
    }

    /// a complete draft becomes published and yields the history records the
    /// caller appends to the log, exactly once
    pub fn publish(&mut self, config: &Config) -> Result<Vec<HistoryRecord>, PublishError> {
        match self.status {
            Status::Published => return Err(PublishError::AlreadyPublished),
            Status::Archived => return Err(PublishError::NotDraft),
            Status::Draft => {}
        }
        if let Completeness::Incomplete { empty_slots } = self.completeness(config) {
            return Err(PublishError::Incomplete { empty_slots });
        }

        let mut records = Vec::new();
        for service_date in &self.service_dates {
            for assignment in &service_date.assignments {
                if let Some(person_id) = &assignment.person_id {
                    records.push(HistoryRecord {
                        person_id: person_id.clone(),
                        job_id: assignment.job_id.clone(),
                        service_date: service_date.date,
                        position: assignment.position,
                    });
                }
            }
        }

        self.status = Status::Published;
        Ok(records)
    }

    pub fn archive(&mut self) -> Result<(), PublishError> {
        if self.status != Status::Published {
            return Err(PublishError::NotPublished);
        }
        self.status = Status::Archived;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tiny_schedule() -> Schedule {
        Schedule {
            year: 2026,
            month: 2,
            name: "2026-02".to_string(),
            status: Status::Draft,
            service_dates: vec![ServiceDate {
                date: d(2026, 2, 15),
                assignments: vec![
                    Assignment {
                        job_id: "monaguillos".to_string(),
                        position: 1,
                        person_id: Some("ana".to_string()),
                        manual_override: false,
                    },
                    Assignment {
                        job_id: "monaguillos".to_string(),
                        position: 3,
                        person_id: None,
                        manual_override: false,
                    },
                ],
            }],
        }
    }

    #[test]
    fn slot_lookup_matches_all_three_coordinates() {
        let schedule = tiny_schedule();

        assert!(
            schedule
                .slot(&SlotKey::new(d(2026, 2, 15), "monaguillos", 1))
                .is_some()
        );
        assert!(
            schedule
                .slot(&SlotKey::new(d(2026, 2, 15), "monaguillos", 2))
                .is_none()
        );
        assert!(
            schedule
                .slot(&SlotKey::new(d(2026, 2, 8), "monaguillos", 1))
                .is_none()
        );
    }

    #[test]
    fn incomplete_schedule_reports_readable_coordinates() {
        let config = load_config("test/config.toml").unwrap();
        let schedule = tiny_schedule();

        let Completeness::Incomplete { empty_slots } = schedule.completeness(&config) else {
            panic!("schedule has an empty slot");
        };
        assert_eq!(
            vec![EmptySlot {
                date: d(2026, 2, 15),
                job_name: "Monaguillos".to_string(),
                position_name: "Monaguillo 3".to_string(),
            }],
            empty_slots
        );
    }

    #[test]
    fn publish_rejects_incomplete_schedule() {
        let config = load_config("test/config.toml").unwrap();
        let mut schedule = tiny_schedule();

        let result = schedule.publish(&config);

        assert!(matches!(
            result,
            Err(PublishError::Incomplete { empty_slots }) if empty_slots.len() == 1
        ));
        assert_eq!(Status::Draft, schedule.status);
    }

    #[test]
    fn publish_emits_history_once_and_rejects_a_second_attempt() {
        let config = load_config("test/config.toml").unwrap();
        let mut schedule = tiny_schedule();
        schedule.service_dates[0].assignments[1].person_id = Some("eva".to_string());

        let records = schedule.publish(&config).unwrap();

        assert_eq!(2, records.len());
        assert_eq!("ana", records[0].person_id);
        assert_eq!(d(2026, 2, 15), records[0].service_date);
        assert_eq!(Status::Published, schedule.status);

        assert_eq!(Err(PublishError::AlreadyPublished), schedule.publish(&config));
    }

    #[test]
    fn archive_requires_published() {
        let config = load_config("test/config.toml").unwrap();
        let mut schedule = tiny_schedule();

        assert_eq!(Err(PublishError::NotPublished), schedule.archive());

        schedule.service_dates[0].assignments[1].person_id = Some("eva".to_string());
        schedule.publish(&config).unwrap();
        schedule.archive().unwrap();
        assert_eq!(Status::Archived, schedule.status);

        assert_eq!(Err(PublishError::NotDraft), schedule.publish(&config));
    }
}
