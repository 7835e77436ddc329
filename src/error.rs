//! error types for configuration loading, generation, edits and publishing

use std::fmt;

use thiserror::Error;

use crate::schedule::{EmptySlot, SlotKey};

/// first hard rule a person breaks for a given slot
///
/// variants are listed in the order the rules are checked
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BlockReason {
    Inactive,
    NotQualified,
    ExcludedFromJob,
    Unavailable,
    ExceedsConsecutiveWeeks,
    DuplicatePersonOnSchedule,
    AlreadyAssignedThisMonth,
    ConsecutiveMonthForbidden,
    DayExclusivityViolation,
    SiblingSeparateViolation,
}

impl BlockReason {
    /// stable key for message lookup in a calling ui
    pub fn message_key(&self) -> &'static str {
        match self {
            BlockReason::Inactive => "block.inactive",
            BlockReason::NotQualified => "block.not_qualified",
            BlockReason::ExcludedFromJob => "block.excluded_from_job",
            BlockReason::Unavailable => "block.unavailable",
            BlockReason::ExceedsConsecutiveWeeks => "block.exceeds_consecutive_weeks",
            BlockReason::DuplicatePersonOnSchedule => "block.duplicate_person_on_schedule",
            BlockReason::AlreadyAssignedThisMonth => "block.already_assigned_this_month",
            BlockReason::ConsecutiveMonthForbidden => "block.consecutive_month_forbidden",
            BlockReason::DayExclusivityViolation => "block.day_exclusivity_violation",
            BlockReason::SiblingSeparateViolation => "block.sibling_separate_violation",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BlockReason::Inactive => "person is not active",
            BlockReason::NotQualified => "person is not qualified for this job",
            BlockReason::ExcludedFromJob => "person is excluded from this job",
            BlockReason::Unavailable => "person is unavailable on this date",
            BlockReason::ExceedsConsecutiveWeeks => {
                "person would exceed their consecutive weeks limit"
            }
            BlockReason::DuplicatePersonOnSchedule => {
                "person already fills a position of this job on this date"
            }
            BlockReason::AlreadyAssignedThisMonth => "person already serves this job this month",
            BlockReason::ConsecutiveMonthForbidden => "person served this job last month",
            BlockReason::DayExclusivityViolation => {
                "person already serves another job on this date"
            }
            BlockReason::SiblingSeparateViolation => {
                "a sibling that must be scheduled separately already serves on this date"
            }
        };
        f.write_str(text)
    }
}

/// configuration could not be loaded or does not describe a usable roster
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("duplicate job id {job_id}")]
    DuplicateJob { job_id: String },
    #[error("duplicate person id {person_id}")]
    DuplicatePerson { person_id: String },
    #[error("duplicate sibling group id {group_id}")]
    DuplicateGroup { group_id: String },
    #[error("job {job_id} needs at least one position")]
    NoPositions { job_id: String },
    #[error("job {job_id}: positions must be numbered 1..=people_required without gaps")]
    PositionsMismatch { job_id: String },
    #[error("{referenced_by} references unknown job {job_id}")]
    UnknownJob {
        job_id: String,
        referenced_by: String,
    },
    #[error("{referenced_by} references unknown person {person_id}")]
    UnknownPerson {
        person_id: String,
        referenced_by: String,
    },
    #[error("person {person_id}: preference_level must be within 1..=10")]
    PreferenceLevelOutOfRange { person_id: String },
    #[error("person {person_id}: max_consecutive_weeks must be at least 1")]
    ZeroConsecutiveWeeks { person_id: String },
    #[error("unavailability of {person_id} ends before it starts")]
    InvertedRange { person_id: String },
}

/// a generation run could not start or was cancelled
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("month {month} is outside 1..=12")]
    InvalidMonth { month: u32 },
    #[error("year {year} is outside 2000..=2100")]
    InvalidYear { year: i32 },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("history references unknown person {person_id}")]
    UnknownHistoryPerson { person_id: String },
    #[error("history references unknown job {job_id}")]
    UnknownHistoryJob { job_id: String },
    #[error("generation was cancelled")]
    Cancelled,
}

/// a manual edit was rejected, the schedule is left untouched
#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("only a draft schedule can be edited")]
    NotDraft,
    #[error("no slot {slot} in this schedule")]
    UnknownSlot { slot: SlotKey },
    #[error("unknown person {person_id}")]
    UnknownPerson { person_id: String },
    #[error("slot {slot} is empty")]
    SlotEmpty { slot: SlotKey },
    #[error("slot {slot} is already filled")]
    SlotOccupied { slot: SlotKey },
    #[error("{person_id} cannot fill {slot}: {reason}")]
    Blocked {
        person_id: String,
        slot: SlotKey,
        reason: BlockReason,
    },
}

/// an illegal lifecycle transition
#[derive(Debug, Error, PartialEq)]
pub enum PublishError {
    #[error("schedule has {} empty slots", .empty_slots.len())]
    Incomplete { empty_slots: Vec<EmptySlot> },
    #[error("schedule is already published")]
    AlreadyPublished,
    #[error("only a draft schedule can be published")]
    NotDraft,
    #[error("only a published schedule can be archived")]
    NotPublished,
}

/// csv import or export failed
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("could not read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("could not flush csv writer")]
    Flush,
    #[error("csv output was not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}
