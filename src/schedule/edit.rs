//! validated manual edits on a draft schedule
//!
//! manual edits skip the fairness score but never the hard rules, every
//! operation either applies completely or leaves the schedule untouched

use tracing::debug;

use crate::availability::AvailabilityIndex;
use crate::config::Config;
use crate::error::EditError;
use crate::siblings::SiblingIndex;

use super::builder::HardRules;
use super::history::{HistoryIndex, HistoryRecord};
use super::{Schedule, SlotKey, Status};

/// a manual change to one or two slots
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// put a person into a slot, whoever held it before is dropped
    Replace { slot: SlotKey, person_id: String },
    /// empty a slot
    Clear { slot: SlotKey },
    /// exchange the people of two filled slots
    Swap { a: SlotKey, b: SlotKey },
    /// move a person from one slot into an empty one
    Move { src: SlotKey, dst: SlotKey },
}

/// check an edit without applying it
pub fn validate_edit(
    config: &Config,
    history: &[HistoryRecord],
    schedule: &Schedule,
    edit: &Edit,
) -> Result<(), EditError> {
    if schedule.status != Status::Draft {
        return Err(EditError::NotDraft);
    }
    let availability = AvailabilityIndex::new(config);
    let siblings = SiblingIndex::new(&config.sibling_group);
    let rules = HardRules {
        config,
        availability: &availability,
        siblings: &siblings,
        year: schedule.year,
        month: schedule.month,
    };

    match edit {
        Edit::Replace { slot, person_id } => {
            require_slot(schedule, slot)?;
            check_incoming(&rules, history, schedule, slot, person_id, &[slot])
        }
        Edit::Clear { slot } => {
            require_slot(schedule, slot)?;
            Ok(())
        }
        Edit::Swap { a, b } => {
            let person_a = require_person(schedule, a)?;
            let person_b = require_person(schedule, b)?;
            check_incoming(&rules, history, schedule, a, &person_b, &[a, b])?;
            check_incoming(&rules, history, schedule, b, &person_a, &[a, b])
        }
        Edit::Move { src, dst } => {
            let person = require_person(schedule, src)?;
            if require_slot(schedule, dst)?.is_some() {
                return Err(EditError::SlotOccupied { slot: dst.clone() });
            }
            check_incoming(&rules, history, schedule, dst, &person, &[src, dst])
        }
    }
}

/// validate, then return the edited schedule; the input is untouched
pub fn apply_edit(
    config: &Config,
    history: &[HistoryRecord],
    schedule: &Schedule,
    edit: &Edit,
) -> Result<Schedule, EditError> {
    validate_edit(config, history, schedule, edit)?;

    let mut edited = schedule.clone();
    match edit {
        Edit::Replace { slot, person_id } => {
            set_slot(&mut edited, slot, Some(person_id.clone()), true);
        }
        Edit::Clear { slot } => {
            set_slot(&mut edited, slot, None, false);
        }
        Edit::Swap { a, b } => {
            let person_a = edited.slot(a).and_then(|s| s.person_id.clone());
            let person_b = edited.slot(b).and_then(|s| s.person_id.clone());
            set_slot(&mut edited, a, person_b, true);
            set_slot(&mut edited, b, person_a, true);
        }
        Edit::Move { src, dst } => {
            let person = edited.slot(src).and_then(|s| s.person_id.clone());
            set_slot(&mut edited, dst, person, true);
            set_slot(&mut edited, src, None, false);
        }
    }
    debug!(?edit, "edit applied");
    Ok(edited)
}

fn require_slot<'a>(
    schedule: &'a Schedule,
    key: &SlotKey,
) -> Result<Option<&'a String>, EditError> {
    schedule
        .slot(key)
        .map(|assignment| assignment.person_id.as_ref())
        .ok_or_else(|| EditError::UnknownSlot { slot: key.clone() })
}

fn require_person(schedule: &Schedule, key: &SlotKey) -> Result<String, EditError> {
    require_slot(schedule, key)?
        .cloned()
        .ok_or_else(|| EditError::SlotEmpty { slot: key.clone() })
}

/// validate one person moving into one slot, with the slots under edit
/// treated as vacated
fn check_incoming(
    rules: &HardRules,
    history: &[HistoryRecord],
    schedule: &Schedule,
    slot: &SlotKey,
    person_id: &str,
    exclude: &[&SlotKey],
) -> Result<(), EditError> {
    let person = rules
        .config
        .person(person_id)
        .ok_or_else(|| EditError::UnknownPerson {
            person_id: person_id.to_string(),
        })?;
    let job = rules
        .config
        .job(&slot.job_id)
        .ok_or_else(|| EditError::UnknownSlot { slot: slot.clone() })?;

    let index = working_index(history, schedule, exclude);
    let same_day = schedule.assigned_on(slot.date, exclude);

    match rules.block_reason(&index, person, job, slot.date, &same_day) {
        Some(reason) => Err(EditError::Blocked {
            person_id: person_id.to_string(),
            slot: slot.clone(),
            reason,
        }),
        None => Ok(()),
    }
}

/// the log plus every filled slot of the draft, except the excluded ones
fn working_index(
    history: &[HistoryRecord],
    schedule: &Schedule,
    exclude: &[&SlotKey],
) -> HistoryIndex {
    let mut index = HistoryIndex::from_records(history);
    for service_date in &schedule.service_dates {
        for assignment in &service_date.assignments {
            let excluded = exclude.iter().any(|key| {
                key.date == service_date.date
                    && key.job_id == assignment.job_id
                    && key.position == assignment.position
            });
            if excluded {
                continue;
            }
            if let Some(person_id) = &assignment.person_id {
                index.record(
                    person_id,
                    &assignment.job_id,
                    service_date.date,
                    assignment.position,
                );
            }
        }
    }
    index
}

fn set_slot(schedule: &mut Schedule, key: &SlotKey, person_id: Option<String>, manual: bool) {
    if let Some(slot) = schedule.slot_mut(key) {
        slot.person_id = person_id;
        if manual {
            slot.manual_override = true;
        }
    }
}
