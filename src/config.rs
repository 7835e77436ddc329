//! contains the roster snapshot for a generation run: people, jobs, sibling
//! groups, unavailability ranges and scoring weights

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;

use crate::error::ConfigError;

/// job name checked against `Person::exclude_monaguillos`
pub const JOB_MONAGUILLOS: &str = "Monaguillos";
/// job name checked against `Person::exclude_lectores`
pub const JOB_LECTORES: &str = "Lectores";

/// configuration root
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default)]
    pub weights: Weights,
    pub job: Vec<Job>,
    pub person: Vec<Person>,
    #[serde(default)]
    pub sibling_group: Vec<SiblingGroup>,
    #[serde(default)]
    pub unavailability: Vec<Unavailability>,
}

/// a role filled by `people_required` persons on every service date
#[derive(Deserialize, Debug, Clone)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub people_required: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    /// one named sub-role per required person, numbered from 1
    pub positions: Vec<Position>,
    /// whoever serves this job in one month must skip it the next month
    #[serde(default)]
    pub consecutive_month_restricted: bool,
    /// jobs this one cannot share a person with on the same date,
    /// absent means all of them
    #[serde(default)]
    pub day_exclusive_with: Option<Vec<String>>,
}

/// numbered sub-role within a job, its semantic role is fixed per number
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub number: u32,
    pub name: String,
}

/// member of the roster
#[derive(Deserialize, Debug, Clone)]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub preferred_frequency: Frequency,
    #[serde(default = "default_max_consecutive_weeks")]
    pub max_consecutive_weeks: u32,
    /// how much the person wants to serve, 1 = reluctant, 10 = eager
    #[serde(default = "default_preference_level")]
    pub preference_level: u8,
    #[serde(default)]
    pub exclude_monaguillos: bool,
    #[serde(default)]
    pub exclude_lectores: bool,
    #[serde(default)]
    pub qualified_job_ids: Vec<String>,
}

impl Person {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_qualified(&self, job_id: &str) -> bool {
        self.qualified_job_ids.iter().any(|id| id == job_id)
    }
}

/// how often a person would like to serve
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Frequency {
    Weekly,
    Bimonthly,
    #[default]
    Monthly,
}

impl Frequency {
    /// preferred gap between two services, in weeks
    pub fn target_gap_weeks(&self) -> u32 {
        match self {
            Frequency::Weekly => 1,
            Frequency::Bimonthly => 2,
            Frequency::Monthly => 4,
        }
    }
}

/// named set of people that should be scheduled together or kept apart
#[derive(Deserialize, Debug, Clone)]
pub struct SiblingGroup {
    pub id: String,
    pub name: String,
    pub pairing_rule: PairingRule,
    pub members: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PairingRule {
    /// prefer scheduling members on the same date
    Together,
    /// members must never appear on the same date
    Separate,
}

/// a date range on which a person cannot serve
#[derive(Deserialize, Debug, Clone)]
pub struct Unavailability {
    pub person_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: String,
    /// match on month and day every year instead of once
    #[serde(default)]
    pub recurring: bool,
}

/// weights of the fairness score terms, fixed for one generation run
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Weights {
    pub fair: f64,
    pub recency: f64,
    pub preference: f64,
    pub frequency: f64,
    pub sibling: f64,
    pub rotation: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            fair: 0.70,
            recency: 0.20,
            preference: 0.10,
            frequency: 0.10,
            sibling: 0.15,
            rotation: 0.30,
        }
    }
}

fn default_active() -> bool {
    true
}

fn default_max_consecutive_weeks() -> u32 {
    1
}

fn default_preference_level() -> u8 {
    5
}

impl Config {
    pub fn person(&self, id: &str) -> Option<&Person> {
        self.person.iter().find(|p| p.id == id)
    }

    pub fn job(&self, id: &str) -> Option<&Job> {
        self.job.iter().find(|j| j.id == id)
    }

    pub fn position_name(&self, job_id: &str, position: u32) -> Option<&str> {
        self.job(job_id)?
            .positions
            .iter()
            .find(|p| p.number == position)
            .map(|p| p.name.as_str())
    }

    /// active jobs sorted by id
    pub fn active_jobs(&self) -> Vec<&Job> {
        let mut jobs: Vec<&Job> = self.job.iter().filter(|j| j.active).collect();
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        jobs
    }

    /// true when the two jobs must not share a person on one date
    pub fn day_exclusive(&self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }
        let one_way = |job_id: &str, other: &str| {
            match self.job(job_id).and_then(|j| j.day_exclusive_with.as_ref()) {
                None => true,
                Some(list) => list.iter().any(|id| id == other),
            }
        };
        one_way(a, b) || one_way(b, a)
    }

    /// check the snapshot invariants that generation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut job_ids: BTreeSet<&str> = BTreeSet::new();
        for job in &self.job {
            if !job_ids.insert(&job.id) {
                return Err(ConfigError::DuplicateJob {
                    job_id: job.id.clone(),
                });
            }
            if job.people_required == 0 {
                return Err(ConfigError::NoPositions {
                    job_id: job.id.clone(),
                });
            }
            if job.positions.len() != job.people_required as usize {
                return Err(ConfigError::PositionsMismatch {
                    job_id: job.id.clone(),
                });
            }
            for (index, position) in job.positions.iter().enumerate() {
                if position.number != index as u32 + 1 {
                    return Err(ConfigError::PositionsMismatch {
                        job_id: job.id.clone(),
                    });
                }
            }
        }
        for job in &self.job {
            if let Some(exclusive) = &job.day_exclusive_with {
                for other in exclusive {
                    if !job_ids.contains(other.as_str()) {
                        return Err(ConfigError::UnknownJob {
                            job_id: other.clone(),
                            referenced_by: format!("job {}", job.id),
                        });
                    }
                }
            }
        }

        let mut person_ids: BTreeSet<&str> = BTreeSet::new();
        for person in &self.person {
            if !person_ids.insert(&person.id) {
                return Err(ConfigError::DuplicatePerson {
                    person_id: person.id.clone(),
                });
            }
            if !(1..=10).contains(&person.preference_level) {
                return Err(ConfigError::PreferenceLevelOutOfRange {
                    person_id: person.id.clone(),
                });
            }
            if person.max_consecutive_weeks == 0 {
                return Err(ConfigError::ZeroConsecutiveWeeks {
                    person_id: person.id.clone(),
                });
            }
            for job_id in &person.qualified_job_ids {
                if !job_ids.contains(job_id.as_str()) {
                    return Err(ConfigError::UnknownJob {
                        job_id: job_id.clone(),
                        referenced_by: format!("person {}", person.id),
                    });
                }
            }
        }

        let mut group_ids: BTreeSet<&str> = BTreeSet::new();
        for group in &self.sibling_group {
            if !group_ids.insert(&group.id) {
                return Err(ConfigError::DuplicateGroup {
                    group_id: group.id.clone(),
                });
            }
            for member in &group.members {
                if !person_ids.contains(member.as_str()) {
                    return Err(ConfigError::UnknownPerson {
                        person_id: member.clone(),
                        referenced_by: format!("sibling group {}", group.id),
                    });
                }
            }
        }

        for unavailability in &self.unavailability {
            if !person_ids.contains(unavailability.person_id.as_str()) {
                return Err(ConfigError::UnknownPerson {
                    person_id: unavailability.person_id.clone(),
                    referenced_by: "unavailability".to_string(),
                });
            }
            if unavailability.end_date < unavailability.start_date {
                return Err(ConfigError::InvertedRange {
                    person_id: unavailability.person_id.clone(),
                });
            }
        }

        Ok(())
    }
}

/// load Config from a file
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_config() {
        let config = load_config("test/config.toml").expect("Failed to load config");

        assert_eq!(2, config.job.len());
        let monaguillos = config.job("monaguillos").unwrap();
        assert_eq!("Monaguillos", monaguillos.name);
        assert_eq!(4, monaguillos.people_required);
        assert!(monaguillos.consecutive_month_restricted);
        assert_eq!("Monaguillo 3", config.position_name("monaguillos", 3).unwrap());

        let lectores = config.job("lectores").unwrap();
        assert_eq!(2, lectores.people_required);
        assert_eq!(
            vec![
                Position {
                    number: 1,
                    name: "Primera lectura".to_string()
                },
                Position {
                    number: 2,
                    name: "Segunda lectura".to_string()
                },
            ],
            lectores.positions
        );

        let ana = config.person("ana").unwrap();
        assert!(ana.active);
        assert_eq!(Frequency::Bimonthly, ana.preferred_frequency);
        assert_eq!(2, ana.max_consecutive_weeks);
        assert_eq!(7, ana.preference_level);
        assert!(ana.is_qualified("monaguillos"));
        assert!(ana.is_qualified("lectores"));

        let pedro = config.person("pedro").unwrap();
        assert!(!pedro.active);
        assert!(pedro.exclude_lectores);
        // defaults
        assert_eq!(Frequency::Monthly, pedro.preferred_frequency);
        assert_eq!(1, pedro.max_consecutive_weeks);
        assert_eq!(5, pedro.preference_level);

        assert_eq!(1, config.sibling_group.len());
        assert_eq!(PairingRule::Separate, config.sibling_group[0].pairing_rule);

        assert_eq!(1, config.unavailability.len());
        let away = &config.unavailability[0];
        assert_eq!("ana", away.person_id);
        assert_eq!(NaiveDate::from_ymd_opt(2026, 2, 7).unwrap(), away.start_date);
        assert!(!away.recurring);

        // partially overridden weights keep their defaults elsewhere
        assert_eq!(0.5, config.weights.fair);
        assert_eq!(0.30, config.weights.rotation);
        assert_eq!(0.20, config.weights.recency);
    }

    #[test]
    fn load_config_rejects_unknown_qualified_job() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [[job]]
            id = "monaguillos"
            name = "Monaguillos"
            people_required = 1
            positions = [{{ number = 1, name = "Monaguillo 1" }}]

            [[person]]
            id = "ana"
            first_name = "Ana"
            last_name = "Garcia"
            qualified_job_ids = ["coro"]
            "#
        )
        .unwrap();

        let result = load_config(file.path().to_str().unwrap());

        assert!(matches!(
            result,
            Err(ConfigError::UnknownJob { job_id, .. }) if job_id == "coro"
        ));
    }

    #[test]
    fn validate_rejects_position_gaps() {
        let config = Config {
            weights: Weights::default(),
            job: vec![Job {
                id: "monaguillos".to_string(),
                name: "Monaguillos".to_string(),
                people_required: 2,
                active: true,
                positions: vec![
                    Position {
                        number: 1,
                        name: "Monaguillo 1".to_string(),
                    },
                    Position {
                        number: 3,
                        name: "Monaguillo 3".to_string(),
                    },
                ],
                consecutive_month_restricted: false,
                day_exclusive_with: None,
            }],
            person: vec![],
            sibling_group: vec![],
            unavailability: vec![],
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::PositionsMismatch { job_id }) if job_id == "monaguillos"
        ));
    }

    #[test]
    fn day_exclusive_defaults_to_every_pair() {
        let config = load_config("test/config.toml").unwrap();

        assert!(config.day_exclusive("monaguillos", "lectores"));
        assert!(config.day_exclusive("lectores", "monaguillos"));
        assert!(!config.day_exclusive("monaguillos", "monaguillos"));
    }
}
