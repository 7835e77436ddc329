//! csv import and export around the engine: schedules and fairness out,
//! assignment history in

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::CsvError;
use crate::schedule::{FairnessScore, HistoryRecord, Schedule};

fn writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(b',')
        .quote_style(csv::QuoteStyle::Necessary)
        .quote(b'"')
        .double_quote(false)
        .escape(b'\\')
        .from_writer(vec![])
}

fn into_string(wtr: csv::Writer<Vec<u8>>) -> Result<String, CsvError> {
    let bytes = wtr.into_inner().map_err(|_| CsvError::Flush)?;
    Ok(String::from_utf8(bytes)?)
}

/// convert a schedule to a csv String, one row per date, one column per
/// (job, position)
pub fn schedule_to_csv(schedule: &Schedule, config: &Config) -> Result<String, CsvError> {
    let columns: BTreeSet<(String, u32)> = schedule
        .service_dates
        .iter()
        .flat_map(|day| {
            day.assignments
                .iter()
                .map(|a| (a.job_id.clone(), a.position))
        })
        .collect();

    let mut wtr = writer();

    let mut header = vec!["date".to_string()];
    for (job_id, position) in &columns {
        let job_name = config
            .job(job_id)
            .map(|job| job.name.as_str())
            .unwrap_or(job_id);
        let position_name = config
            .position_name(job_id, *position)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{position}"));
        header.push(format!("{job_name}: {position_name}"));
    }
    wtr.write_record(&header)?;

    for day in &schedule.service_dates {
        let filled: BTreeMap<(String, u32), String> = day
            .assignments
            .iter()
            .filter_map(|a| {
                a.person_id.as_ref().map(|person_id| {
                    let name = config
                        .person(person_id)
                        .map(|p| p.display_name())
                        .unwrap_or_else(|| person_id.clone());
                    ((a.job_id.clone(), a.position), name)
                })
            })
            .collect();

        let mut row = vec![day.date.to_string()];
        for column in &columns {
            row.push(filled.get(column).cloned().unwrap_or_default());
        }
        wtr.write_record(&row)?;
    }

    into_string(wtr)
}

/// read the append-only assignment log from a csv file with the columns
/// person_id, job_id, service_date, position
pub fn history_from_csv(path: impl AsRef<Path>) -> Result<Vec<HistoryRecord>, CsvError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| CsvError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// convert the per-person workload summary to a csv String
pub fn fairness_to_csv(scores: &[FairnessScore]) -> Result<String, CsvError> {
    let mut wtr = writer();
    wtr.write_record(["person_id", "total_this_year", "last_service_date", "by_job"])?;

    for score in scores {
        let total = score.total_this_year.to_string();
        let last_service = score
            .last_service_date
            .map(|date| date.to_string())
            .unwrap_or_default();
        let by_job = score
            .by_job
            .iter()
            .map(|(job_id, count)| format!("{job_id}:{count}"))
            .collect::<Vec<_>>()
            .join(" ");
        wtr.write_record([
            score.person_id.as_str(),
            total.as_str(),
            last_service.as_str(),
            by_job.as_str(),
        ])?;
    }

    into_string(wtr)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::NaiveDate;

    use super::*;
    use crate::config::load_config;
    use crate::schedule::{Assignment, ServiceDate, Status};

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_schedule_to_csv() {
        let config = load_config("test/config.toml").unwrap();
        let schedule = Schedule {
            year: 2026,
            month: 2,
            name: "2026-02".to_string(),
            status: Status::Draft,
            service_dates: vec![
                ServiceDate {
                    date: d(2026, 2, 1),
                    assignments: vec![
                        Assignment {
                            job_id: "lectores".to_string(),
                            position: 1,
                            person_id: Some("ana".to_string()),
                            manual_override: false,
                        },
                        Assignment {
                            job_id: "lectores".to_string(),
                            position: 2,
                            person_id: None,
                            manual_override: false,
                        },
                    ],
                },
                ServiceDate {
                    date: d(2026, 2, 8),
                    assignments: vec![
                        Assignment {
                            job_id: "lectores".to_string(),
                            position: 1,
                            person_id: Some("eva".to_string()),
                            manual_override: false,
                        },
                        Assignment {
                            job_id: "lectores".to_string(),
                            position: 2,
                            person_id: Some("ana".to_string()),
                            manual_override: false,
                        },
                    ],
                },
            ],
        };

        let csv = schedule_to_csv(&schedule, &config).unwrap();

        let expected = "\
date,Lectores: Primera lectura,Lectores: Segunda lectura
2026-02-01,Ana García,
2026-02-08,Eva Díaz,Ana García
";

        assert_eq!(expected, csv);
    }

    #[test]
    fn test_history_round_trip_from_file() {
        let records = history_from_csv("test/history.csv").unwrap();

        assert_eq!(3, records.len());
        assert_eq!("ana", records[0].person_id);
        assert_eq!("monaguillos", records[0].job_id);
        assert_eq!(d(2026, 1, 4), records[0].service_date);
        assert_eq!(1, records[0].position);
    }

    #[test]
    fn history_from_csv_reads_written_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "person_id,job_id,service_date,position").unwrap();
        writeln!(file, "luis,lectores,2026-01-11,2").unwrap();

        let records = history_from_csv(file.path()).unwrap();

        assert_eq!(
            vec![HistoryRecord {
                person_id: "luis".to_string(),
                job_id: "lectores".to_string(),
                service_date: d(2026, 1, 11),
                position: 2,
            }],
            records
        );
    }

    #[test]
    fn history_from_csv_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "person_id,job_id,service_date,position").unwrap();
        writeln!(file, "luis,lectores,not-a-date,2").unwrap();

        assert!(matches!(
            history_from_csv(file.path()),
            Err(CsvError::Csv(_))
        ));
    }

    #[test]
    fn test_fairness_to_csv() {
        let scores = vec![
            FairnessScore {
                person_id: "ana".to_string(),
                total_this_year: 2,
                by_job: BTreeMap::from([
                    ("lectores".to_string(), 1),
                    ("monaguillos".to_string(), 1),
                ]),
                last_service_date: Some(d(2026, 1, 18)),
            },
            FairnessScore {
                person_id: "eva".to_string(),
                total_this_year: 0,
                by_job: BTreeMap::new(),
                last_service_date: None,
            },
        ];

        let csv = fairness_to_csv(&scores).unwrap();

        let expected = "\
person_id,total_this_year,last_service_date,by_job
ana,2,2026-01-18,lectores:1 monaguillos:1
eva,0,,
";

        assert_eq!(expected, csv);
    }
}
