//! Local copies of the dashboard report.
//!
//! Supports a pretty JSON document and a CSV file with one row per migration.

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::types::{CutoverMetric, MigrationsReport};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Flat CSV form of a [`CutoverMetric`].
#[derive(Debug, Serialize)]
struct MetricRow<'a> {
    ods_code: &'a str,
    ccg_name: &'a str,
    practice_name: &'a str,
    source_system: &'a str,
    target_system: &'a str,
    cutover_startdate: String,
    cutover_enddate: String,
    cutover_duration: i64,
    patient_registration_count: Option<u64>,
}

impl<'a> From<&'a CutoverMetric> for MetricRow<'a> {
    fn from(metric: &'a CutoverMetric) -> Self {
        Self {
            ods_code: &metric.organisation.ods_code,
            ccg_name: &metric.organisation.ccg_name,
            practice_name: &metric.organisation.practice_name,
            source_system: &metric.systems.source_system,
            target_system: &metric.systems.target_system,
            cutover_startdate: metric.cutover.cutover_startdate.date_naive().to_string(),
            cutover_enddate: metric.cutover.cutover_enddate.date_naive().to_string(),
            cutover_duration: metric.cutover.cutover_duration,
            patient_registration_count: metric.patient_registration_count,
        }
    }
}

/// Writes the report as pretty-printed JSON, replacing any existing file.
pub fn write_report_json(path: &str, report: &MigrationsReport) -> Result<()> {
    debug!(path, "Writing report JSON");
    std::fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}

/// Appends a [`CutoverMetric`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, metric: &CutoverMetric) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(MetricRow::from(metric))?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{CutoverWindow, OrganisationDetails, SystemDetails};
    use chrono::DateTime;
    use rust_decimal::Decimal;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn metric() -> CutoverMetric {
        CutoverMetric::merge(
            CutoverWindow {
                cutover_startdate: DateTime::parse_from_rfc3339("2021-12-02T00:00:00+00:00").unwrap(),
                cutover_enddate: DateTime::parse_from_rfc3339("2021-12-06T00:00:00+00:00").unwrap(),
                cutover_duration: 4,
            },
            OrganisationDetails {
                ods_code: "A12345".into(),
                ccg_name: "My CCG".into(),
                practice_name: "My First Surgery".into(),
            },
            SystemDetails {
                source_system: "SystmOne".into(),
                target_system: "EMIS Web".into(),
            },
        )
    }

    #[test]
    fn test_append_record_creates_file() {
        let path = temp_path("metrics_calculator_test_create.csv");
        let _ = fs::remove_file(&path); // clean up any prior run

        append_record(&path, &metric()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "ods_code,ccg_name,practice_name,source_system,target_system,cutover_startdate,cutover_enddate,cutover_duration,patient_registration_count\n\
             A12345,My CCG,My First Surgery,SystmOne,EMIS Web,2021-12-02,2021-12-06,4,\n"
        );

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("metrics_calculator_test_header.csv");
        let _ = fs::remove_file(&path);

        append_record(&path, &metric()).unwrap();
        append_record(&path, &metric().with_patient_registration_count(1000)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().filter(|l| l.starts_with("ods_code")).count(), 1);
        assert!(lines[2].ends_with(",4,1000"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_report_json() {
        let path = temp_path("metrics_calculator_test_report.json");
        let report = MigrationsReport {
            mean_cutover_duration: Decimal::new(40, 1),
            supplier_combination_stats: vec![],
            migrations: vec![metric()],
        };

        write_report_json(&path, &report).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["mean_cutover_duration"], serde_json::json!(4.0));
        assert_eq!(value["migrations"][0]["ods_code"], "A12345");

        fs::remove_file(&path).unwrap();
    }
}
