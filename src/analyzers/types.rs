//! Data types produced by the cutover analysis.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::identity::IdentityPair;
use crate::occurrences::MigrationOccurrence;

/// Detected cutover window for one migration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutoverWindow {
    #[serde(serialize_with = "isoformat")]
    pub cutover_startdate: DateTime<FixedOffset>,
    #[serde(serialize_with = "isoformat")]
    pub cutover_enddate: DateTime<FixedOffset>,
    /// Whole calendar days from start to end. Negative for inconsistent data.
    pub cutover_duration: i64,
}

/// Organisation fields carried from the migration occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganisationDetails {
    pub ods_code: String,
    pub ccg_name: String,
    pub practice_name: String,
}

impl From<&MigrationOccurrence> for OrganisationDetails {
    fn from(migration: &MigrationOccurrence) -> Self {
        Self {
            ods_code: migration.ods_code.clone(),
            ccg_name: migration.ccg_name.clone(),
            practice_name: migration.practice_name.clone(),
        }
    }
}

/// Source and target system names for the migration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemDetails {
    pub source_system: String,
    pub target_system: String,
}

impl From<&IdentityPair> for SystemDetails {
    fn from(pair: &IdentityPair) -> Self {
        Self {
            source_system: pair.old.name.clone(),
            target_system: pair.new.name.clone(),
        }
    }
}

/// Per-migration result: the cutover window merged with organisation and
/// system fields into one flat record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutoverMetric {
    #[serde(flatten)]
    pub cutover: CutoverWindow,
    #[serde(flatten)]
    pub organisation: OrganisationDetails,
    #[serde(flatten)]
    pub systems: SystemDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_registration_count: Option<u64>,
}

impl CutoverMetric {
    /// Combines the three parts. Their field names are disjoint, so nothing is overwritten.
    pub fn merge(
        cutover: CutoverWindow,
        organisation: OrganisationDetails,
        systems: SystemDetails,
    ) -> Self {
        Self {
            cutover,
            organisation,
            systems,
            patient_registration_count: None,
        }
    }

    pub fn with_patient_registration_count(mut self, count: u64) -> Self {
        self.patient_registration_count = Some(count);
        self
    }

    pub fn duration(&self) -> i64 {
        self.cutover.cutover_duration
    }
}

/// Count and mean duration for one (source, target) system pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierCombinationStat {
    pub source_system: String,
    pub target_system: String,
    pub count: usize,
    pub mean_duration: f64,
}

/// The published `migrations.json` document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationsReport {
    /// Rounded half-up to one decimal place; serialized as a JSON number.
    pub mean_cutover_duration: Decimal,
    pub supplier_combination_stats: Vec<SupplierCombinationStat>,
    pub migrations: Vec<CutoverMetric>,
}

fn isoformat<S: Serializer>(value: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn window() -> CutoverWindow {
        CutoverWindow {
            cutover_startdate: DateTime::parse_from_rfc3339("2021-12-02T00:00:00+00:00").unwrap(),
            cutover_enddate: DateTime::parse_from_rfc3339("2021-12-06T00:00:00+00:00").unwrap(),
            cutover_duration: 4,
        }
    }

    fn metric() -> CutoverMetric {
        CutoverMetric::merge(
            window(),
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
    fn test_metric_serializes_flat() {
        let value = serde_json::to_value(metric()).unwrap();

        assert_eq!(
            value,
            json!({
                "cutover_startdate": "2021-12-02T00:00:00+00:00",
                "cutover_enddate": "2021-12-06T00:00:00+00:00",
                "cutover_duration": 4,
                "ods_code": "A12345",
                "ccg_name": "My CCG",
                "practice_name": "My First Surgery",
                "source_system": "SystmOne",
                "target_system": "EMIS Web"
            })
        );
    }

    #[test]
    fn test_registration_count_is_included_when_known() {
        let value = serde_json::to_value(metric().with_patient_registration_count(1000)).unwrap();
        assert_eq!(value["patient_registration_count"], json!(1000));
    }

    #[test]
    fn test_report_mean_is_a_number() {
        let report = MigrationsReport {
            mean_cutover_duration: Decimal::new(40, 1),
            supplier_combination_stats: vec![],
            migrations: vec![],
        };

        let text = serde_json::to_string(&report).unwrap();
        assert!(text.starts_with("{\"mean_cutover_duration\":4.0,"));
    }
}
