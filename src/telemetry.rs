//! Daily message-count telemetry for one ASID.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

/// Timestamp layout used by the search platform, e.g. `2021-12-02T00:00:00.000+0000`.
pub const TELEMETRY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// One day's message count, as exported by the search platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    #[serde(rename = "_time", with = "telemetry_time")]
    pub timestamp: DateTime<FixedOffset>,
    pub count: u64,
    /// Baseline threshold embedded by the export pipeline.
    #[serde(rename = "avgmin2std", default, deserialize_with = "empty_as_none")]
    pub threshold: Option<f64>,
}

impl TelemetryRecord {
    pub fn new(timestamp: DateTime<FixedOffset>, count: u64) -> Self {
        Self {
            timestamp,
            count,
            threshold: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

mod telemetry_time {
    use super::TELEMETRY_TIME_FORMAT;
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TELEMETRY_TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_str(&raw, TELEMETRY_TIME_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(&raw))
            .map_err(serde::de::Error::custom)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// A single-pass, chronologically ascending sequence of [`TelemetryRecord`]s.
///
/// Records may be decoded lazily, so the series is consumed by value. Reverse
/// access goes through [`TelemetrySeries::materialize`].
pub struct TelemetrySeries {
    asid: String,
    records: Box<dyn Iterator<Item = Result<TelemetryRecord, MetricsError>> + Send>,
}

impl TelemetrySeries {
    /// Wraps a lazily decoded stream of records.
    pub fn from_stream<I, E>(asid: &str, records: I) -> Self
    where
        I: IntoIterator<Item = Result<TelemetryRecord, E>>,
        I::IntoIter: Send + 'static,
        E: std::fmt::Display + 'static,
    {
        let owned = asid.to_string();
        Self {
            asid: asid.to_string(),
            records: Box::new(
                records
                    .into_iter()
                    .map(move |r| r.map_err(|e| MetricsError::telemetry(&owned, e))),
            ),
        }
    }

    /// Wraps records that are already in memory.
    pub fn from_records(asid: &str, records: Vec<TelemetryRecord>) -> Self {
        Self {
            asid: asid.to_string(),
            records: Box::new(records.into_iter().map(Ok)),
        }
    }

    pub fn asid(&self) -> &str {
        &self.asid
    }

    /// Drains the series into memory, failing on the first undecodable record.
    pub fn materialize(self) -> Result<Vec<TelemetryRecord>, MetricsError> {
        self.records.collect()
    }
}

impl Iterator for TelemetrySeries {
    type Item = Result<TelemetryRecord, MetricsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }
}

/// Object key under which a series for `asid` is stored in the telemetry bucket.
pub fn telemetry_object_key(asid: &str) -> String {
    format!("{asid}-telemetry.csv.gz")
}
