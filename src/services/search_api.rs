//! Trait for querying daily message counts from the log search platform.

use anyhow::Result;

use crate::date_range::DateRange;
use crate::telemetry::TelemetryRecord;

/// Abstraction over the search platform (e.g., Splunk).
///
/// Both queries return one record per weekday in `window`, oldest first.
#[async_trait::async_trait]
pub trait TelemetrySearch: Send + Sync {
    /// Raw daily counts for `asid`, used to derive its baseline threshold.
    async fn query_baseline(&self, asid: &str, window: &DateRange) -> Result<Vec<TelemetryRecord>>;

    /// Daily counts for `asid` with `threshold` attached to every record.
    async fn query_telemetry(
        &self,
        asid: &str,
        window: &DateRange,
        threshold: f64,
    ) -> Result<Vec<TelemetryRecord>>;
}
