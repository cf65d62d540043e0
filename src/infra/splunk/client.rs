use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::date_range::DateRange;
use crate::fetch::{HttpClient, post_form};
use crate::parser::parse_csv;
use crate::services::search_api::TelemetrySearch;
use crate::telemetry::TelemetryRecord;

const EXPORT_PATH: &str = "/services/search/jobs/export";
const TELEMETRY_INDEX: &str = "spine2vfmmonitor";

/// [`TelemetrySearch`] over the Splunk search export endpoint.
///
/// `C` is expected to carry the API token, usually an
/// [`ApiKey::bearer`](crate::fetch::auth::ApiKey::bearer) wrapper.
pub struct SplunkClient<C> {
    http: C,
    base_url: String,
}

impl<C: HttpClient> SplunkClient<C> {
    pub fn new(http: C, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Runs `search` over `window` and decodes the CSV export.
    async fn export(&self, window: &DateRange, search: &str) -> Result<Vec<TelemetryRecord>> {
        let url = format!("{}{}", self.base_url, EXPORT_PATH);
        let earliest_time = window.earliest_time();
        let latest_time = window.latest_time();

        let body = post_form(
            &self.http,
            &url,
            &[
                ("output_mode", "csv"),
                ("earliest_time", earliest_time.as_str()),
                ("latest_time", latest_time.as_str()),
                ("search", search),
            ],
        )
        .await
        .context("Splunk query failed")?;

        let mut records: Vec<TelemetryRecord> =
            parse_csv(&body).context("Failed to parse Splunk export")?;

        // timechart can emit a partial bucket past the requested range
        let received = records.len();
        records.retain(|r| window.contains(r.date()));
        debug!(bytes = body.len(), received, kept = records.len(), "Splunk export received");
        Ok(records)
    }
}

#[async_trait]
impl<C: HttpClient> TelemetrySearch for SplunkClient<C> {
    #[tracing::instrument(skip(self), fields(start = %window.start_date, end = %window.end_date))]
    async fn query_baseline(&self, asid: &str, window: &DateRange) -> Result<Vec<TelemetryRecord>> {
        let records = self.export(window, &baseline_search(asid)).await?;
        info!(days = records.len(), "Baseline telemetry fetched");
        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(start = %window.start_date, end = %window.end_date))]
    async fn query_telemetry(
        &self,
        asid: &str,
        window: &DateRange,
        threshold: f64,
    ) -> Result<Vec<TelemetryRecord>> {
        let records = self.export(window, &telemetry_search(asid, threshold)).await?;
        info!(days = records.len(), "Cutover telemetry fetched");
        Ok(records)
    }
}

/// Weekday message counts per day sent by `asid`.
fn baseline_search(asid: &str) -> String {
    format!(
        r#"search index="{TELEMETRY_INDEX}" messageSender={asid}
| bucket span=1d _time
| eval day_of_week = strftime(_time,"%A")
| where NOT (day_of_week="Saturday" OR day_of_week="Sunday")
| stats count by _time"#
    )
}

/// Daily weekday counts for `asid` with `threshold` attached as `avgmin2std`.
fn telemetry_search(asid: &str, threshold: f64) -> String {
    format!(
        r#"search index="{TELEMETRY_INDEX}" messageSender={asid}
| timechart span=1d count
| fillnull
| eval day_of_week = strftime(_time,"%A")
| where NOT (day_of_week="Saturday" OR day_of_week="Sunday")
| eval avgmin2std={threshold}
| fields - day_of_week"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_search_targets_asid() {
        let search = baseline_search("1234");
        assert!(search.starts_with("search index=\"spine2vfmmonitor\" messageSender=1234\n"));
        assert!(search.contains("stats count by _time"));
        assert!(!search.contains("avgmin2std"));
    }

    #[test]
    fn test_telemetry_search_embeds_threshold() {
        let search = telemetry_search("5678", 1044.7268404372467);
        assert!(search.contains("messageSender=5678"));
        assert!(search.contains("| eval avgmin2std=1044.7268404372467\n"));
        assert!(search.ends_with("| fields - day_of_week"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let client = SplunkClient::new(crate::fetch::BasicClient::new(), "https://splunk.example:8089/");
        assert_eq!(client.base_url, "https://splunk.example:8089");
    }
}
