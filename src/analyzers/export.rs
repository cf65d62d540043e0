//! Export pipeline: pulls each migration's telemetry from the search platform
//! and stores it, threshold included, in the telemetry bucket.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{Instrument, Span, error, field, info, info_span};

use crate::analyzers::threshold::calculate_baseline_threshold;
use crate::config::Config;
use crate::date_range::{baseline_date_range, post_cutover_date_range, pre_cutover_date_range};
use crate::error::MetricsError;
use crate::identity::{IdentityPair, lookup_all_asids};
use crate::occurrences::MigrationOccurrence;
use crate::services::publish::upload_telemetry;
use crate::services::{
    ObjectStore, TelemetrySearch, fetch_asid_lookup_tables, fetch_migration_occurrences,
};

/// Outcome counts of one export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub exported: usize,
    pub skipped: usize,
}

/// Exports pre- and post-cutover telemetry for every known migration.
///
/// For each migration the old system's baseline threshold is computed, then
/// its pre-cutover window and the new system's post-cutover window are
/// uploaded as `{asid}-telemetry.csv.gz` with the threshold on every row.
/// Failures are logged per migration and do not stop the run.
#[tracing::instrument(skip_all)]
pub async fn export_splunk_data(
    store: &dyn ObjectStore,
    search: &dyn TelemetrySearch,
    config: &Config,
) -> Result<ExportSummary> {
    let migrations = fetch_migration_occurrences(store, &config.occurrences_bucket)
        .await
        .context("Failed to read migration occurrences")?;
    let tables = fetch_asid_lookup_tables(store, &config.asid_lookup_bucket).await?;
    let pairs = lookup_all_asids(&tables, &migrations)?;

    let mut summary = ExportSummary::default();
    for migration in &migrations {
        let span = info_span!(
            "migration",
            ods_code = %migration.ods_code,
            old_asid = field::Empty,
            new_asid = field::Empty,
        );

        match export_migration(store, search, config, &pairs, migration)
            .instrument(span.clone())
            .await
        {
            Ok(()) => summary.exported += 1,
            Err(e) => {
                summary.skipped += 1;
                let reason = format!("{e:#}");
                span.in_scope(|| error!(error = %reason, "Skipping migration export"));
            }
        }
    }

    info!(exported = summary.exported, skipped = summary.skipped, "Telemetry export finished");
    Ok(summary)
}

async fn export_migration(
    store: &dyn ObjectStore,
    search: &dyn TelemetrySearch,
    config: &Config,
    pairs: &HashMap<String, IdentityPair>,
    migration: &MigrationOccurrence,
) -> Result<()> {
    let pair = pairs
        .get(&migration.ods_code)
        .filter(|pair| pair.is_complete())
        .ok_or_else(|| {
            MetricsError::AsidLookup(format!(
                "No complete ASID pair for the ODS code \"{}\"",
                migration.ods_code
            ))
        })?;
    let (old_asid, new_asid) = (pair.old.asid.as_str(), pair.new.asid.as_str());
    Span::current()
        .record("old_asid", old_asid)
        .record("new_asid", new_asid);

    let go_live = migration.go_live_date;

    let baseline = search
        .query_baseline(old_asid, &baseline_date_range(go_live))
        .await
        .map_err(|e| MetricsError::telemetry(old_asid, format!("{e:#}")))?;
    let threshold = calculate_baseline_threshold(&baseline)?;

    let pre = search
        .query_telemetry(old_asid, &pre_cutover_date_range(go_live), threshold)
        .await
        .map_err(|e| MetricsError::telemetry(old_asid, format!("{e:#}")))?;
    let post = search
        .query_telemetry(new_asid, &post_cutover_date_range(go_live), threshold)
        .await
        .map_err(|e| MetricsError::telemetry(new_asid, format!("{e:#}")))?;

    upload_telemetry(store, &config.telemetry_bucket, old_asid, &pre).await?;
    upload_telemetry(store, &config.telemetry_bucket, new_asid, &post).await?;

    info!(threshold, pre_days = pre.len(), post_days = post.len(), "Migration exported");
    Ok(())
}
