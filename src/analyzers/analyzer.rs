//! Dashboard pipeline: stored telemetry in, `migrations.json` out.

use anyhow::{Context, Result};
use tracing::{Instrument, Span, error, field, info, info_span, warn};

use crate::analyzers::aggregate::build_report;
use crate::analyzers::cutover::detect_cutover_with_embedded_threshold;
use crate::analyzers::types::{CutoverMetric, MigrationsReport};
use crate::config::Config;
use crate::error::MetricsError;
use crate::identity::{AsidRecord, lookup_asids};
use crate::occurrences::MigrationOccurrence;
use crate::registrations::fetch_patient_registration_count;
use crate::services::{
    ObjectStore, fetch_asid_lookup_tables, fetch_migration_occurrences, fetch_telemetry_series,
    publish_report,
};

/// Computes the dashboard report and publishes it to the metrics bucket.
///
/// Nothing is published when no migration could be measured; `Ok(None)` is
/// returned instead.
pub async fn calculate_dashboard_metrics(
    store: &dyn ObjectStore,
    config: &Config,
) -> Result<Option<MigrationsReport>> {
    let report = compute_dashboard_report(store, config).await?;

    match &report {
        Some(report) => publish_report(store, &config.metrics_bucket, report).await?,
        None => warn!("No migration metrics computed, skipping publication"),
    }
    Ok(report)
}

/// Measures every known migration without publishing anything.
///
/// Migrations that fail are logged with their ODS code and ASIDs and left
/// out. Only an unreadable occurrences bucket or an empty lookup bucket stop
/// the run.
#[tracing::instrument(skip_all)]
pub async fn compute_dashboard_report(
    store: &dyn ObjectStore,
    config: &Config,
) -> Result<Option<MigrationsReport>> {
    let migrations = fetch_migration_occurrences(store, &config.occurrences_bucket)
        .await
        .context("Failed to read migration occurrences")?;
    let tables = fetch_asid_lookup_tables(store, &config.asid_lookup_bucket).await?;
    if tables.is_empty() {
        return Err(MetricsError::LookupSourceEmpty.into());
    }

    let mut metrics = Vec::new();
    for migration in &migrations {
        let span = info_span!(
            "migration",
            ods_code = %migration.ods_code,
            old_asid = field::Empty,
            new_asid = field::Empty,
        );

        match measure_migration(store, config, &tables, migration)
            .instrument(span.clone())
            .await
        {
            Ok(metric) => metrics.push(metric),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => span.in_scope(|| error!(error = %e, "Skipping migration")),
        }
    }

    info!(
        migrations = migrations.len(),
        measured = metrics.len(),
        skipped = migrations.len() - metrics.len(),
        "Dashboard metrics computed"
    );
    Ok(build_report(metrics))
}

async fn measure_migration(
    store: &dyn ObjectStore,
    config: &Config,
    tables: &[Vec<AsidRecord>],
    migration: &MigrationOccurrence,
) -> Result<CutoverMetric, MetricsError> {
    let pair = lookup_asids(tables, migration)?;
    Span::current()
        .record("old_asid", pair.old.asid.as_str())
        .record("new_asid", pair.new.asid.as_str());

    let pre = fetch_telemetry_series(store, &config.telemetry_bucket, &pair.old.asid).await?;
    let post = fetch_telemetry_series(store, &config.telemetry_bucket, &pair.new.asid).await?;
    let window = detect_cutover_with_embedded_threshold(pre, post)?;

    let mut metric = CutoverMetric::merge(window, migration.into(), (&pair).into());

    if let Some(bucket) = &config.patient_registrations_bucket {
        match fetch_patient_registration_count(
            store,
            bucket,
            &migration.ods_code,
            migration.go_live_date,
        )
        .await
        {
            Ok(count) => metric = metric.with_patient_registration_count(count),
            Err(e) => warn!(error = %e, "Patient registration count unavailable"),
        }
    }

    info!(cutover_duration = metric.duration(), "Migration measured");
    Ok(metric)
}
