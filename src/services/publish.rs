use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::analyzers::types::MigrationsReport;
use crate::parser::to_gzip_csv;
use crate::services::storage::ObjectStore;
use crate::telemetry::{TelemetryRecord, telemetry_object_key};

/// Key of the dashboard document in the metrics bucket.
pub const MIGRATIONS_REPORT_KEY: &str = "migrations.json";

/// Serializes a value to JSON and uploads it with `application/json` content type.
pub async fn write_json(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    value: &impl Serialize,
) -> Result<()> {
    let body = serde_json::to_vec(value)?;
    store
        .put_object(bucket, key, body, "application/json")
        .await
        .with_context(|| format!("Failed to upload '{key}' to '{bucket}'"))
}

/// Uploads the dashboard report as `migrations.json`.
#[tracing::instrument(skip(store, report), fields(migrations = report.migrations.len()))]
pub async fn publish_report(
    store: &dyn ObjectStore,
    bucket: &str,
    report: &MigrationsReport,
) -> Result<()> {
    write_json(store, bucket, MIGRATIONS_REPORT_KEY, report).await?;
    info!(bucket, key = MIGRATIONS_REPORT_KEY, "Report published");
    Ok(())
}

/// Uploads one ASID's telemetry as a gzip CSV, replacing any earlier export.
pub async fn upload_telemetry(
    store: &dyn ObjectStore,
    bucket: &str,
    asid: &str,
    records: &[TelemetryRecord],
) -> Result<()> {
    let key = telemetry_object_key(asid);
    let body = to_gzip_csv(records)?;
    store
        .put_object(bucket, &key, body, "application/gzip")
        .await
        .with_context(|| format!("Failed to upload '{key}' to '{bucket}'"))?;
    info!(bucket, key = %key, rows = records.len(), "Telemetry uploaded");
    Ok(())
}
