//! Typed readers over the buckets the pipelines consume.

use std::io::Cursor;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::error::MetricsError;
use crate::identity::AsidRecord;
use crate::occurrences::{MigrationOccurrence, OccurrenceRow, parse_occurrences};
use crate::parser::{gzip_csv_rows, parse_gzip_csv};
use crate::services::storage::ObjectStore;
use crate::telemetry::{TelemetryRecord, TelemetrySeries, telemetry_object_key};

/// Reads every activations table in `bucket` and returns the supported migrations.
///
/// Any unreadable object fails the whole read.
#[tracing::instrument(skip(store))]
pub async fn fetch_migration_occurrences(
    store: &dyn ObjectStore,
    bucket: &str,
) -> Result<Vec<MigrationOccurrence>> {
    let mut migrations = Vec::new();

    for key in store.list_keys(bucket).await? {
        let body = store
            .get_object(bucket, &key)
            .await
            .with_context(|| format!("Failed to read occurrences object '{key}'"))?;
        let rows: Vec<OccurrenceRow> = parse_gzip_csv(&body)
            .with_context(|| format!("Failed to parse occurrences object '{key}'"))?;

        let parsed = parse_occurrences(rows);
        debug!(key = %key, migrations = parsed.len(), "Occurrences object read");
        migrations.extend(parsed);
    }

    info!(count = migrations.len(), "Migration occurrences loaded");
    Ok(migrations)
}

/// Reads every ASID lookup table in `bucket`, in listing order.
#[tracing::instrument(skip(store))]
pub async fn fetch_asid_lookup_tables(
    store: &dyn ObjectStore,
    bucket: &str,
) -> Result<Vec<Vec<AsidRecord>>> {
    let mut tables = Vec::new();

    for key in store.list_keys(bucket).await? {
        let body = store
            .get_object(bucket, &key)
            .await
            .with_context(|| format!("Failed to read ASID lookup object '{key}'"))?;
        let table: Vec<AsidRecord> = parse_gzip_csv(&body)
            .with_context(|| format!("Failed to parse ASID lookup object '{key}'"))?;

        debug!(key = %key, rows = table.len(), "ASID lookup table read");
        tables.push(table);
    }

    Ok(tables)
}

/// Opens the stored telemetry for `asid`. Rows are decoded lazily as the
/// series is consumed.
///
/// # Errors
///
/// Returns [`MetricsError::TelemetryUnavailable`] if the object cannot be read.
pub async fn fetch_telemetry_series(
    store: &dyn ObjectStore,
    bucket: &str,
    asid: &str,
) -> Result<TelemetrySeries, MetricsError> {
    let key = telemetry_object_key(asid);
    let body = store
        .get_object(bucket, &key)
        .await
        .map_err(|e| MetricsError::telemetry(asid, format!("{key}: {e:#}")))?;

    debug!(asid, key = %key, bytes = body.len(), "Telemetry object read");
    let rows = gzip_csv_rows::<TelemetryRecord, _>(Cursor::new(body));
    Ok(TelemetrySeries::from_stream(asid, rows))
}
