//! Planned system switches, parsed from the activations table.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

pub const EMIS_SUPPLIER_ID: &str = "10000";
pub const VISION_SUPPLIER_ID: &str = "10034";
pub const TPP_SUPPLIER_ID: &str = "10052";

const SUPPORTED_SUPPLIERS: [&str; 3] = [EMIS_SUPPLIER_ID, VISION_SUPPLIER_ID, TPP_SUPPLIER_ID];

/// One organisation's planned switch to a new clinical system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOccurrence {
    pub ods_code: String,
    pub ccg_name: String,
    pub practice_name: String,
    pub supplier_id: String,
    /// Catalogue id of the product being activated, e.g. `10000-001`.
    pub product_id: String,
    pub go_live_date: NaiveDate,
}

/// A raw row of the activations CSV. Column names are the catalogue export's own.
#[derive(Debug, Deserialize)]
pub struct OccurrenceRow {
    #[serde(rename = "Service Recipient ID (e.g. ODS code where this is available)")]
    ods_code: String,
    #[serde(rename = "Call Off Ordering Party name")]
    ccg_name: String,
    #[serde(rename = "Service Recipient Name")]
    practice_name: String,
    #[serde(rename = "Supplier ID")]
    supplier_id: String,
    #[serde(rename = "Product ID ", alias = "Product ID")]
    product_id: String,
    #[serde(rename = "Actual M1 date")]
    go_live_date: String,
}

impl OccurrenceRow {
    fn is_supported_supplier(&self) -> bool {
        SUPPORTED_SUPPLIERS.contains(&self.supplier_id.as_str())
    }

    fn into_occurrence(self) -> Result<MigrationOccurrence> {
        let go_live_date = parse_go_live_date(&self.go_live_date)?;
        Ok(MigrationOccurrence {
            ods_code: self.ods_code,
            ccg_name: self.ccg_name,
            practice_name: self.practice_name,
            supplier_id: self.supplier_id,
            product_id: self.product_id,
            go_live_date,
        })
    }
}

/// Parses a go-live date. UK day-first layouts and ISO dates are accepted.
pub fn parse_go_live_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    // two-digit years first: %Y would happily read "21" as the year 21
    for format in ["%d/%m/%y", "%d/%m/%Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    bail!("Unrecognised go-live date '{raw}'")
}

/// Keeps rows for the three supported suppliers, in input order.
///
/// Rows with an unusable date are logged and dropped.
pub fn parse_occurrences<I>(rows: I) -> Vec<MigrationOccurrence>
where
    I: IntoIterator<Item = OccurrenceRow>,
{
    let mut migrations = Vec::new();
    for row in rows {
        if !row.is_supported_supplier() {
            debug!(supplier_id = %row.supplier_id, ods_code = %row.ods_code, "Skipping unsupported supplier");
            continue;
        }
        let ods_code = row.ods_code.clone();
        match row.into_occurrence() {
            Ok(migration) => migrations.push(migration),
            Err(e) => warn!(ods_code = %ods_code, error = %e, "Skipping migration occurrence"),
        }
    }
    migrations
}
