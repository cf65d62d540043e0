//! Registered patient counts from the monthly GP registration publication.

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::parser::gzip_csv_rows;
use crate::services::storage::ObjectStore;

/// Column layout of the registration publication.
pub const PATIENT_REGISTRATION_HEADERS: [&str; 10] = [
    "PUBLICATION",
    "EXTRACT_DATE",
    "TYPE",
    "CCG_CODE",
    "ONS_CCG_CODE",
    "CODE",
    "POSTCODE",
    "SEX",
    "AGE",
    "NUMBER_OF_PATIENTS",
];

#[derive(Debug, Deserialize)]
struct RegistrationRow {
    #[serde(rename = "CODE")]
    code: String,
    #[serde(rename = "NUMBER_OF_PATIENTS")]
    number_of_patients: u64,
}

/// Key prefix of the publication for the month containing `date`, e.g. `july-2021`.
pub fn registration_month_prefix(date: NaiveDate) -> String {
    date.format("%B-%Y").to_string().to_lowercase()
}

/// Looks up the number of patients registered at `ods_code` in the month of `go_live`.
///
/// # Errors
///
/// Fails when no publication exists for the month, the practice is not
/// listed, or the object cannot be decoded.
#[tracing::instrument(skip(store))]
pub async fn fetch_patient_registration_count(
    store: &dyn ObjectStore,
    bucket: &str,
    ods_code: &str,
    go_live: NaiveDate,
) -> Result<u64> {
    let prefix = registration_month_prefix(go_live);
    let key = store
        .first_key_with_prefix(bucket, &prefix)
        .await?
        .ok_or_else(|| anyhow!("Data for {prefix} not found"))?;

    let body = store.get_object(bucket, &key).await?;
    for row in gzip_csv_rows::<RegistrationRow, _>(body.as_ref()) {
        let row = row?;
        if row.code == ods_code {
            return Ok(row.number_of_patients);
        }
    }

    Err(anyhow!("ODS code {ods_code} not found in {key}"))
}
