use std::collections::HashMap;

use tracing::debug;

use super::types::{AsidRecord, IdentityPair, SystemIdentity, SystemProduct};
use crate::error::MetricsError;
use crate::occurrences::MigrationOccurrence;

/// Old/new matches found so far for one organisation.
#[derive(Debug, Default)]
struct SideMatches {
    old: Option<SystemIdentity>,
    new: Option<SystemIdentity>,
}

impl SideMatches {
    /// Classifies a row already known to belong to the organisation.
    ///
    /// A row naming the activated product is the new system; any other
    /// recognised product is the old one. Later rows overwrite earlier ones.
    fn observe(&mut self, record: &AsidRecord, activated: Option<SystemProduct>) {
        let Some(product) = SystemProduct::from_name(&record.product_name) else {
            return;
        };
        let identity = SystemIdentity::from_record(record);
        if Some(product) == activated {
            self.new = Some(identity);
        } else {
            self.old = Some(identity);
        }
    }

    /// Folds a later file's findings in. Sides the file did not see are kept.
    fn merge(&mut self, later: SideMatches) {
        if let Some(old) = later.old {
            self.old = Some(old);
        }
        if let Some(new) = later.new {
            self.new = Some(new);
        }
    }

    fn into_pair(self) -> IdentityPair {
        IdentityPair {
            old: self.old.unwrap_or_default(),
            new: self.new.unwrap_or_default(),
        }
    }
}

/// Resolves the old and new ASIDs for a single migration.
///
/// Tables are scanned in order and every match is taken into account, so the
/// last table mentioning a side wins.
///
/// # Errors
///
/// Returns [`MetricsError::AsidLookup`] unless both sides are found.
pub fn lookup_asids(
    tables: &[Vec<AsidRecord>],
    migration: &MigrationOccurrence,
) -> Result<IdentityPair, MetricsError> {
    let activated = SystemProduct::from_product_id(&migration.product_id);
    let mut result = SideMatches::default();

    for table in tables {
        let mut file_matches = SideMatches::default();
        for record in table.iter().filter(|r| r.ods_code == migration.ods_code) {
            file_matches.observe(record, activated);
        }
        result.merge(file_matches);
    }

    let ods_code = &migration.ods_code;
    match (result.old.is_some(), result.new.is_some()) {
        (false, false) => Err(MetricsError::AsidLookup(format!(
            "No ASIDs found for the ODS code \"{ods_code}\""
        ))),
        (false, true) => Err(MetricsError::AsidLookup(format!(
            "Only new ASID found for the ODS code \"{ods_code}\""
        ))),
        (true, false) => Err(MetricsError::AsidLookup(format!(
            "Only old ASID found for the ODS code \"{ods_code}\""
        ))),
        (true, true) => Ok(result.into_pair()),
    }
}

/// Resolves ASIDs for every migration with one pass over each table.
///
/// Organisations that never match get an empty [`IdentityPair`]. When an ODS
/// code appears in several migrations, the last one's product decides which
/// side is new.
///
/// # Errors
///
/// Returns [`MetricsError::LookupSourceEmpty`] when `tables` is empty.
pub fn lookup_all_asids(
    tables: &[Vec<AsidRecord>],
    migrations: &[MigrationOccurrence],
) -> Result<HashMap<String, IdentityPair>, MetricsError> {
    if tables.is_empty() {
        return Err(MetricsError::LookupSourceEmpty);
    }

    let activated: HashMap<&str, Option<SystemProduct>> = migrations
        .iter()
        .map(|m| (m.ods_code.as_str(), SystemProduct::from_product_id(&m.product_id)))
        .collect();

    let mut running: HashMap<&str, SideMatches> = HashMap::new();

    for (index, table) in tables.iter().enumerate() {
        let mut file_matches: HashMap<&str, SideMatches> = HashMap::new();
        for record in table {
            if let Some((ods_code, product)) = activated.get_key_value(record.ods_code.as_str()) {
                file_matches
                    .entry(*ods_code)
                    .or_default()
                    .observe(record, *product);
            }
        }
        debug!(table = index, organisations = file_matches.len(), "Scanned ASID lookup table");

        for (ods_code, matches) in file_matches {
            running.entry(ods_code).or_default().merge(matches);
        }
    }

    Ok(activated
        .keys()
        .map(|ods_code| {
            let pair = running
                .remove(ods_code)
                .map(SideMatches::into_pair)
                .unwrap_or_default();
            (ods_code.to_string(), pair)
        })
        .collect())
}
