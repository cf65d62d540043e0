use serde::{Deserialize, Serialize};

use super::{EMIS_PRODUCT_ID, TPP_PRODUCT_ID, VISION_PRODUCT_ID};

/// The three clinical systems the calculator recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemProduct {
    EmisWeb,
    SystmOne,
    Vision3,
}

impl SystemProduct {
    /// Maps a catalogue product id to its system.
    pub fn from_product_id(product_id: &str) -> Option<Self> {
        match product_id.trim() {
            EMIS_PRODUCT_ID => Some(Self::EmisWeb),
            TPP_PRODUCT_ID => Some(Self::SystmOne),
            VISION_PRODUCT_ID => Some(Self::Vision3),
            _ => None,
        }
    }

    /// Maps a lookup-table product name to its system.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "EMIS Web" => Some(Self::EmisWeb),
            "SystmOne" => Some(Self::SystmOne),
            "Vision 3" => Some(Self::Vision3),
            _ => None,
        }
    }

    /// Display name as it appears in the lookup tables.
    pub fn name(&self) -> &'static str {
        match self {
            Self::EmisWeb => "EMIS Web",
            Self::SystmOne => "SystmOne",
            Self::Vision3 => "Vision 3",
        }
    }
}

/// One row of an ASID lookup table. Unused columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AsidRecord {
    #[serde(rename = "ASID")]
    pub asid: String,
    #[serde(rename = "NACS")]
    pub ods_code: String,
    #[serde(rename = "PName")]
    pub product_name: String,
}

impl AsidRecord {
    pub fn new(asid: &str, ods_code: &str, product_name: &str) -> Self {
        Self {
            asid: asid.to_string(),
            ods_code: ods_code.to_string(),
            product_name: product_name.to_string(),
        }
    }
}

/// An installed system instance: its ASID and product name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemIdentity {
    pub asid: String,
    pub name: String,
}

impl SystemIdentity {
    pub(crate) fn from_record(record: &AsidRecord) -> Self {
        Self {
            asid: record.asid.clone(),
            name: record.product_name.clone(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.asid.is_empty()
    }
}

/// Old and new system identities for one organisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentityPair {
    pub old: SystemIdentity,
    pub new: SystemIdentity,
}

impl IdentityPair {
    /// Both sides carry an ASID, so telemetry can be fetched for each.
    pub fn is_complete(&self) -> bool {
        self.old.is_resolved() && self.new.is_resolved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_ids_map_to_names() {
        assert_eq!(
            SystemProduct::from_product_id(EMIS_PRODUCT_ID).map(|p| p.name()),
            Some("EMIS Web")
        );
        assert_eq!(
            SystemProduct::from_product_id(TPP_PRODUCT_ID).map(|p| p.name()),
            Some("SystmOne")
        );
        assert_eq!(
            SystemProduct::from_product_id(VISION_PRODUCT_ID).map(|p| p.name()),
            Some("Vision 3")
        );
        assert_eq!(SystemProduct::from_product_id("12345-678"), None);
    }

    #[test]
    fn test_names_round_trip() {
        for product in [SystemProduct::EmisWeb, SystemProduct::SystmOne, SystemProduct::Vision3] {
            assert_eq!(SystemProduct::from_name(product.name()), Some(product));
        }
        assert_eq!(SystemProduct::from_name("Some Other System"), None);
    }

    #[test]
    fn test_default_pair_is_incomplete() {
        let mut pair = IdentityPair::default();
        assert!(!pair.is_complete());

        pair.old.asid = "1".into();
        assert!(!pair.is_complete());

        pair.new.asid = "2".into();
        assert!(pair.is_complete());
    }
}
