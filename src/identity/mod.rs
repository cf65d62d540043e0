//! Resolution of an organisation's old and new system instances (ASIDs).
//!
//! [`lookup_asids`] resolves a single migration and insists on both sides.
//! [`lookup_all_asids`] resolves a whole batch in one pass per lookup file and
//! leaves unresolved organisations empty.

mod lookup;
mod types;

pub use lookup::{lookup_all_asids, lookup_asids};
pub use types::{AsidRecord, IdentityPair, SystemIdentity, SystemProduct};

pub const EMIS_PRODUCT_ID: &str = "10000-001";
pub const TPP_PRODUCT_ID: &str = "10052-002";
pub const VISION_PRODUCT_ID: &str = "10034-005";

/// Column layout of the ASID lookup exports.
pub const ASID_LOOKUP_HEADERS: [&str; 7] = [
    "ASID", "NACS", "OrgName", "MName", "PName", "OrgType", "PostCode",
];
