//! Collaborator traits the pipelines depend on, and the readers and
//! publishers built on top of them.

pub mod publish;
pub mod readers;
pub mod search_api;
pub mod storage;

pub use publish::{MIGRATIONS_REPORT_KEY, publish_report};
pub use readers::{fetch_asid_lookup_tables, fetch_migration_occurrences, fetch_telemetry_series};
pub use search_api::TelemetrySearch;
pub use storage::ObjectStore;
