pub mod analyzers;
pub mod config;
pub mod date_range;
pub mod error;
pub mod fetch;
pub mod identity;
pub mod infra;
pub mod occurrences;
pub mod output;
pub mod parser;
pub mod registrations;
pub mod services;
pub mod telemetry;
