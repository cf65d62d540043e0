//! Cutover analysis and the two batch pipelines built on it.
//!
//! The threshold, cutover and aggregate modules are pure. [`analyzer`] and
//! [`export`] drive them over every known migration, fetching inputs through
//! the collaborator traits in [`crate::services`].

pub mod aggregate;
pub mod analyzer;
pub mod cutover;
pub mod export;
pub mod threshold;
pub mod types;
pub mod utility;
