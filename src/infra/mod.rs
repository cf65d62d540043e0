//! AWS and search platform implementations of the collaborator traits.

pub mod keys;
pub mod s3;
pub mod splunk;
