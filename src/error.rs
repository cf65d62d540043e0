//! Error taxonomy for the cutover analytics engine.
//!
//! Everything except [`MetricsError::LookupSourceEmpty`] is scoped to a single
//! migration: the batch loop logs it and moves on to the next one.

/// Errors raised while computing metrics for migrations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Baseline threshold is not usable: {0}")]
    ThresholdInvalid(String),

    #[error("No pre-cutover day exceeds the threshold {threshold} followed by a quiet day")]
    CutoverStartOutOfRange { threshold: f64 },

    #[error("No post-cutover day exceeds the threshold {threshold}")]
    CutoverEndOutOfRange { threshold: f64 },

    #[error("{0}")]
    AsidLookup(String),

    #[error("Telemetry unavailable for ASID {asid}: {reason}")]
    TelemetryUnavailable { asid: String, reason: String },

    #[error("No ASID lookup tables available")]
    LookupSourceEmpty,
}

impl MetricsError {
    /// Returns `true` when the whole batch must stop rather than skip one migration.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MetricsError::LookupSourceEmpty)
    }

    pub(crate) fn telemetry(asid: &str, reason: impl ToString) -> Self {
        MetricsError::TelemetryUnavailable {
            asid: asid.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_lookup_source_empty_is_fatal() {
        assert!(MetricsError::LookupSourceEmpty.is_fatal());
        assert!(!MetricsError::AsidLookup("x".to_string()).is_fatal());
        assert!(!MetricsError::CutoverEndOutOfRange { threshold: 1.0 }.is_fatal());
    }

    #[test]
    fn test_telemetry_error_message_names_asid() {
        let err = MetricsError::telemetry("1234", "object not found");
        assert_eq!(
            err.to_string(),
            "Telemetry unavailable for ASID 1234: object not found"
        );
    }
}
