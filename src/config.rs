use anyhow::{Result, bail};

/// Runtime configuration for both pipelines.
///
/// Built once at start-up and passed down explicitly; nothing below `main`
/// reads the environment.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub occurrences_bucket: String,
    pub asid_lookup_bucket: String,
    pub telemetry_bucket: String,
    pub metrics_bucket: String,
    pub patient_registrations_bucket: Option<String>,
    pub splunk: Option<SplunkConfig>,
}

/// Connection details for the search platform used by the export pipeline.
#[derive(Debug, Clone)]
pub struct SplunkConfig {
    pub base_url: String,
    /// SSM parameter holding the API token.
    pub token_parameter: String,
}

pub const OCCURRENCES_BUCKET_NAME: &str = "OCCURRENCES_BUCKET_NAME";
pub const ASID_LOOKUP_BUCKET_NAME: &str = "ASID_LOOKUP_BUCKET_NAME";
pub const TELEMETRY_BUCKET_NAME: &str = "TELEMETRY_BUCKET_NAME";
pub const METRICS_BUCKET_NAME: &str = "METRICS_BUCKET_NAME";
pub const PATIENT_REGISTRATIONS_BUCKET_NAME: &str = "PATIENT_REGISTRATIONS_BUCKET_NAME";
pub const SPLUNK_BASE_URL: &str = "SPLUNK_BASE_URL";
pub const SPLUNK_API_TOKEN_PARAM_NAME: &str = "SPLUNK_API_TOKEN_PARAM_NAME";

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Every missing required variable is reported in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let mut required = |name: &'static str| {
            get(name).unwrap_or_else(|| {
                missing.push(name);
                String::new()
            })
        };

        let occurrences_bucket = required(OCCURRENCES_BUCKET_NAME);
        let asid_lookup_bucket = required(ASID_LOOKUP_BUCKET_NAME);
        let telemetry_bucket = required(TELEMETRY_BUCKET_NAME);
        let metrics_bucket = required(METRICS_BUCKET_NAME);

        if !missing.is_empty() {
            bail!("Missing environment variables: {}", missing.join(", "));
        }

        let splunk = match (get(SPLUNK_BASE_URL), get(SPLUNK_API_TOKEN_PARAM_NAME)) {
            (Some(base_url), Some(token_parameter)) => Some(SplunkConfig {
                base_url,
                token_parameter,
            }),
            (None, None) => None,
            (Some(_), None) => bail!("{SPLUNK_BASE_URL} is set but {SPLUNK_API_TOKEN_PARAM_NAME} is not"),
            (None, Some(_)) => bail!("{SPLUNK_API_TOKEN_PARAM_NAME} is set but {SPLUNK_BASE_URL} is not"),
        };

        Ok(Self {
            occurrences_bucket,
            asid_lookup_bucket,
            telemetry_bucket,
            metrics_bucket,
            patient_registrations_bucket: get(PATIENT_REGISTRATIONS_BUCKET_NAME),
            splunk,
        })
    }

    /// Returns the search platform settings, failing if they were not configured.
    pub fn require_splunk(&self) -> Result<&SplunkConfig> {
        match &self.splunk {
            Some(splunk) => Ok(splunk),
            None => bail!("{SPLUNK_BASE_URL} and {SPLUNK_API_TOKEN_PARAM_NAME} must be set"),
        }
    }
}
