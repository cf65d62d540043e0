use anyhow::{Context, Result};

use super::KeyStore;

/// Resolves secrets from AWS SSM Parameter Store.
///
/// Parameters are fetched with decryption enabled, so the search API token
/// can be stored as a `SecureString`.
pub struct SsmKeyStore {
    client: aws_sdk_ssm::Client,
}

impl SsmKeyStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(config),
        }
    }
}

#[async_trait::async_trait]
impl KeyStore for SsmKeyStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, reference: &str) -> Result<String> {
        let resp = self
            .client
            .get_parameter()
            .name(reference)
            .with_decryption(true)
            .send()
            .await
            .with_context(|| format!("SSM GetParameter failed for '{reference}'"))?;

        resp.parameter
            .and_then(|p| p.value)
            .ok_or_else(|| anyhow::anyhow!("SSM parameter '{reference}' exists but has no value"))
    }
}
