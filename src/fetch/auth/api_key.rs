use crate::fetch::client::HttpClient;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// The header is validated once at construction and marked sensitive so it
/// never shows up in debug output.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    header_value: HeaderValue,
}

impl<C> ApiKey<C> {
    /// Sends `key` verbatim in the `header_name` header.
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())?;
        let mut header_value = HeaderValue::from_str(key)?;
        header_value.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            header_value,
        })
    }

    /// Uses `Authorization: Bearer <key>`, as the search platform's token auth expects.
    pub fn bearer(inner: C, key: &str) -> Result<Self> {
        Self::new(inner, AUTHORIZATION.as_str(), &format!("Bearer {key}"))
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.header_value.clone());
        self.inner.execute(req).await
    }
}
