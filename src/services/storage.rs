//! Trait for reading and writing objects in bucket-style storage.

use anyhow::Result;
use bytes::Bytes;

/// Abstraction over an object store (e.g., S3).
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns every key in `bucket`, in the store's listing order.
    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>>;

    /// Downloads the whole object body.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes>;

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str)
    -> Result<()>;

    /// First key in listing order that starts with `prefix`.
    async fn first_key_with_prefix(&self, bucket: &str, prefix: &str) -> Result<Option<String>> {
        Ok(self
            .list_keys(bucket)
            .await?
            .into_iter()
            .find(|key| key.starts_with(prefix)))
    }
}
