use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes a text artifact and returns its durable URL.
    async fn put_text(&self, name: &str, content: &str) -> Result<String, BlobStoreError>;

    /// Returns a URL granting ephemeral read access to an existing blob.
    async fn signed_get_url(
        &self,
        name: &str,
        expires_in: Duration,
    ) -> Result<String, BlobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("signing failed: {0}")]
    SigningFailed(String),
    #[error("object not found: {0}")]
    NotFound(String),
}
