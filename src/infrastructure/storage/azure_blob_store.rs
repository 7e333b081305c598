use std::time::Duration;

use async_trait::async_trait;
use object_store::azure::{MicrosoftAzure, MicrosoftAzureBuilder};
use object_store::path::Path as StorePath;
use object_store::signer::Signer;
use object_store::{ObjectStore, PutPayload};
use reqwest::Method;

use crate::application::ports::{BlobStore, BlobStoreError};

pub struct AzureBlobStore {
    inner: MicrosoftAzure,
    account: String,
    container: String,
}

impl AzureBlobStore {
    pub fn new(account: &str, access_key: &str, container: &str) -> Result<Self, BlobStoreError> {
        let inner = MicrosoftAzureBuilder::new()
            .with_account(account)
            .with_access_key(access_key)
            .with_container_name(container)
            .build()
            .map_err(|e| BlobStoreError::UploadFailed(e.to_string()))?;

        Ok(Self {
            inner,
            account: account.to_string(),
            container: container.to_string(),
        })
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn put_text(&self, name: &str, content: &str) -> Result<String, BlobStoreError> {
        let path = StorePath::from(name);
        self.inner
            .put(&path, PutPayload::from(content.as_bytes().to_vec()))
            .await
            .map_err(|e| BlobStoreError::UploadFailed(e.to_string()))?;

        Ok(format!(
            "https://{}.blob.core.windows.net/{}/{}",
            self.account, self.container, name
        ))
    }

    async fn signed_get_url(
        &self,
        name: &str,
        expires_in: Duration,
    ) -> Result<String, BlobStoreError> {
        let path = StorePath::from(name);
        let url = self
            .inner
            .signed_url(Method::GET, &path, expires_in)
            .await
            .map_err(|e| BlobStoreError::SigningFailed(e.to_string()))?;

        Ok(url.to_string())
    }
}
