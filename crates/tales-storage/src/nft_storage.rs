//! NFT.Storage client, used as the primary content-addressed store.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;

use crate::http::ensure_success;
use crate::traits::{ContentStore, StorageError, StorageResult};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    ok: bool,
    value: Option<UploadValue>,
    error: Option<UploadError>,
}

#[derive(Debug, Deserialize)]
struct UploadValue {
    cid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadError {
    message: Option<String>,
}

/// `POST {base_url}/upload` with bearer auth; the response carries the CID.
#[derive(Clone)]
pub struct NftStorageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NftStorageClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/upload", self.base_url)
    }
}

#[async_trait]
impl ContentStore for NftStorageClient {
    async fn store(&self, data: Bytes, content_type: &str) -> StorageResult<String> {
        let size = data.len();
        let response = self
            .client
            .post(self.upload_url())
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        let body: UploadResponse = ensure_success(response).await?.json().await?;

        if !body.ok {
            let message = body
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "upload rejected".to_string());
            return Err(StorageError::InvalidResponse(message));
        }

        let cid = body
            .value
            .and_then(|v| v.cid)
            .filter(|cid| !cid.is_empty())
            .ok_or_else(|| StorageError::InvalidResponse("response has no cid".to_string()))?;

        tracing::debug!(cid = %cid, size, "Stored blob on NFT.Storage");
        Ok(cid)
    }

    fn name(&self) -> &str {
        "nft.storage"
    }
}
