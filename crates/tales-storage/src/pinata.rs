//! Pinata client, used as the redundancy pin.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tales_core::PinataCredentials;

use crate::http::ensure_success;
use crate::traits::{PinOptions, PinningService, StorageError, StorageResult};

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: Option<String>,
}

#[derive(Clone)]
pub struct PinataClient {
    client: Client,
    base_url: String,
    credentials: PinataCredentials,
}

impl PinataClient {
    pub fn new(client: Client, base_url: impl Into<String>, credentials: PinataCredentials) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            PinataCredentials::Jwt(jwt) => request.bearer_auth(jwt),
            PinataCredentials::KeyPair {
                api_key,
                secret_api_key,
            } => request
                .header("pinata_api_key", api_key.as_str())
                .header("pinata_secret_api_key", secret_api_key.as_str()),
        }
    }

    fn pinata_metadata(options: &PinOptions) -> serde_json::Value {
        json!({
            "name": options.name,
            "keyvalues": options.key_values,
        })
    }

    async fn send(&self, request: RequestBuilder, name: &str) -> StorageResult<String> {
        let response = self.apply_auth(request).send().await?;
        let body: PinResponse = ensure_success(response).await?.json().await?;

        let cid = body
            .ipfs_hash
            .filter(|cid| !cid.is_empty())
            .ok_or_else(|| StorageError::InvalidResponse("response has no IpfsHash".to_string()))?;

        tracing::debug!(cid = %cid, pin_name = %name, "Pinned on Pinata");
        Ok(cid)
    }
}

#[async_trait]
impl PinningService for PinataClient {
    async fn pin_json(&self, document: &serde_json::Value, options: &PinOptions) -> StorageResult<String> {
        let body = json!({
            "pinataContent": document,
            "pinataMetadata": Self::pinata_metadata(options),
        });
        let request = self
            .client
            .post(format!("{}/pinning/pinJSONToIPFS", self.base_url))
            .json(&body);

        self.send(request, &options.name).await
    }

    async fn pin_file(&self, data: Bytes, content_type: &str, options: &PinOptions) -> StorageResult<String> {
        let length = data.len() as u64;
        let file = Part::stream_with_length(data, length)
            .file_name(options.name.clone())
            .mime_str(content_type)
            .map_err(|e| StorageError::InvalidRequest(format!("invalid content type {}: {}", content_type, e)))?;
        let form = Form::new()
            .part("file", file)
            .text("pinataMetadata", Self::pinata_metadata(options).to_string());

        let request = self
            .client
            .post(format!("{}/pinning/pinFileToIPFS", self.base_url))
            .multipart(form);

        self.send(request, &options.name).await
    }

    fn name(&self) -> &str {
        "pinata"
    }
}
