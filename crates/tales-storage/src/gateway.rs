//! IPFS HTTP gateways as retrieval sources.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tales_core::ContentAddress;

use crate::http::ensure_success;
use crate::traits::{ContentSource, StorageError, StorageResult};

/// `GET {base_url}/ipfs/{address}`; any 2xx body is returned as-is.
#[derive(Clone)]
pub struct GatewaySource {
    client: Client,
    base_url: String,
    name: String,
}

impl GatewaySource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let name = base_url
            .split("://")
            .nth(1)
            .unwrap_or(base_url.as_str())
            .to_string();
        Self {
            client,
            base_url,
            name,
        }
    }

    pub fn content_url(&self, address: &ContentAddress) -> String {
        format!("{}/ipfs/{}", self.base_url, address)
    }
}

#[async_trait]
impl ContentSource for GatewaySource {
    async fn fetch(&self, address: &ContentAddress) -> StorageResult<Bytes> {
        let response = self.client.get(self.content_url(address)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(address.to_string()));
        }

        let body = ensure_success(response).await?.bytes().await?;
        Ok(body)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build the retrieval chain, keeping the configured priority order.
pub fn gateway_sources(client: &Client, urls: &[String]) -> Vec<Arc<dyn ContentSource>> {
    urls.iter()
        .map(|url| Arc::new(GatewaySource::new(client.clone(), url.as_str())) as Arc<dyn ContentSource>)
        .collect()
}
