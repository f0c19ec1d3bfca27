use std::sync::Arc;

#[cfg(feature = "storage-remote")]
use crate::{gateway_sources, http::build_http_client, NftStorageClient, PinataClient};
#[cfg(feature = "storage-local")]
use crate::LocalContentStore;
use crate::{ContentSource, ContentStore, PinningService, StorageBackend, StorageError, StorageResult};
use tales_core::ContentConfig;

/// The three collaborators a content manager needs, built from one
/// configuration.
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn ContentStore>,
    pub pinner: Arc<dyn PinningService>,
    /// Retrieval chain, highest priority first.
    pub sources: Vec<Arc<dyn ContentSource>>,
}

/// Create the storage backends based on configuration
pub async fn create_backends(config: &ContentConfig) -> StorageResult<Backends> {
    match config.storage_backend {
        #[cfg(feature = "storage-remote")]
        StorageBackend::Remote => {
            let api_key = config.nft_storage_api_key.clone().ok_or_else(|| {
                StorageError::Config("NFT_STORAGE_API_KEY not configured".to_string())
            })?;
            let credentials = config.pinata_credentials.clone().ok_or_else(|| {
                StorageError::Config(
                    "PINATA_JWT or PINATA_API_KEY/PINATA_SECRET_API_KEY not configured".to_string(),
                )
            })?;
            if config.gateway_urls.is_empty() {
                return Err(StorageError::Config(
                    "TALES_GATEWAY_URLS lists no gateways".to_string(),
                ));
            }

            let client = build_http_client(config.http_timeout())?;

            tracing::debug!(
                nft_storage = %config.nft_storage_api_url,
                pinata = %config.pinata_api_url,
                gateways = config.gateway_urls.len(),
                "Using remote storage backend"
            );

            Ok(Backends {
                store: Arc::new(NftStorageClient::new(
                    client.clone(),
                    config.nft_storage_api_url.clone(),
                    api_key,
                )),
                pinner: Arc::new(PinataClient::new(
                    client.clone(),
                    config.pinata_api_url.clone(),
                    credentials,
                )),
                sources: gateway_sources(&client, &config.gateway_urls),
            })
        }

        #[cfg(not(feature = "storage-remote"))]
        StorageBackend::Remote => Err(StorageError::Config(
            "Remote storage backend not available (storage-remote feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let storage = Arc::new(LocalContentStore::new(&config.local_storage_path).await?);

            tracing::debug!(path = %config.local_storage_path, "Using local storage backend");

            Ok(Backends {
                store: storage.clone(),
                pinner: storage.clone(),
                sources: vec![storage as Arc<dyn ContentSource>],
            })
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::Config(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
