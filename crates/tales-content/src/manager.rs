use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tales_core::constants::{COMPRESSION_THRESHOLD_BYTES, MAX_TEXT_BYTES, PIN_APP_TAG};
use tales_core::validation::{validate_media, validate_record};
use tales_core::{ContentAddress, ContentConfig, ContentRecord, ContentUri, PinPolicy};
use tales_storage::{Backends, ContentSource, ContentStore, PinOptions, PinningService, StorageError};

use crate::codec::{compress_text, decompress_text};
use crate::error::{ContentError, SourceFailure};
use crate::retry::RetryPolicy;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Immutable settings of a [`ContentManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentManagerConfig {
    pub max_text_bytes: usize,
    /// Text strictly longer than this many bytes is compressed.
    pub compression_threshold: usize,
    pub retry: RetryPolicy,
    pub pin_policy: PinPolicy,
}

impl Default for ContentManagerConfig {
    fn default() -> Self {
        Self {
            max_text_bytes: MAX_TEXT_BYTES,
            compression_threshold: COMPRESSION_THRESHOLD_BYTES,
            retry: RetryPolicy::default(),
            pin_policy: PinPolicy::default(),
        }
    }
}

impl From<&ContentConfig> for ContentManagerConfig {
    fn from(config: &ContentConfig) -> Self {
        Self {
            max_text_bytes: config.max_text_bytes,
            compression_threshold: config.compression_threshold,
            retry: RetryPolicy::new(config.max_retries, config.retry_delay()),
            pin_policy: config.pin_policy,
        }
    }
}

impl ContentManagerConfig {
    pub fn with_retry(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.retry = RetryPolicy::new(max_retries, base_delay);
        self
    }

    pub fn with_pin_policy(mut self, pin_policy: PinPolicy) -> Self {
        self.pin_policy = pin_policy;
        self
    }
}

/// What happened to the redundancy pin of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PinOutcome {
    Pinned { address: ContentAddress },
    /// Only produced under `PinPolicy::BestEffort`.
    Failed { error: String },
}

impl PinOutcome {
    pub fn is_pinned(&self) -> bool {
        matches!(self, PinOutcome::Pinned { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub uri: ContentUri,
    pub pin: PinOutcome,
}

/// Uploads records and media to the primary store, pins a second copy, and
/// reads content back through the ordered source chain.
///
/// Holds only configuration and shared collaborators, so clones are cheap and
/// every operation can run concurrently with the others.
#[derive(Clone)]
pub struct ContentManager {
    config: ContentManagerConfig,
    store: Arc<dyn ContentStore>,
    pinner: Arc<dyn PinningService>,
    sources: Vec<Arc<dyn ContentSource>>,
}

impl ContentManager {
    pub fn new(
        config: ContentManagerConfig,
        store: Arc<dyn ContentStore>,
        pinner: Arc<dyn PinningService>,
        sources: Vec<Arc<dyn ContentSource>>,
    ) -> Self {
        Self {
            config,
            store,
            pinner,
            sources,
        }
    }

    pub fn from_backends(config: ContentManagerConfig, backends: Backends) -> Self {
        Self::new(config, backends.store, backends.pinner, backends.sources)
    }

    pub fn config(&self) -> &ContentManagerConfig {
        &self.config
    }

    /// Validate, compress if needed, upload and pin a record.
    ///
    /// Returns `ipfs://<address>` of the primary upload.
    pub async fn upload_content(&self, record: ContentRecord) -> Result<ContentUri, ContentError> {
        self.upload_content_with_receipt(record)
            .await
            .map(|receipt| receipt.uri)
    }

    #[tracing::instrument(skip(self, record), fields(timestamp = record.timestamp, text_len = record.text.len()))]
    pub async fn upload_content_with_receipt(
        &self,
        record: ContentRecord,
    ) -> Result<UploadReceipt, ContentError> {
        validate_record(&record, self.config.max_text_bytes)?;

        let prepared = self.prepare(record)?;
        // Store and pinner must see the same bytes, so both are encoded from
        // the one document.
        let document = serde_json::to_value(&prepared)?;
        let body = Bytes::from(serde_json::to_vec(&document)?);

        let address = self
            .config
            .retry
            .run("primary upload", move || {
                let body = body.clone();
                async move {
                    let raw = self.store.store(body, JSON_CONTENT_TYPE).await?;
                    parse_returned_address(self.store.name(), &raw)
                }
            })
            .await?;

        tracing::info!(cid = %address, store = self.store.name(), "Uploaded record");

        let options = PinOptions::new(format!("tale-{}.json", prepared.timestamp))
            .with_key_value("app", PIN_APP_TAG)
            .with_key_value("kind", "tale")
            .with_key_value("timestamp", prepared.timestamp.to_string());

        let (document, options) = (&document, &options);
        let pinned = self
            .config
            .retry
            .run("pin", move || async move {
                let raw = self.pinner.pin_json(document, options).await?;
                parse_returned_address(self.pinner.name(), &raw)
            })
            .await;
        let pin = self.settle_pin(&address, pinned)?;

        Ok(UploadReceipt {
            uri: address.to_uri(),
            pin,
        })
    }

    /// Upload a binary blob as-is and pin it through the file endpoint.
    pub async fn upload_media(&self, data: Bytes, media_type: &str) -> Result<ContentUri, ContentError> {
        self.upload_media_with_receipt(data, media_type)
            .await
            .map(|receipt| receipt.uri)
    }

    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload_media_with_receipt(
        &self,
        data: Bytes,
        media_type: &str,
    ) -> Result<UploadReceipt, ContentError> {
        validate_media(&data, media_type)?;

        let address = self
            .config
            .retry
            .run("primary upload", || {
                let data = data.clone();
                async move {
                    let raw = self.store.store(data, media_type).await?;
                    parse_returned_address(self.store.name(), &raw)
                }
            })
            .await?;

        tracing::info!(cid = %address, store = self.store.name(), "Uploaded media");

        let options = PinOptions::new(media_pin_name(&data))
            .with_key_value("app", PIN_APP_TAG)
            .with_key_value("kind", "media")
            .with_key_value("mediaType", media_type);

        let options = &options;
        let pinned = self
            .config
            .retry
            .run("pin", || {
                let data = data.clone();
                async move {
                    let raw = self.pinner.pin_file(data, media_type, options).await?;
                    parse_returned_address(self.pinner.name(), &raw)
                }
            })
            .await;
        let pin = self.settle_pin(&address, pinned)?;

        Ok(UploadReceipt {
            uri: address.to_uri(),
            pin,
        })
    }

    /// Fetch a record from the first source that serves a valid one, and
    /// restore its text if it was stored compressed.
    #[tracing::instrument(skip(self))]
    pub async fn retrieve_content(&self, address: &str) -> Result<ContentRecord, ContentError> {
        let address = ContentAddress::parse(address)?;

        let mut record = self
            .fetch_first(&address, |body| {
                // JSON that is not a record (error pages, other documents) is
                // treated like a failed source so the next one gets a chance.
                serde_json::from_slice::<ContentRecord>(&body)
                    .map_err(|e| format!("invalid record: {}", e))
            })
            .await?;

        if record.metadata.compressed {
            record.text = decompress_text(&record.text)?;
            record.metadata.compressed = false;
            tracing::debug!(cid = %address, text_len = record.text.len(), "Decompressed record text");
        }

        Ok(record)
    }

    /// Fetch raw bytes from the first source that serves a non-empty body.
    #[tracing::instrument(skip(self))]
    pub async fn retrieve_media(&self, address: &str) -> Result<Bytes, ContentError> {
        let address = ContentAddress::parse(address)?;

        self.fetch_first(&address, |body| {
            if body.is_empty() {
                Err("empty body".to_string())
            } else {
                Ok(body)
            }
        })
        .await
    }

    /// Whether `address` resolves to a record with a string `text` and a
    /// numeric `timestamp`. Both are enforced by deserialization, so any
    /// successful retrieval counts. Never fails.
    #[tracing::instrument(skip(self))]
    pub async fn verify_content(&self, address: &str) -> bool {
        match self.retrieve_content(address).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(address, error = %e, "Verification failed");
                false
            }
        }
    }

    /// Clear any caller-supplied flag, then compress text above the threshold.
    fn prepare(&self, mut record: ContentRecord) -> Result<ContentRecord, ContentError> {
        record.metadata.compressed = false;

        let original_len = record.text.len();
        if original_len > self.config.compression_threshold {
            record.text = compress_text(&record.text)?;
            record.metadata.compressed = true;
            tracing::debug!(
                original_len,
                compressed_len = record.text.len(),
                "Compressed record text"
            );
        } else {
            tracing::debug!(
                text_len = original_len,
                threshold = self.config.compression_threshold,
                "Text below compression threshold"
            );
        }

        Ok(record)
    }

    fn settle_pin(
        &self,
        primary: &ContentAddress,
        pinned: Result<ContentAddress, ContentError>,
    ) -> Result<PinOutcome, ContentError> {
        match pinned {
            Ok(address) => {
                if address != *primary {
                    tracing::debug!(cid = %primary, pinned = %address, "Pin returned a different address");
                }
                tracing::info!(cid = %address, pinner = self.pinner.name(), "Pinned content");
                Ok(PinOutcome::Pinned { address })
            }
            Err(e) => match self.config.pin_policy {
                PinPolicy::Required => Err(e),
                PinPolicy::BestEffort => {
                    tracing::warn!(
                        cid = %primary,
                        pinner = self.pinner.name(),
                        error = %e,
                        "Pin failed, keeping primary upload"
                    );
                    Ok(PinOutcome::Failed {
                        error: e.to_string(),
                    })
                }
            },
        }
    }

    /// Ask each source once, in order, and return the first body `accept`
    /// takes.
    async fn fetch_first<T, F>(&self, address: &ContentAddress, accept: F) -> Result<T, ContentError>
    where
        F: Fn(Bytes) -> Result<T, String>,
    {
        let mut failures = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let reason = match source.fetch(address).await {
                Ok(body) => match accept(body) {
                    Ok(value) => {
                        tracing::info!(cid = %address, gateway = source.name(), "Retrieved content");
                        return Ok(value);
                    }
                    Err(reason) => reason,
                },
                Err(e) => e.to_string(),
            };

            tracing::warn!(cid = %address, gateway = source.name(), reason = %reason, "Source failed, trying next");
            failures.push(SourceFailure {
                source: source.name().to_string(),
                reason,
            });
        }

        Err(ContentError::Retrieval {
            address: address.to_string(),
            failures,
        })
    }
}

/// Stores may answer with a bare CID or an `ipfs://` URI.
fn parse_returned_address(service: &str, raw: &str) -> Result<ContentAddress, StorageError> {
    ContentAddress::parse(raw).map_err(|e| {
        StorageError::InvalidResponse(format!("{} returned an unusable address: {}", service, e))
    })
}

fn media_pin_name(data: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(data));
    format!("media-{}", &digest[..16])
}
