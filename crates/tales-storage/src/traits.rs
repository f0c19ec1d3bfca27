//! Storage abstraction traits
//!
//! The content pipeline talks to three kinds of collaborator, each behind its
//! own trait so that tests (and the local backend) can stand in for the
//! remote services:
//!
//! - `ContentStore`: the primary content-addressed store
//! - `PinningService`: the redundancy pin
//! - `ContentSource`: one entry of the retrieval chain

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tales_core::ContentAddress;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[cfg(feature = "storage-remote")]
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StorageError {
    /// Whether repeating the same call could succeed.
    ///
    /// Server errors, throttling, transport failures and garbled responses are
    /// worth retrying. Rejected credentials, bad requests, missing content and
    /// misconfiguration are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::Http { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            #[cfg(feature = "storage-remote")]
            StorageError::Request(_) => true,
            StorageError::InvalidResponse(_) => true,
            StorageError::Io(_) => true,
            StorageError::NotFound(_)
            | StorageError::InvalidKey(_)
            | StorageError::InvalidRequest(_)
            | StorageError::Config(_) => false,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Display name and tags attached to a pin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinOptions {
    pub name: String,
    pub key_values: BTreeMap<String, String>,
}

impl PinOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_values: BTreeMap::new(),
        }
    }

    pub fn with_key_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.key_values.insert(key.into(), value.into());
        self
    }
}

/// Primary content-addressed store.
///
/// Addresses are derived from content by the store, so identical bytes are
/// expected (but not required) to come back with the same address. The
/// returned string may be a bare CID or an `ipfs://` URI.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn store(&self, data: Bytes, content_type: &str) -> StorageResult<String>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

/// Secondary service that keeps a copy of the content available.
#[async_trait]
pub trait PinningService: Send + Sync {
    /// Pin a JSON document and return its address.
    async fn pin_json(&self, document: &serde_json::Value, options: &PinOptions) -> StorageResult<String>;

    /// Pin a binary blob and return its address.
    async fn pin_file(&self, data: Bytes, content_type: &str, options: &PinOptions) -> StorageResult<String>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

/// One endpoint content can be read back from.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the raw bytes stored under `address`. A single attempt.
    async fn fetch(&self, address: &ContentAddress) -> StorageResult<Bytes>;

    /// Name used in logs and in retrieval error reports.
    fn name(&self) -> &str;
}
