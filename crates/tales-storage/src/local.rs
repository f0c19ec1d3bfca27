use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tales_core::ContentAddress;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::traits::{
    ContentSource, ContentStore, PinOptions, PinningService, StorageError, StorageResult,
};

const PINS_DIR: &str = "pins";

/// Local filesystem content store.
///
/// Blobs live at `{base_path}/{address}` where the address is the hex SHA-256
/// of the bytes, so storing the same bytes twice yields the same address and
/// a single file. Pins are recorded as `{base_path}/pins/{name}` containing
/// the pinned address. The same instance serves as store, pinner and
/// retrieval source.
#[derive(Clone)]
pub struct LocalContentStore {
    base_path: PathBuf,
}

impl LocalContentStore {
    /// Create a new LocalContentStore rooted at `base_path`, creating the
    /// directory tree if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(base_path.join(PINS_DIR)).await.map_err(|e| {
            StorageError::Config(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalContentStore { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Content address for `data`.
    pub fn address_of(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// Convert an address to a blob path.
    ///
    /// `ContentAddress` already refuses separators; the extra check keeps
    /// lookups from reaching outside the storage directory or into `pins/`.
    fn blob_path(&self, address: &str) -> StorageResult<PathBuf> {
        if address.is_empty()
            || address.contains("..")
            || address.contains('/')
            || address.contains('\\')
            || address == PINS_DIR
        {
            return Err(StorageError::InvalidKey(format!(
                "Invalid content address: {}",
                address
            )));
        }
        Ok(self.base_path.join(address))
    }

    fn pin_path(&self, name: &str) -> StorageResult<PathBuf> {
        if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(StorageError::InvalidKey(format!("Invalid pin name: {}", name)));
        }
        Ok(self.base_path.join(PINS_DIR).join(name))
    }

    /// Write `data` to `path` through a temp file and a rename, so readers
    /// never observe a partial blob.
    async fn write_atomic(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidKey(path.display().to_string()))?;
        let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, path).await?;
        Ok(())
    }

    async fn put(&self, data: &[u8]) -> StorageResult<String> {
        let address = Self::address_of(data);
        let path = self.blob_path(&address)?;

        if !fs::try_exists(&path).await? {
            self.write_atomic(&path, data).await?;
        }

        tracing::debug!(address = %address, size = data.len(), "Stored blob locally");
        Ok(address)
    }

    async fn record_pin(&self, address: &str, options: &PinOptions) -> StorageResult<()> {
        let path = self.pin_path(&options.name)?;
        self.write_atomic(&path, address.as_bytes()).await
    }

    /// Address recorded under a pin name, if any.
    pub async fn pinned_address(&self, name: &str) -> StorageResult<Option<String>> {
        let path = self.pin_path(name)?;
        match fs::read_to_string(&path).await {
            Ok(address) => Ok(Some(address)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

#[async_trait]
impl ContentStore for LocalContentStore {
    async fn store(&self, data: Bytes, _content_type: &str) -> StorageResult<String> {
        self.put(&data).await
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[async_trait]
impl PinningService for LocalContentStore {
    async fn pin_json(&self, document: &serde_json::Value, options: &PinOptions) -> StorageResult<String> {
        let data = serde_json::to_vec(document)
            .map_err(|e| StorageError::InvalidRequest(format!("Failed to encode document: {}", e)))?;
        let address = self.put(&data).await?;
        self.record_pin(&address, options).await?;
        Ok(address)
    }

    async fn pin_file(&self, data: Bytes, _content_type: &str, options: &PinOptions) -> StorageResult<String> {
        let address = self.put(&data).await?;
        self.record_pin(&address, options).await?;
        Ok(address)
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[async_trait]
impl ContentSource for LocalContentStore {
    async fn fetch(&self, address: &ContentAddress) -> StorageResult<Bytes> {
        let path = self.blob_path(address.as_str())?;

        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(address.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn name(&self) -> &str {
        "local"
    }
}
