use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// `Remote` talks to NFT.Storage, Pinata and the public IPFS gateways.
/// `Local` keeps everything in a content-addressed directory on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Remote,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remote" | "ipfs" => Ok(StorageBackend::Remote),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Remote => write!(f, "remote"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// What an upload does when the redundancy pin fails after the primary write
/// succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinPolicy {
    /// Log the failure and still return the primary address.
    #[default]
    BestEffort,
    /// Fail the whole upload.
    Required,
}

impl Display for PinPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PinPolicy::BestEffort => write!(f, "best_effort"),
            PinPolicy::Required => write!(f, "required"),
        }
    }
}
