//! Protocol-wide constants.

/// URI scheme of the off-chain storage namespace.
pub const IPFS_SCHEME: &str = "ipfs";

/// Maximum size of a record's `text`, in UTF-8 bytes.
pub const MAX_TEXT_BYTES: usize = 100_000;

/// Texts longer than this many bytes are stored compressed.
pub const COMPRESSION_THRESHOLD_BYTES: usize = 1_000;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_NFT_STORAGE_API_URL: &str = "https://api.nft.storage";
pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";
pub const DEFAULT_LOCAL_STORAGE_PATH: &str = "./.tales-storage";

/// Retrieval gateways in priority order: primary, mirror, pinning-service gateway.
pub const DEFAULT_GATEWAY_URLS: &[&str] = &[
    "https://nftstorage.link",
    "https://ipfs.io",
    "https://gateway.pinata.cloud",
];

/// Metadata keys owned by the pipeline. Callers cannot set these.
pub const RESERVED_METADATA_KEYS: &[&str] = &["compressed"];

/// Application tag attached to every pin.
pub const PIN_APP_TAG: &str = "tales";
