//! Configuration module
//!
//! Credentials, endpoints and pipeline limits, read once at process start and
//! passed explicitly to the storage factory and the content manager.

use std::env;
use std::time::Duration;

use crate::constants::{
    COMPRESSION_THRESHOLD_BYTES, DEFAULT_GATEWAY_URLS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_LOCAL_STORAGE_PATH, DEFAULT_MAX_RETRIES, DEFAULT_NFT_STORAGE_API_URL,
    DEFAULT_PINATA_API_URL, DEFAULT_RETRY_DELAY_MS, MAX_TEXT_BYTES,
};
use crate::storage_types::{PinPolicy, StorageBackend};

/// Pinata accepts either a JWT or a key/secret pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PinataCredentials {
    Jwt(String),
    KeyPair { api_key: String, secret_api_key: String },
}

/// Content pipeline configuration
#[derive(Clone, Debug)]
pub struct ContentConfig {
    pub environment: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub local_storage_path: String,
    pub nft_storage_api_key: Option<String>,
    pub nft_storage_api_url: String,
    pub pinata_credentials: Option<PinataCredentials>,
    pub pinata_api_url: String,
    /// Retrieval gateways, highest priority first.
    pub gateway_urls: Vec<String>,
    // Pipeline limits
    pub max_text_bytes: usize,
    pub compression_threshold: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub pin_policy: PinPolicy,
    pub http_timeout_secs: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            storage_backend: StorageBackend::Remote,
            local_storage_path: DEFAULT_LOCAL_STORAGE_PATH.to_string(),
            nft_storage_api_key: None,
            nft_storage_api_url: DEFAULT_NFT_STORAGE_API_URL.to_string(),
            pinata_credentials: None,
            pinata_api_url: DEFAULT_PINATA_API_URL.to_string(),
            gateway_urls: DEFAULT_GATEWAY_URLS.iter().map(|s| s.to_string()).collect(),
            max_text_bytes: MAX_TEXT_BYTES,
            compression_threshold: COMPRESSION_THRESHOLD_BYTES,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            pin_policy: PinPolicy::BestEffort,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl ContentConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a configuration from any variable source.
    pub fn from_vars<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let storage_backend = match var("TALES_STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::Remote,
        };

        let pinata_credentials = match var("PINATA_JWT") {
            Some(jwt) => Some(PinataCredentials::Jwt(jwt)),
            None => match (var("PINATA_API_KEY"), var("PINATA_SECRET_API_KEY")) {
                (Some(api_key), Some(secret_api_key)) => Some(PinataCredentials::KeyPair {
                    api_key,
                    secret_api_key,
                }),
                (Some(_), None) | (None, Some(_)) => {
                    return Err(anyhow::anyhow!(
                        "PINATA_API_KEY and PINATA_SECRET_API_KEY must be set together"
                    ))
                }
                (None, None) => None,
            },
        };

        let gateway_urls = match var("TALES_GATEWAY_URLS") {
            Some(urls) => urls
                .split(',')
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_GATEWAY_URLS.iter().map(|s| s.to_string()).collect(),
        };

        let pin_policy = if var("TALES_PIN_REQUIRED")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false)
        {
            PinPolicy::Required
        } else {
            PinPolicy::BestEffort
        };

        Ok(Self {
            environment,
            storage_backend,
            local_storage_path: var("TALES_LOCAL_STORAGE_PATH")
                .unwrap_or_else(|| DEFAULT_LOCAL_STORAGE_PATH.to_string()),
            nft_storage_api_key: var("NFT_STORAGE_API_KEY"),
            nft_storage_api_url: var("NFT_STORAGE_API_URL")
                .unwrap_or_else(|| DEFAULT_NFT_STORAGE_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            pinata_credentials,
            pinata_api_url: var("PINATA_API_URL")
                .unwrap_or_else(|| DEFAULT_PINATA_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            gateway_urls,
            max_text_bytes: var("TALES_MAX_TEXT_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_TEXT_BYTES),
            compression_threshold: var("TALES_COMPRESSION_THRESHOLD")
                .and_then(|v| v.parse().ok())
                .unwrap_or(COMPRESSION_THRESHOLD_BYTES),
            max_retries: var("TALES_MAX_RETRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_RETRIES),
            retry_delay_ms: var("TALES_RETRY_DELAY_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRY_DELAY_MS),
            pin_policy,
            http_timeout_secs: var("TALES_HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_backend == StorageBackend::Remote {
            if self.nft_storage_api_key.is_none() {
                return Err(anyhow::anyhow!(
                    "NFT_STORAGE_API_KEY must be set when using the remote storage backend"
                ));
            }
            if self.pinata_credentials.is_none() {
                return Err(anyhow::anyhow!(
                    "PINATA_JWT (or PINATA_API_KEY and PINATA_SECRET_API_KEY) must be set when using the remote storage backend"
                ));
            }
            if self.gateway_urls.is_empty() {
                return Err(anyhow::anyhow!(
                    "TALES_GATEWAY_URLS must list at least one gateway"
                ));
            }
        }

        for url in self
            .gateway_urls
            .iter()
            .chain([&self.nft_storage_api_url, &self.pinata_api_url])
        {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow::anyhow!("Invalid URL '{}': must use http or https", url));
            }
        }

        if self.max_retries == 0 {
            return Err(anyhow::anyhow!("TALES_MAX_RETRIES must be at least 1"));
        }

        if self.compression_threshold >= self.max_text_bytes {
            return Err(anyhow::anyhow!(
                "TALES_COMPRESSION_THRESHOLD ({}) must be below TALES_MAX_TEXT_BYTES ({})",
                self.compression_threshold,
                self.max_text_bytes
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Configuration summary safe to print: secrets are reduced to whether
    /// they are set.
    pub fn redacted_summary(&self) -> serde_json::Value {
        let pinata_auth = match &self.pinata_credentials {
            Some(PinataCredentials::Jwt(_)) => "jwt",
            Some(PinataCredentials::KeyPair { .. }) => "api_key",
            None => "missing",
        };

        serde_json::json!({
            "environment": self.environment,
            "storage_backend": self.storage_backend,
            "local_storage_path": self.local_storage_path,
            "nft_storage_api_url": self.nft_storage_api_url,
            "nft_storage_api_key": if self.nft_storage_api_key.is_some() { "set" } else { "missing" },
            "pinata_api_url": self.pinata_api_url,
            "pinata_auth": pinata_auth,
            "gateway_urls": self.gateway_urls,
            "max_text_bytes": self.max_text_bytes,
            "compression_threshold": self.compression_threshold,
            "max_retries": self.max_retries,
            "retry_delay_ms": self.retry_delay_ms,
            "pin_policy": self.pin_policy,
            "http_timeout_secs": self.http_timeout_secs,
        })
    }
}
