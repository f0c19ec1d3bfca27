//! Pipeline error type
//!
//! - `Validation`: bad input, reported before any network call
//! - `TransientIo`: a store or pin call that kept failing after the retry budget
//! - `Retrieval`: no source could serve the content
//! - `Codec`: the content was found but its compressed text is corrupt
//! - `Serialization`: the record could not be encoded for upload

use std::fmt::{Display, Formatter, Result as FmtResult};

use tales_core::{ErrorMetadata, LogLevel, ValidationError};
use tales_storage::StorageError;

use crate::codec::CodecError;

/// Why one retrieval source was skipped.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

impl Display for SourceFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    TransientIo {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: StorageError,
    },

    #[error("content not found on any gateway")]
    Retrieval {
        address: String,
        failures: Vec<SourceFailure>,
    },

    #[error("corrupt content: {0}")]
    Codec(#[from] CodecError),

    #[error("failed to encode record: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ContentError {
    /// Error type name for structured logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            ContentError::Validation(_) => "validation",
            ContentError::TransientIo { .. } => "transient_io",
            ContentError::Retrieval { .. } => "retrieval",
            ContentError::Codec(_) => "codec",
            ContentError::Serialization(_) => "serialization",
        }
    }
}

impl ErrorMetadata for ContentError {
    fn error_code(&self) -> &'static str {
        match self {
            ContentError::Validation(e) => e.error_code(),
            ContentError::TransientIo { .. } => "STORAGE_UNAVAILABLE",
            ContentError::Retrieval { .. } => "CONTENT_NOT_FOUND",
            ContentError::Codec(_) => "CORRUPT_CONTENT",
            ContentError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            ContentError::TransientIo { source, .. } => source.is_retryable(),
            ContentError::Retrieval { .. } => true,
            _ => false,
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            ContentError::Validation(e) => e.suggested_action(),
            ContentError::TransientIo { .. } => Some("Check credentials and service status, then retry"),
            ContentError::Retrieval { .. } => Some("Verify the address, or retry once the gateways have propagated the content"),
            ContentError::Codec(_) => Some("The stored record is damaged; re-upload it from the original"),
            ContentError::Serialization(_) => None,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ContentError::Validation(_) => LogLevel::Debug,
            ContentError::TransientIo { .. } => LogLevel::Warn,
            ContentError::Retrieval { .. }
            | ContentError::Codec(_)
            | ContentError::Serialization(_) => LogLevel::Error,
        }
    }

    fn client_message(&self) -> String {
        match self {
            ContentError::Validation(e) => e.client_message(),
            ContentError::Retrieval { address, failures } => {
                let tried: Vec<String> = failures.iter().map(ToString::to_string).collect();
                format!(
                    "content not found on any gateway: {} (tried {})",
                    address,
                    tried.join("; ")
                )
            }
            other => other.to_string(),
        }
    }
}
