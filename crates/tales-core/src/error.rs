//! Error types module
//!
//! `ValidationError` covers malformed or out-of-bound input. It is raised before
//! any network call and is never retried. Every error type in the workspace also
//! implements `ErrorMetadata` so callers (the CLI in particular) can report a
//! stable machine-readable code and pick a log level without matching on
//! variants.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like exhausted retries
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented and handled.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (the same call may succeed later)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the operator
    fn suggested_action(&self) -> Option<&'static str>;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;

    /// Message shown to the operator (may differ from the internal message)
    fn client_message(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("text required")]
    TextRequired,

    #[error("text too large")]
    TextTooLarge { len: usize, max: usize },

    #[error("media must be a list")]
    MediaNotList,

    #[error("tags must be a list")]
    TagsNotList,

    #[error("timestamp required")]
    TimestampRequired,

    #[error("metadata must be an object")]
    MetadataNotObject,

    #[error("metadata key is reserved: {0}")]
    ReservedMetadataKey(String),

    #[error("invalid content address: {0}")]
    InvalidAddress(String),

    #[error("invalid media type: {0}")]
    InvalidMediaType(String),

    #[error("media payload is empty")]
    EmptyMedia,
}

impl ErrorMetadata for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidAddress(_) => "INVALID_ADDRESS",
            ValidationError::TextTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            _ => "VALIDATION_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            ValidationError::TextTooLarge { .. } => Some("Shorten the text or split it into several tales"),
            ValidationError::InvalidAddress(_) => Some("Pass a CID or an ipfs:// URI"),
            _ => Some("Check the record fields and try again"),
        }
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }

    fn client_message(&self) -> String {
        match self {
            ValidationError::TextTooLarge { len, max } => {
                format!("text too large: {} bytes exceeds the {} byte limit", len, max)
            }
            other => other.to_string(),
        }
    }
}
