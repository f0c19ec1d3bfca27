//! Tales Core Library
//!
//! This crate provides the domain models, validation rules, error metadata and
//! configuration shared by every Tales component: the storage backends, the
//! content pipeline and the operator CLI.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{ContentConfig, PinataCredentials};
pub use error::{ErrorMetadata, LogLevel, ValidationError};
pub use models::{ContentAddress, ContentMetadata, ContentRecord, ContentUri};
pub use storage_types::{PinPolicy, StorageBackend};
