//! Tales Storage Library
//!
//! This crate provides the collaborator traits of the content pipeline and
//! their implementations:
//!
//! - **Remote**: NFT.Storage as the primary store, Pinata as the redundancy
//!   pin, and public IPFS gateways as retrieval sources. All three share one
//!   `reqwest::Client` built by the factory.
//! - **Local**: a content-addressed directory that plays all three roles, for
//!   offline development and tests.
//!
//! # Addresses
//!
//! Remote addresses are the CIDs returned by the services. Local addresses are
//! the hex SHA-256 of the stored bytes. Either way the pipeline treats them as
//! opaque strings and hands them out as `ipfs://<address>`.

pub mod factory;
#[cfg(feature = "storage-remote")]
pub mod gateway;
#[cfg(feature = "storage-remote")]
pub mod http;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-remote")]
pub mod nft_storage;
#[cfg(feature = "storage-remote")]
pub mod pinata;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_backends, Backends};
#[cfg(feature = "storage-remote")]
pub use gateway::{gateway_sources, GatewaySource};
#[cfg(feature = "storage-remote")]
pub use http::build_http_client;
#[cfg(feature = "storage-local")]
pub use local::LocalContentStore;
#[cfg(feature = "storage-remote")]
pub use nft_storage::NftStorageClient;
#[cfg(feature = "storage-remote")]
pub use pinata::PinataClient;
pub use tales_core::StorageBackend;
pub use traits::{
    ContentSource, ContentStore, PinOptions, PinningService, StorageError, StorageResult,
};
