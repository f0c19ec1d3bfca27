//! Data models for the content pipeline
//!
//! `record` holds the unit of storage (a tale's off-chain body), `address`
//! holds the content identifiers used to find it again.

mod address;
mod record;

pub use address::{ContentAddress, ContentUri};
pub use record::{is_reserved_metadata_key, ContentMetadata, ContentRecord};
