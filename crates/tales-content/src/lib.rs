//! Tales Content Library
//!
//! The content pipeline behind every tale: validate a record, compress long
//! text, upload it to the primary content-addressed store, pin a second copy,
//! and read it back through an ordered chain of gateways.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use tales_content::{ContentManager, ContentManagerConfig};
//! use tales_core::{ContentConfig, ContentRecord};
//!
//! let config = ContentConfig::from_env()?;
//! let backends = tales_storage::create_backends(&config).await?;
//! let manager = ContentManager::from_backends(ContentManagerConfig::from(&config), backends);
//!
//! let uri = manager.upload_content(ContentRecord::now("Once upon a time")).await?;
//! let record = manager.retrieve_content(&uri.to_string()).await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod manager;
pub mod retry;

pub use codec::{compress_text, decompress_text, CodecError};
pub use error::{ContentError, SourceFailure};
pub use manager::{ContentManager, ContentManagerConfig, PinOutcome, UploadReceipt};
pub use retry::RetryPolicy;
