//! Text compression codec
//!
//! Compressed text is zlib-deflated and then base64-encoded (standard
//! alphabet, padded) so it can travel inside a JSON string.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("compressed text is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to inflate compressed text: {0}")]
    Inflate(#[source] std::io::Error),

    #[error("failed to deflate text: {0}")]
    Deflate(#[source] std::io::Error),

    #[error("decompressed text is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Deflate `text` and encode the result as base64.
pub fn compress_text(text: &str) -> Result<String, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(text.as_bytes())
        .map_err(CodecError::Deflate)?;
    let compressed = encoder.finish().map_err(CodecError::Deflate)?;
    Ok(STANDARD.encode(compressed))
}

/// Reverse `compress_text`.
pub fn decompress_text(encoded: &str) -> Result<String, CodecError> {
    let compressed = STANDARD.decode(encoded)?;
    let mut decoder = ZlibDecoder::new(compressed.as_slice());
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(CodecError::Inflate)?;
    Ok(String::from_utf8(inflated)?)
}
