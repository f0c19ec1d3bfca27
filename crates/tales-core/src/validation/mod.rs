//! Validation modules

pub mod record;

pub use record::{parse_record, validate_media, validate_record};
