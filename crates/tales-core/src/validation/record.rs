//! Record validation
//!
//! Two entry points:
//! - `validate_record` checks a typed `ContentRecord` before upload
//! - `parse_record` takes untyped JSON (e.g. a record file handed to the CLI),
//!   reports shape errors with the same messages, then validates the result
//!
//! Check order is fixed: text, text size, media, tags, timestamp, metadata.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::models::{is_reserved_metadata_key, ContentMetadata, ContentRecord};

/// Validate a typed record against the size limit.
pub fn validate_record(record: &ContentRecord, max_text_bytes: usize) -> Result<(), ValidationError> {
    if record.text.is_empty() {
        return Err(ValidationError::TextRequired);
    }

    if record.text.len() > max_text_bytes {
        return Err(ValidationError::TextTooLarge {
            len: record.text.len(),
            max: max_text_bytes,
        });
    }

    if record.timestamp <= 0 {
        return Err(ValidationError::TimestampRequired);
    }

    if let Some(key) = record.metadata.reserved_key_in_extra() {
        return Err(ValidationError::ReservedMetadataKey(key.to_string()));
    }

    Ok(())
}

/// Build a record from untyped JSON.
pub fn parse_record(value: Value, max_text_bytes: usize) -> Result<ContentRecord, ValidationError> {
    let mut obj = match value {
        Value::Object(obj) => obj,
        _ => return Err(ValidationError::TextRequired),
    };

    let text = match obj.remove("text") {
        Some(Value::String(text)) if !text.is_empty() => text,
        _ => return Err(ValidationError::TextRequired),
    };

    if text.len() > max_text_bytes {
        return Err(ValidationError::TextTooLarge {
            len: text.len(),
            max: max_text_bytes,
        });
    }

    let media = string_list(obj.remove("media"), ValidationError::MediaNotList)?;
    let tags = string_list(obj.remove("tags"), ValidationError::TagsNotList)?;
    let timestamp = positive_timestamp(obj.remove("timestamp"))?;
    let metadata = caller_metadata(obj.remove("metadata"))?;

    let record = ContentRecord {
        text,
        media,
        timestamp,
        tags,
        metadata,
    };
    validate_record(&record, max_text_bytes)?;
    Ok(record)
}

/// Validate a binary upload.
pub fn validate_media(data: &[u8], media_type: &str) -> Result<(), ValidationError> {
    if data.is_empty() {
        return Err(ValidationError::EmptyMedia);
    }

    let valid_type = match media_type.split_once('/') {
        Some((kind, subtype)) => {
            !kind.is_empty()
                && !subtype.is_empty()
                && !subtype.contains('/')
                && !media_type.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid_type {
        return Err(ValidationError::InvalidMediaType(media_type.to_string()));
    }

    Ok(())
}

fn string_list(value: Option<Value>, err: ValidationError) -> Result<Vec<String>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(err.clone()),
            })
            .collect(),
        Some(_) => Err(err),
    }
}

fn positive_timestamp(value: Option<Value>) -> Result<i64, ValidationError> {
    let number = match value {
        Some(Value::Number(n)) => n,
        _ => return Err(ValidationError::TimestampRequired),
    };

    let millis = if let Some(i) = number.as_i64() {
        i
    } else {
        match number.as_f64() {
            Some(f) if f.is_finite() && f >= 1.0 && f < i64::MAX as f64 => f as i64,
            _ => return Err(ValidationError::TimestampRequired),
        }
    };

    if millis <= 0 {
        return Err(ValidationError::TimestampRequired);
    }
    Ok(millis)
}

/// Caller metadata from raw JSON. A `compressed: false` left over from a
/// retrieved record is dropped; any other use of a reserved key is refused.
fn caller_metadata(value: Option<Value>) -> Result<ContentMetadata, ValidationError> {
    let obj: Map<String, Value> = match value {
        None | Some(Value::Null) => return Ok(ContentMetadata::default()),
        Some(Value::Object(obj)) => obj,
        Some(_) => return Err(ValidationError::MetadataNotObject),
    };

    let mut metadata = ContentMetadata::default();
    for (key, value) in obj {
        if is_reserved_metadata_key(&key) {
            if value == Value::Bool(false) {
                continue;
            }
            return Err(ValidationError::ReservedMetadataKey(key));
        }
        metadata.extra.insert(key, value);
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_TEXT_BYTES;
    use serde_json::json;

    #[test]
    fn test_validate_record_ok() {
        let record = ContentRecord::new("hello", 1);
        assert!(validate_record(&record, MAX_TEXT_BYTES).is_ok());
    }

    #[test]
    fn test_validate_record_empty_text() {
        let record = ContentRecord::new("", 1);
        assert_eq!(
            validate_record(&record, MAX_TEXT_BYTES),
            Err(ValidationError::TextRequired)
        );
    }

    #[test]
    fn test_validate_record_too_large() {
        let record = ContentRecord::new("x".repeat(MAX_TEXT_BYTES + 1), 1);
        assert!(matches!(
            validate_record(&record, MAX_TEXT_BYTES),
            Err(ValidationError::TextTooLarge { len, max }) if len == MAX_TEXT_BYTES + 1 && max == MAX_TEXT_BYTES
        ));
    }

    #[test]
    fn test_validate_record_exact_limit_allowed() {
        let record = ContentRecord::new("x".repeat(MAX_TEXT_BYTES), 1);
        assert!(validate_record(&record, MAX_TEXT_BYTES).is_ok());
    }

    #[test]
    fn test_validate_record_size_counts_bytes() {
        // 'é' is two bytes in UTF-8
        let record = ContentRecord::new("é".repeat(6), 1);
        assert!(validate_record(&record, 11).is_err());
        assert!(validate_record(&record, 12).is_ok());
    }

    #[test]
    fn test_validate_record_timestamp() {
        assert_eq!(
            validate_record(&ContentRecord::new("a", 0), MAX_TEXT_BYTES),
            Err(ValidationError::TimestampRequired)
        );
        assert_eq!(
            validate_record(&ContentRecord::new("a", -5), MAX_TEXT_BYTES),
            Err(ValidationError::TimestampRequired)
        );
    }

    #[test]
    fn test_validate_record_reserved_metadata() {
        let mut record = ContentRecord::new("a", 1);
        record
            .metadata
            .extra
            .insert("compressed".to_string(), json!(1));
        assert_eq!(
            validate_record(&record, MAX_TEXT_BYTES),
            Err(ValidationError::ReservedMetadataKey("compressed".to_string()))
        );
    }

    #[test]
    fn test_parse_record_full() {
        let record = parse_record(
            json!({
                "text": "hi",
                "media": ["bafy1"],
                "timestamp": 42,
                "tags": ["a", "b"],
                "metadata": {"lang": "en"}
            }),
            MAX_TEXT_BYTES,
        )
        .unwrap();

        assert_eq!(record.text, "hi");
        assert_eq!(record.media, vec!["bafy1"]);
        assert_eq!(record.timestamp, 42);
        assert_eq!(record.tags, vec!["a", "b"]);
        assert_eq!(record.metadata.get("lang"), Some(&json!("en")));
    }

    #[test]
    fn test_parse_record_missing_text() {
        assert_eq!(
            parse_record(json!({"timestamp": 1}), MAX_TEXT_BYTES),
            Err(ValidationError::TextRequired)
        );
        assert_eq!(
            parse_record(json!({"text": 5, "timestamp": 1}), MAX_TEXT_BYTES),
            Err(ValidationError::TextRequired)
        );
        assert_eq!(
            parse_record(json!("just a string"), MAX_TEXT_BYTES),
            Err(ValidationError::TextRequired)
        );
    }

    #[test]
    fn test_parse_record_empty_text() {
        assert_eq!(
            parse_record(json!({"text": "", "timestamp": 1}), MAX_TEXT_BYTES),
            Err(ValidationError::TextRequired)
        );
    }

    #[test]
    fn test_parse_record_lists() {
        assert_eq!(
            parse_record(json!({"text": "a", "timestamp": 1, "media": "bafy"}), MAX_TEXT_BYTES),
            Err(ValidationError::MediaNotList)
        );
        assert_eq!(
            parse_record(json!({"text": "a", "timestamp": 1, "tags": {"x": 1}}), MAX_TEXT_BYTES),
            Err(ValidationError::TagsNotList)
        );
        assert_eq!(
            parse_record(json!({"text": "a", "timestamp": 1, "tags": [1, 2]}), MAX_TEXT_BYTES),
            Err(ValidationError::TagsNotList)
        );
        assert!(parse_record(
            json!({"text": "a", "timestamp": 1, "tags": null, "media": null}),
            MAX_TEXT_BYTES
        )
        .is_ok());
    }

    #[test]
    fn test_parse_record_timestamp() {
        for bad in [json!(0), json!(-1), json!("123"), json!(null), json!(0.5)] {
            assert_eq!(
                parse_record(json!({"text": "a", "timestamp": bad}), MAX_TEXT_BYTES),
                Err(ValidationError::TimestampRequired)
            );
        }
        assert_eq!(
            parse_record(json!({"text": "a"}), MAX_TEXT_BYTES),
            Err(ValidationError::TimestampRequired)
        );
        let record = parse_record(json!({"text": "a", "timestamp": 1700000000000.0}), MAX_TEXT_BYTES)
            .unwrap();
        assert_eq!(record.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_parse_record_text_checked_before_other_fields() {
        assert_eq!(
            parse_record(json!({"text": "", "media": "bad", "timestamp": 0}), MAX_TEXT_BYTES),
            Err(ValidationError::TextRequired)
        );
        assert!(matches!(
            parse_record(json!({"text": "xx", "media": "bad"}), 1),
            Err(ValidationError::TextTooLarge { .. })
        ));
    }

    #[test]
    fn test_parse_record_metadata() {
        assert_eq!(
            parse_record(json!({"text": "a", "timestamp": 1, "metadata": [1]}), MAX_TEXT_BYTES),
            Err(ValidationError::MetadataNotObject)
        );
        assert_eq!(
            parse_record(
                json!({"text": "a", "timestamp": 1, "metadata": {"compressed": true}}),
                MAX_TEXT_BYTES
            ),
            Err(ValidationError::ReservedMetadataKey("compressed".to_string()))
        );
        let record = parse_record(
            json!({"text": "a", "timestamp": 1, "metadata": {"compressed": false, "k": "v"}}),
            MAX_TEXT_BYTES,
        )
        .unwrap();
        assert!(!record.is_compressed());
        assert!(record.metadata.get("compressed").is_none());
        assert_eq!(record.metadata.get("k"), Some(&json!("v")));
    }

    #[test]
    fn test_validate_media() {
        assert!(validate_media(b"png", "image/png").is_ok());
        assert_eq!(validate_media(b"", "image/png"), Err(ValidationError::EmptyMedia));
        for bad in ["image", "image/", "/png", "image/png/x", "image /png", ""] {
            assert!(matches!(
                validate_media(b"x", bad),
                Err(ValidationError::InvalidMediaType(_))
            ));
        }
    }
}
