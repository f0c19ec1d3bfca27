use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::RESERVED_METADATA_KEYS;
use crate::error::ValidationError;

/// Auxiliary fields of a record.
///
/// `compressed` belongs to the pipeline and is serialized as
/// `metadata.compressed`. Caller fields live in `extra`, which is flattened
/// next to it on the wire. Keys are kept sorted so the JSON encoding of a
/// record is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    #[serde(default, skip_serializing_if = "is_false")]
    pub compressed: bool,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ContentMetadata {
    /// Insert a caller field. Reserved keys are refused.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, ValidationError> {
        let key = key.into();
        if is_reserved_metadata_key(&key) {
            return Err(ValidationError::ReservedMetadataKey(key));
        }
        Ok(self.extra.insert(key, value.into()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// First reserved key found in the caller fields, if any.
    pub fn reserved_key_in_extra(&self) -> Option<&str> {
        self.extra
            .keys()
            .map(String::as_str)
            .find(|key| is_reserved_metadata_key(key))
    }
}

pub fn is_reserved_metadata_key(key: &str) -> bool {
    RESERVED_METADATA_KEYS.contains(&key)
}

fn timestamp_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(millis) = number.as_i64() {
        return Ok(millis);
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f > i64::MIN as f64 && f < i64::MAX as f64 => Ok(f as i64),
        _ => Err(serde::de::Error::custom(format!(
            "timestamp out of range: {}",
            number
        ))),
    }
}

/// The unit of storage: one tale body plus its references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub text: String,

    #[serde(default)]
    pub media: Vec<String>,

    /// Milliseconds since the Unix epoch. Stored records written by other
    /// tools may carry a float here; it is truncated on read.
    #[serde(deserialize_with = "timestamp_millis")]
    pub timestamp: i64,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub metadata: ContentMetadata,
}

impl ContentRecord {
    pub fn new(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            text: text.into(),
            media: Vec::new(),
            timestamp,
            tags: Vec::new(),
            metadata: ContentMetadata::default(),
        }
    }

    /// Record stamped with the current time.
    pub fn now(text: impl Into<String>) -> Self {
        Self::new(text, chrono::Utc::now().timestamp_millis())
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_media<I, S>(mut self, media: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.media = media.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_compressed(&self) -> bool {
        self.metadata.compressed
    }
}
