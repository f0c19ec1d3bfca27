use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tales_content::ContentError;
use tales_core::validation::parse_record;
use tales_core::{ContentMetadata, ContentRecord, ErrorMetadata, LogLevel, ValidationError};

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// MIME type for an upload, from the file extension.
pub fn guess_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Parse `key=value` pairs from `--meta` into record metadata.
pub fn parse_meta(pairs: &[String], metadata: &mut ContentMetadata) -> anyhow::Result<()> {
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("Invalid --meta '{}', expected key=value", pair))?;
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("Invalid --meta '{}', key is empty", pair);
        }
        metadata.insert(key, value)?;
    }
    Ok(())
}

/// Load a complete record from a JSON file and validate it.
pub async fn read_record(path: &Path, max_text_bytes: usize) -> anyhow::Result<ContentRecord> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(parse_record(value, max_text_bytes)?)
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// JSON error object printed when a command fails.
pub fn error_json(err: &anyhow::Error) -> serde_json::Value {
    if let Some(e) = err.downcast_ref::<ContentError>() {
        log_at(e.log_level(), e.error_type(), err);
        return metadata_json(e);
    }
    if let Some(e) = err.downcast_ref::<ValidationError>() {
        log_at(e.log_level(), "validation", err);
        return metadata_json(e);
    }

    tracing::error!(error = %format!("{:#}", err), "Command failed");
    serde_json::json!({
        "error": format!("{:#}", err),
        "error_code": "CLI_ERROR",
        "recoverable": false,
    })
}

fn metadata_json(e: &impl ErrorMetadata) -> serde_json::Value {
    serde_json::json!({
        "error": e.client_message(),
        "error_code": e.error_code(),
        "recoverable": e.is_recoverable(),
        "suggested_action": e.suggested_action(),
    })
}

fn log_at(level: LogLevel, error_type: &str, err: &anyhow::Error) {
    match level {
        LogLevel::Debug => tracing::debug!(error_type, error = %err, "Command failed"),
        LogLevel::Warn => tracing::warn!(error_type, error = %err, "Command failed"),
        LogLevel::Error => tracing::error!(error_type, error = %err, "Command failed"),
    }
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_multibyte() {
        assert_eq!(truncate_string("ééééééé", 5), "éé...");
    }

    #[test]
    fn guess_mime_by_extension() {
        assert_eq!(guess_mime(&PathBuf::from("a.PNG")), "image/png");
        assert_eq!(guess_mime(&PathBuf::from("a.jpeg")), "image/jpeg");
        assert_eq!(guess_mime(&PathBuf::from("clip.mp4")), "video/mp4");
        assert_eq!(guess_mime(&PathBuf::from("notes.txt")), "text/plain");
        assert_eq!(guess_mime(&PathBuf::from("blob")), "application/octet-stream");
        assert_eq!(guess_mime(&PathBuf::from("archive.tar.gz")), "application/octet-stream");
    }

    #[test]
    fn parse_meta_pairs() {
        let mut metadata = ContentMetadata::default();
        parse_meta(&["lang=en".to_string(), "mood=a=b".to_string()], &mut metadata).unwrap();
        assert_eq!(metadata.get("lang"), Some(&serde_json::json!("en")));
        assert_eq!(metadata.get("mood"), Some(&serde_json::json!("a=b")));
    }

    #[test]
    fn parse_meta_rejects_bad_pairs() {
        let mut metadata = ContentMetadata::default();
        assert!(parse_meta(&["novalue".to_string()], &mut metadata).is_err());
        assert!(parse_meta(&["=x".to_string()], &mut metadata).is_err());

        let err = parse_meta(&["compressed=true".to_string()], &mut metadata).unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
    }

    #[tokio::test]
    async fn read_record_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tale.json");
        std::fs::write(
            &path,
            r#"{"text": "From a file", "timestamp": 1700000000000.0, "tags": ["a"], "metadata": {"lang": "en"}}"#,
        )
        .unwrap();

        let record = read_record(&path, 100).await.unwrap();
        assert_eq!(record.text, "From a file");
        assert_eq!(record.timestamp, 1_700_000_000_000);
        assert_eq!(record.tags, vec!["a".to_string()]);
        assert_eq!(record.metadata.get("lang"), Some(&serde_json::json!("en")));
    }

    #[tokio::test]
    async fn read_record_reports_problems() {
        let dir = tempfile::tempdir().unwrap();

        let missing = read_record(&dir.path().join("absent.json"), 100).await.unwrap_err();
        assert!(format!("{:#}", missing).contains("Failed to read"));

        let garbled = dir.path().join("garbled.json");
        std::fs::write(&garbled, "not json").unwrap();
        let err = read_record(&garbled, 100).await.unwrap_err();
        assert!(format!("{:#}", err).contains("is not valid JSON"));

        let oversized = dir.path().join("big.json");
        std::fs::write(&oversized, r#"{"text": "too long for the limit", "timestamp": 1}"#).unwrap();
        let err = read_record(&oversized, 5).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::TextTooLarge { .. })
        ));
    }

    #[test]
    fn error_json_uses_error_metadata() {
        let err = anyhow::Error::new(ContentError::from(ValidationError::TextRequired));
        let value = error_json(&err);
        assert_eq!(value["error_code"], "VALIDATION_ERROR");
        assert_eq!(value["recoverable"], false);

        let err = anyhow::anyhow!("boom");
        assert_eq!(error_json(&err)["error_code"], "CLI_ERROR");
    }
}
