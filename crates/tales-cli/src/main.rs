//! Tales CLI: upload tales and media to content-addressed storage and read
//! them back.
//!
//! Configuration comes from the environment (or `.env`), see
//! `tales_core::ContentConfig`. Results are printed as JSON on stdout, logs go
//! to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use bytes::Bytes;
use clap::{ArgGroup, Parser, Subcommand};
use tales_cli::{
    error_json, guess_mime, init_tracing, parse_meta, print_json, read_record, truncate_string,
};
use tales_content::{ContentManager, ContentManagerConfig};
use tales_core::{ContentConfig, ContentRecord};

#[derive(Parser)]
#[command(name = "tales", about = "Tales content pipeline CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a tale and print its ipfs:// URI
    #[command(group(ArgGroup::new("input").required(true).args(["text", "file", "record"])))]
    Upload {
        /// Tale text
        #[arg(long)]
        text: Option<String>,
        /// Read the tale text from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Read a complete record (JSON) from a file
        #[arg(long)]
        record: Option<PathBuf>,
        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Media address to reference (repeatable)
        #[arg(long = "media")]
        media: Vec<String>,
        /// Metadata entry as key=value (repeatable)
        #[arg(long = "meta")]
        meta: Vec<String>,
    },
    /// Upload an image or video file
    UploadMedia {
        /// Path to the file to upload
        path: PathBuf,
        /// MIME type (guessed from the extension when omitted)
        #[arg(long)]
        mime: Option<String>,
    },
    /// Retrieve a tale by address and print it
    Retrieve {
        /// CID or ipfs:// URI
        address: String,
    },
    /// Download a media blob to a file
    FetchMedia {
        /// CID or ipfs:// URI
        address: String,
        /// Output file
        #[arg(long)]
        out: PathBuf,
    },
    /// Check that an address resolves to a well-formed tale
    Verify {
        /// CID or ipfs:// URI
        address: String,
    },
    /// Print the effective configuration (secrets redacted) and validate it
    CheckEnv,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            let value = error_json(&err);
            if let Err(e) = print_json(&value) {
                eprintln!("{:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<ExitCode> {
    let config = ContentConfig::from_env().context("Failed to load configuration")?;

    match command {
        Commands::CheckEnv => return check_env(&config),
        Commands::Upload {
            text,
            file,
            record,
            tags,
            media,
            meta,
        } => {
            let mut record = match (text, file, record) {
                (Some(text), _, _) => ContentRecord::now(text),
                (None, Some(path), _) => {
                    let text = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    ContentRecord::now(text)
                }
                (None, None, Some(path)) => read_record(&path, config.max_text_bytes).await?,
                (None, None, None) => anyhow::bail!("One of --text, --file or --record is required"),
            };
            record.tags.extend(tags);
            record.media.extend(media);
            parse_meta(&meta, &mut record.metadata)?;

            tracing::info!(
                preview = %truncate_string(&record.text, 40),
                timestamp = record.timestamp,
                "Uploading tale"
            );

            let manager = build_manager(&config).await?;
            let receipt = manager.upload_content_with_receipt(record).await?;
            print_json(&serde_json::json!({
                "uri": receipt.uri,
                "cid": receipt.uri.address(),
                "pin": receipt.pin,
            }))?;
        }
        Commands::UploadMedia { path, mime } => {
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mime = mime.unwrap_or_else(|| guess_mime(&path).to_string());

            let manager = build_manager(&config).await?;
            let receipt = manager
                .upload_media_with_receipt(Bytes::from(data), &mime)
                .await?;
            print_json(&serde_json::json!({
                "uri": receipt.uri,
                "cid": receipt.uri.address(),
                "mediaType": mime,
                "pin": receipt.pin,
            }))?;
        }
        Commands::Retrieve { address } => {
            let manager = build_manager(&config).await?;
            let record = manager.retrieve_content(&address).await?;
            print_json(&record)?;
        }
        Commands::FetchMedia { address, out } => {
            let manager = build_manager(&config).await?;
            let data = manager.retrieve_media(&address).await?;
            tokio::fs::write(&out, &data)
                .await
                .with_context(|| format!("Failed to write {}", out.display()))?;
            print_json(&serde_json::json!({
                "address": address,
                "out": out.display().to_string(),
                "bytes": data.len(),
            }))?;
        }
        Commands::Verify { address } => {
            let manager = build_manager(&config).await?;
            let valid = manager.verify_content(&address).await;
            print_json(&serde_json::json!({ "address": address, "valid": valid }))?;
            if !valid {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn build_manager(config: &ContentConfig) -> anyhow::Result<ContentManager> {
    config.validate().context("Invalid configuration")?;

    let backends = tales_storage::create_backends(config)
        .await
        .context("Failed to initialize storage backends")?;

    tracing::debug!(
        backend = %config.storage_backend,
        pin_policy = %config.pin_policy,
        "Storage backends ready"
    );

    Ok(ContentManager::from_backends(
        ContentManagerConfig::from(config),
        backends,
    ))
}

fn check_env(config: &ContentConfig) -> anyhow::Result<ExitCode> {
    let validation = config.validate();
    let valid = validation.is_ok();

    print_json(&serde_json::json!({
        "config": config.redacted_summary(),
        "production": config.is_production(),
        "valid": valid,
        "error": validation.err().map(|e| format!("{:#}", e)),
    }))?;

    Ok(if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
