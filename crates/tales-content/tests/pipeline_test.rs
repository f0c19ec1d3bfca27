use bytes::Bytes;
use mockito::Matcher;
use serde_json::json;
use tales_content::{compress_text, ContentError, ContentManager, ContentManagerConfig, PinOutcome};
use tales_core::{ContentConfig, ContentRecord, PinPolicy, PinataCredentials, StorageBackend};
use tales_storage::{create_backends, LocalContentStore};
use tempfile::tempdir;

fn remote_config(nft: &str, pinata: &str, gateways: Vec<String>) -> ContentConfig {
    ContentConfig {
        storage_backend: StorageBackend::Remote,
        nft_storage_api_key: Some("nft-key".to_string()),
        nft_storage_api_url: nft.to_string(),
        pinata_credentials: Some(PinataCredentials::Jwt("pinata-jwt".to_string())),
        pinata_api_url: pinata.to_string(),
        gateway_urls: gateways,
        retry_delay_ms: 1,
        ..Default::default()
    }
}

async fn manager_for(config: &ContentConfig) -> ContentManager {
    let backends = create_backends(config).await.unwrap();
    ContentManager::from_backends(ContentManagerConfig::from(config), backends)
}

#[tokio::test]
async fn test_remote_upload_and_pin() {
    let mut nft = mockito::Server::new_async().await;
    let mut pinata = mockito::Server::new_async().await;

    let record = ContentRecord::new("Hello world", 1_700_000_000_000).with_tags(["intro"]);
    let document = serde_json::to_value(&record).unwrap();

    let upload = nft
        .mock("POST", "/upload")
        .match_header("authorization", "Bearer nft-key")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Exact(serde_json::to_string(&document).unwrap()))
        .with_status(200)
        .with_body(r#"{"ok": true, "value": {"cid": "bafyremote"}}"#)
        .expect(1)
        .create_async()
        .await;

    let pin = pinata
        .mock("POST", "/pinning/pinJSONToIPFS")
        .match_header("authorization", "Bearer pinata-jwt")
        .match_body(Matcher::PartialJson(json!({
            "pinataContent": document,
            "pinataMetadata": {
                "name": "tale-1700000000000.json",
                "keyvalues": {"app": "tales", "kind": "tale"}
            }
        })))
        .with_status(200)
        .with_body(r#"{"IpfsHash": "bafyremote"}"#)
        .expect(1)
        .create_async()
        .await;

    let config = remote_config(&nft.url(), &pinata.url(), vec!["https://ipfs.io".to_string()]);
    let manager = manager_for(&config).await;

    let receipt = manager.upload_content_with_receipt(record).await.unwrap();

    assert_eq!(receipt.uri.to_string(), "ipfs://bafyremote");
    assert!(receipt.pin.is_pinned());
    upload.assert_async().await;
    pin.assert_async().await;
}

#[tokio::test]
async fn test_rejected_key_stops_before_pin() {
    let mut nft = mockito::Server::new_async().await;
    let mut pinata = mockito::Server::new_async().await;

    let upload = nft
        .mock("POST", "/upload")
        .with_status(401)
        .with_body("invalid token")
        .expect(1)
        .create_async()
        .await;
    let pin = pinata
        .mock("POST", "/pinning/pinJSONToIPFS")
        .expect(0)
        .create_async()
        .await;

    let config = remote_config(&nft.url(), &pinata.url(), vec!["https://ipfs.io".to_string()]);
    let manager = manager_for(&config).await;

    let err = manager
        .upload_content(ContentRecord::new("x", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::TransientIo { attempts: 1, .. }));
    upload.assert_async().await;
    pin.assert_async().await;
}

#[tokio::test]
async fn test_pin_outage_is_best_effort_by_default() {
    let mut nft = mockito::Server::new_async().await;
    let mut pinata = mockito::Server::new_async().await;

    nft.mock("POST", "/upload")
        .with_status(200)
        .with_body(r#"{"ok": true, "value": {"cid": "bafykept"}}"#)
        .create_async()
        .await;
    let pin = pinata
        .mock("POST", "/pinning/pinJSONToIPFS")
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let config = remote_config(&nft.url(), &pinata.url(), vec!["https://ipfs.io".to_string()]);
    let manager = manager_for(&config).await;

    let receipt = manager
        .upload_content_with_receipt(ContentRecord::new("x", 1))
        .await
        .unwrap();
    assert_eq!(receipt.uri.to_string(), "ipfs://bafykept");
    assert!(matches!(receipt.pin, PinOutcome::Failed { .. }));
    pin.assert_async().await;

    let strict = ContentConfig {
        pin_policy: PinPolicy::Required,
        ..config
    };
    let manager = manager_for(&strict).await;
    let err = manager
        .upload_content(ContentRecord::new("x", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::TransientIo { operation: "pin", .. }));
}

#[tokio::test]
async fn test_gateway_fallback_with_compressed_record() {
    let mut primary = mockito::Server::new_async().await;
    let mut mirror = mockito::Server::new_async().await;
    let mut pinned = mockito::Server::new_async().await;

    let text = "Once upon a time. ".repeat(200);
    let document = json!({
        "text": compress_text(&text).unwrap(),
        "timestamp": 1,
        "media": ["bafyimage"],
        "metadata": {"compressed": true, "lang": "en"}
    });

    let first = primary
        .mock("GET", "/ipfs/bafytale")
        .with_status(504)
        .expect(1)
        .create_async()
        .await;
    let second = mirror
        .mock("GET", "/ipfs/bafytale")
        .with_status(200)
        .with_body("<html>rate limited</html>")
        .expect(1)
        .create_async()
        .await;
    let third = pinned
        .mock("GET", "/ipfs/bafytale")
        .with_status(200)
        .with_body(document.to_string())
        .expect(1)
        .create_async()
        .await;

    let config = remote_config(
        "http://127.0.0.1:1",
        "http://127.0.0.1:1",
        vec![primary.url(), mirror.url(), pinned.url()],
    );
    let manager = manager_for(&config).await;

    let record = manager.retrieve_content("ipfs://bafytale").await.unwrap();
    assert_eq!(record.text, text);
    assert!(!record.metadata.compressed);
    assert_eq!(record.media, vec!["bafyimage".to_string()]);
    assert_eq!(record.metadata.get("lang"), Some(&json!("en")));

    first.assert_async().await;
    second.assert_async().await;
    third.assert_async().await;
}

#[tokio::test]
async fn test_verify_false_when_every_gateway_fails() {
    let mut primary = mockito::Server::new_async().await;
    let mut mirror = mockito::Server::new_async().await;

    primary
        .mock("GET", "/ipfs/bafygone")
        .with_status(404)
        .create_async()
        .await;
    mirror
        .mock("GET", "/ipfs/bafygone")
        .with_status(500)
        .create_async()
        .await;

    let config = remote_config(
        "http://127.0.0.1:1",
        "http://127.0.0.1:1",
        vec![primary.url(), mirror.url()],
    );
    let manager = manager_for(&config).await;

    assert!(!manager.verify_content("bafygone").await);
    let err = manager.retrieve_content("bafygone").await.unwrap_err();
    assert_eq!(err.to_string(), "content not found on any gateway");
}

#[tokio::test]
async fn test_local_backend_round_trip() {
    let dir = tempdir().unwrap();
    let config = ContentConfig {
        storage_backend: StorageBackend::Local,
        local_storage_path: dir.path().display().to_string(),
        ..Default::default()
    };
    let manager = manager_for(&config).await;

    let mut short = ContentRecord::new("A short tale", 10).with_tags(["short"]);
    short.metadata.insert("lang", "en").unwrap();
    let receipt = manager.upload_content_with_receipt(short.clone()).await.unwrap();
    let uri = receipt.uri;
    assert_eq!(
        receipt.pin,
        PinOutcome::Pinned {
            address: uri.address().clone()
        }
    );
    assert_eq!(manager.retrieve_content(&uri.to_string()).await.unwrap(), short);
    assert!(manager.verify_content(&uri.to_string()).await);

    let long_text = "word ".repeat(1_000);
    let long = ContentRecord::new(long_text.clone(), 11);
    let long_uri = manager.upload_content(long).await.unwrap();

    let raw = tokio::fs::read(dir.path().join(long_uri.address().as_str()))
        .await
        .unwrap();
    let stored: ContentRecord = serde_json::from_slice(&raw).unwrap();
    assert!(stored.metadata.compressed);
    assert_ne!(stored.text, long_text);

    let back = manager.retrieve_content(long_uri.address().as_str()).await.unwrap();
    assert_eq!(back.text, long_text);
    assert!(!back.metadata.compressed);

    let store = LocalContentStore::new(dir.path()).await.unwrap();
    assert_eq!(
        store.pinned_address("tale-11.json").await.unwrap(),
        Some(long_uri.address().to_string())
    );
}

#[tokio::test]
async fn test_local_backend_is_idempotent() {
    let dir = tempdir().unwrap();
    let config = ContentConfig {
        storage_backend: StorageBackend::Local,
        local_storage_path: dir.path().display().to_string(),
        ..Default::default()
    };
    let manager = manager_for(&config).await;

    let record = ContentRecord::new("same every time", 5).with_media(["bafyimg"]);
    let first = manager.upload_content(record.clone()).await.unwrap();
    let second = manager.upload_content(record).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_local_media_round_trip() {
    let dir = tempdir().unwrap();
    let config = ContentConfig {
        storage_backend: StorageBackend::Local,
        local_storage_path: dir.path().display().to_string(),
        ..Default::default()
    };
    let manager = manager_for(&config).await;

    let image = Bytes::from_static(b"GIF89a tiny");
    let uri = manager.upload_media(image.clone(), "image/gif").await.unwrap();
    assert_eq!(manager.retrieve_media(&uri.to_string()).await.unwrap(), image);

    let missing = manager.retrieve_media("deadbeef").await.unwrap_err();
    assert!(matches!(missing, ContentError::Retrieval { .. }));
}
