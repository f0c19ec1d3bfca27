//! Shared HTTP plumbing for the remote backends.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::{StorageError, StorageResult};

/// Build the single HTTP client shared by every remote backend.
pub fn build_http_client(timeout: Duration) -> StorageResult<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!("tales-storage/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| StorageError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Pass successful responses through; turn anything else into
/// `StorageError::Http` carrying the response body.
pub(crate) async fn ensure_success(response: Response) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(StorageError::Http {
        status: status.as_u16(),
        body,
    })
}
