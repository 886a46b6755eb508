//! Shared request plumbing for the API clients.

use crate::error::ClientError;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Request timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the underlying HTTP client.
pub(crate) fn build_client(timeout: Duration) -> Result<Client, ClientError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClientError::Configuration(e.to_string()))
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Send a request and return the raw response if it succeeded.
pub(crate) async fn send(endpoint: &str, request: RequestBuilder) -> Result<Response, ClientError> {
    let response = request
        .send()
        .await
        .map_err(|e| ClientError::transport(endpoint, &e))?;

    let status = response.status();
    if status.is_success() {
        tracing::debug!(endpoint, status = status.as_u16(), "Request succeeded");
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    tracing::warn!(endpoint, status = status.as_u16(), %body, "Request rejected");
    Err(ClientError::api(endpoint, status, body))
}

/// Send a request and decode a JSON success body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    endpoint: &str,
    request: RequestBuilder,
) -> Result<T, ClientError> {
    let response = send(endpoint, request).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ClientError::transport(endpoint, &e))?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

/// Send a request whose success body is ignored.
pub(crate) async fn send_empty(endpoint: &str, request: RequestBuilder) -> Result<(), ClientError> {
    send(endpoint, request).await.map(|_| ())
}
