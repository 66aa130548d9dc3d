//! Shared HTTP plumbing for the provider clients.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tubedigest_common::{Error, Result};

/// Longest response body excerpt carried in an error message.
const BODY_EXCERPT: usize = 512;

/// Build a client with a request timeout.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))
}

/// Map a transport failure to [`Error::External`].
pub(crate) fn transport(service: &str, err: reqwest::Error) -> Error {
    Error::external(service, format!("request failed: {err}"))
}

/// Pass 2xx responses through, turn anything else into [`Error::External`]
/// carrying the status code and the start of the body.
pub(crate) async fn ensure_success(
    service: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(Error::external(service, describe_failure(status, &body)))
}

/// Read the body and deserialize it, mapping bad payloads to [`Error::Format`].
pub(crate) async fn decode<T: DeserializeOwned>(service: &str, resp: reqwest::Response) -> Result<T> {
    let bytes = resp.bytes().await.map_err(|e| transport(service, e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::format(format!("unexpected {service} response: {e}")))
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {status}");
    }
    let excerpt: String = body.chars().take(BODY_EXCERPT).collect();
    format!("HTTP {status}: {excerpt}")
}

/// Parse a `Retry-After` header given in whole seconds.
pub(crate) fn retry_after(resp: &reqwest::Response) -> Option<u64> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
