// src/core/fetch.rs

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::core::error::{AuditError, AuditResult};

/// Classify a transport-level `reqwest` failure into the audit taxonomy.
fn classify(err: &reqwest::Error, timeout_ms: u64) -> AuditError {
    if err.is_timeout() {
        AuditError::Timeout(timeout_ms)
    } else if err.is_decode() {
        AuditError::Parse(err.to_string())
    } else {
        AuditError::Network(err.to_string())
    }
}

async fn send(
    client: &Client,
    url: &str,
    accept: Option<&str>,
    timeout_ms: u64,
) -> AuditResult<reqwest::Response> {
    let mut request = client
        .get(url)
        .timeout(Duration::from_millis(timeout_ms));
    if let Some(accept) = accept {
        request = request.header(reqwest::header::ACCEPT, accept);
    }
    // The per-request timeout covers connect, response and body read; the
    // underlying transport is aborted and the timer released on every exit
    // path when the future resolves or is dropped.
    let response = request.send().await.map_err(|e| classify(&e, timeout_ms))?;
    let status = response.status();
    if !status.is_success() {
        return Err(AuditError::Http(status.as_u16()));
    }
    Ok(response)
}

/// Issue a GET request bounded by `timeout_ms` and decode the JSON body.
pub async fn fetch_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    accept: Option<&str>,
    timeout_ms: u64,
) -> AuditResult<T> {
    let response = send(client, url, accept, timeout_ms).await?;
    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            AuditError::Timeout(timeout_ms)
        } else {
            AuditError::Parse(e.to_string())
        }
    })
}

/// Issue a GET request bounded by `timeout_ms` and return the body as text.
pub async fn fetch_text(client: &Client, url: &str, timeout_ms: u64) -> AuditResult<String> {
    let response = send(client, url, None, timeout_ms).await?;
    response
        .text()
        .await
        .map_err(|e| classify(&e, timeout_ms))
}
