//! Request execution: placeholder resolution, body policy, transport call
//! and response normalisation.

use std::time::Instant;

use crate::backend::Backend;
use crate::error::{ConsoleError, Result};
use crate::models::{EndpointDescriptor, TestRequest};
use crate::network::params::{resolve_placeholders, ParameterResolver};

/// Builds the request that would be sent, without sending it.
///
/// Fails with `MissingParameter` when a placeholder cannot be resolved.
pub fn prepare_request(
    endpoint: &EndpointDescriptor,
    base_url: &str,
    body: Option<&str>,
    resolver: &dyn ParameterResolver,
) -> Result<TestRequest> {
    let template = format!("{}{}", base_url.trim_end_matches('/'), endpoint.path);
    let url = resolve_placeholders(&template, resolver)?;

    let body = if endpoint.method.carries_body() {
        body.map(str::to_string)
    } else {
        None
    };

    Ok(TestRequest {
        url,
        method: endpoint.method,
        body,
    })
}

/// Sends a test request and returns the display text of the response.
///
/// A missing parameter fails before any call is made. Transport failures
/// come back as `RequestFailure` / `Connection`; nothing is retried.
pub async fn send<B>(
    backend: &B,
    endpoint: &EndpointDescriptor,
    base_url: &str,
    body: Option<&str>,
    resolver: &dyn ParameterResolver,
) -> Result<String>
where
    B: Backend + ?Sized,
{
    let request = prepare_request(endpoint, base_url, body, resolver)?;

    let start = Instant::now();
    tracing::info!(url = %request.url, method = %request.method, "Sending test request");

    match backend.test_endpoint(&request).await {
        Ok(raw) => {
            tracing::info!(
                url = %request.url,
                elapsed_ms = start.elapsed().as_millis() as u64,
                bytes = raw.len(),
                "Test request completed"
            );
            Ok(format_response(raw))
        }
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "Test request failed");
            Err(match e {
                ConsoleError::Connection(_) | ConsoleError::RequestFailure(_) => e,
                other => ConsoleError::RequestFailure(other.to_string()),
            })
        }
    }
}

/// Like [`send`] but never fails: errors become a `{error, details}` block
pub async fn send_for_display<B>(
    backend: &B,
    endpoint: &EndpointDescriptor,
    base_url: &str,
    body: Option<&str>,
    resolver: &dyn ParameterResolver,
) -> String
where
    B: Backend + ?Sized,
{
    match send(backend, endpoint, base_url, body, resolver).await {
        Ok(text) => text,
        Err(e) => e.error_block(),
    }
}

/// Pretty-prints JSON bodies, passes anything else through unchanged
pub fn format_response(raw: String) -> String {
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or(raw),
        Err(_) => raw,
    }
}
