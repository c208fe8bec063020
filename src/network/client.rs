//! HTTP client for the control surface and for test requests

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::de::DeserializeOwned;

use crate::backend::Backend;
use crate::config::ApiConfiguration;
use crate::error::{ConsoleError, Result};
use crate::models::{
    AuthType, ControlAction, HttpMethod, ServerLogEntry, ServerMetrics, TestRequest,
};

/// `Backend` speaking JSON over HTTP to the control daemon.
///
/// Control routes live under `control_url`; test requests go straight to
/// the generated server with the same client.
pub struct HttpBackend {
    client: reqwest::Client,
    control_url: String,
    auth: AuthType,
}

impl HttpBackend {
    pub fn new(control_url: impl Into<String>, auth: AuthType, timeout: Duration) -> Self {
        let control_url = control_url.into().trim_end_matches('/').to_string();
        HttpBackend {
            client: create_client(timeout),
            control_url,
            auth,
        }
    }

    pub fn control_url(&self) -> &str {
        &self.control_url
    }

    fn control_request(&self, method: reqwest::Method, route: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.control_url, route);
        let builder = self.client.request(method, url);
        apply_auth(builder, &self.auth)
    }

    async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<T> {
        let resp = self
            .control_request(reqwest::Method::GET, route)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(map_send_error)?;
        if !status.is_success() {
            return Err(ConsoleError::RequestFailure(format!(
                "{} returned {}: {}",
                route,
                status.as_u16(),
                body.trim()
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ConsoleError::RequestFailure(format!("Invalid response from {}: {}", route, e))
        })
    }

    async fn get_text(&self, route: &str) -> Result<String> {
        let resp = self
            .control_request(reqwest::Method::GET, route)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(map_send_error)?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ConsoleError::RequestFailure(format!(
                "{} returned {}: {}",
                route,
                status.as_u16(),
                body.trim()
            )))
        }
    }

    async fn post_control(&self, action: ControlAction) -> Result<String> {
        let route = format!("/server/{}", action.as_str());
        let resp = self
            .control_request(reqwest::Method::POST, &route)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(map_send_error)?;
        if status.is_success() {
            Ok(body)
        } else {
            let message = if body.trim().is_empty() {
                format!("control surface returned {}", status.as_u16())
            } else {
                body.trim().to_string()
            };
            Err(ConsoleError::ServerControlFailure { action, message })
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get_current_configuration(&self) -> Result<ApiConfiguration> {
        self.get_json("/configuration").await
    }

    async fn get_server_status(&self) -> Result<String> {
        self.get_text("/server/status").await
    }

    async fn get_server_metrics(&self) -> Result<ServerMetrics> {
        self.get_json("/server/metrics").await
    }

    async fn get_server_logs(&self, limit: usize) -> Result<Vec<ServerLogEntry>> {
        self.get_json(&format!("/server/logs?limit={}", limit)).await
    }

    async fn start_server(&self) -> Result<String> {
        self.post_control(ControlAction::Start).await
    }

    async fn stop_server(&self) -> Result<String> {
        self.post_control(ControlAction::Stop).await
    }

    async fn restart_server(&self) -> Result<String> {
        self.post_control(ControlAction::Restart).await
    }

    async fn test_endpoint(&self, request: &TestRequest) -> Result<String> {
        let resp = build_request(&self.client, request)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = resp.status().as_u16();
        tracing::debug!(status, url = %request.url, "Test request answered");

        resp.text()
            .await
            .map_err(|e| ConsoleError::RequestFailure(format!("Error reading body: {}", e)))
    }

    async fn test_database_connection(&self) -> Result<String> {
        let resp = self
            .control_request(reqwest::Method::POST, "/database/test")
            .send()
            .await
            .map_err(map_send_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(map_send_error)?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ConsoleError::Connection(format!(
                "Database check failed: {}",
                body.trim()
            )))
        }
    }
}

/// Build a test request for the generated server
fn build_request(client: &reqwest::Client, request: &TestRequest) -> reqwest::RequestBuilder {
    let mut req_builder = match request.method {
        HttpMethod::GET => client.get(&request.url),
        HttpMethod::POST => client.post(&request.url),
        HttpMethod::PUT => client.put(&request.url),
        HttpMethod::PATCH => client.patch(&request.url),
        HttpMethod::DELETE => client.delete(&request.url),
    };

    req_builder = req_builder.header("Accept", "application/json");

    if let Some(body) = &request.body {
        req_builder = req_builder
            .header("Content-Type", "application/json")
            .body(body.clone());
    }

    req_builder
}

fn apply_auth(builder: reqwest::RequestBuilder, auth: &AuthType) -> reqwest::RequestBuilder {
    match auth {
        AuthType::Bearer { token } => builder.header("Authorization", format!("Bearer {}", token)),
        AuthType::Basic { username, password } => {
            let credentials = format!("{}:{}", username, password);
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
            builder.header("Authorization", format!("Basic {}", encoded))
        }
        AuthType::None => builder,
    }
}

fn map_send_error(e: reqwest::Error) -> ConsoleError {
    if e.is_timeout() {
        ConsoleError::Connection(format!("Request timed out: {}", e))
    } else if e.is_connect() {
        ConsoleError::Connection(format!("Connection failed: {}", e))
    } else {
        ConsoleError::RequestFailure(e.to_string())
    }
}

/// Create an HTTP client with the given request timeout
pub fn create_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(builder: reqwest::RequestBuilder, name: &str) -> Option<String> {
        let request = builder.build().unwrap();
        request
            .headers()
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_basic_auth_header() {
        let client = reqwest::Client::new();
        let auth = AuthType::Basic {
            username: "admin".into(),
            password: "secret".into(),
        };
        let builder = apply_auth(client.get("http://localhost/server/status"), &auth);
        assert_eq!(
            header(builder, "Authorization").as_deref(),
            Some("Basic YWRtaW46c2VjcmV0")
        );
    }

    #[test]
    fn test_body_only_when_present() {
        let client = reqwest::Client::new();
        let with_body = TestRequest {
            url: "http://localhost:8080/users".into(),
            method: HttpMethod::POST,
            body: Some("{\"age\": 0}".into()),
        };
        let request = build_request(&client, &with_body).build().unwrap();
        assert_eq!(request.method(), &reqwest::Method::POST);
        assert!(request.body().is_some());

        let without_body = TestRequest {
            body: None,
            method: HttpMethod::GET,
            ..with_body
        };
        let request = build_request(&client, &without_body).build().unwrap();
        assert!(request.body().is_none());
        assert!(request.headers().get("Content-Type").is_none());
    }

    #[test]
    fn test_control_url_is_normalised() {
        let backend = HttpBackend::new("http://127.0.0.1:7878/", AuthType::None, Duration::from_secs(1));
        assert_eq!(backend.control_url(), "http://127.0.0.1:7878");
    }
}
