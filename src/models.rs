use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// HTTP Method enum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
        }
    }

    /// Methods that carry the operator's body when a test request is sent.
    /// PATCH test requests go out without a body.
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::POST | HttpMethod::PUT)
    }

    /// Methods whose body editor gets pre-filled with a sample payload
    pub fn is_write(&self) -> bool {
        matches!(self, HttpMethod::POST | HttpMethod::PUT | HttpMethod::PATCH)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            "PATCH" => Ok(HttpMethod::PATCH),
            "DELETE" => Ok(HttpMethod::DELETE),
            other => Err(format!("Unknown HTTP method: {}", other)),
        }
    }
}

/// Credentials attached to calls against the control surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum AuthType {
    #[default]
    None,
    Bearer {
        token: String,
    },
    Basic {
        username: String,
        password: String,
    },
}

/// One testable route derived from an entity configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub path: String,
    pub method: HttpMethod,
    pub description: String,
}

impl EndpointDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>, description: impl Into<String>) -> Self {
        EndpointDescriptor {
            path: path.into(),
            method,
            description: description.into(),
        }
    }
}

/// A fully resolved test request, as handed to the transport
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestRequest {
    pub url: String,
    pub method: HttpMethod,
    pub body: Option<String>,
}

/// Lifecycle state of the managed API server process
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
    Restarting,
    Error,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Stopped => "stopped",
            ServerStatus::Starting => "starting",
            ServerStatus::Running => "running",
            ServerStatus::Stopping => "stopping",
            ServerStatus::Restarting => "restarting",
            ServerStatus::Error => "error",
        }
    }

    /// Optimistic states set while a control call is outstanding
    pub fn is_transitional(&self) -> bool {
        matches!(
            self,
            ServerStatus::Starting | ServerStatus::Stopping | ServerStatus::Restarting
        )
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control operations accepted by the managed server
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Start,
    Stop,
    Restart,
}

impl ControlAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::Start => "start",
            ControlAction::Stop => "stop",
            ControlAction::Restart => "restart",
        }
    }

    /// The optimistic state shown while this action is in flight
    pub fn intermediate_status(&self) -> ServerStatus {
        match self {
            ControlAction::Start => ServerStatus::Starting,
            ControlAction::Stop => ServerStatus::Stopping,
            ControlAction::Restart => ServerStatus::Restarting,
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time counters reported by the running server
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMetrics {
    pub uptime_seconds: u64,
    pub request_count: u64,
    pub error_count: u64,
    pub is_running: bool,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    pub current_time: DateTime<Utc>,
}

/// A single line of the server's log tail
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerLogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
}
