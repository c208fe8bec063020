//! Command surface of the process that owns the generated API server.
//!
//! Every method is a remote call with latency and failure modes; callers
//! bound them with timeouts. `HttpBackend` in `network::client` is the
//! production implementation.

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;

use crate::config::ApiConfiguration;
use crate::error::Result;
use crate::models::{ControlAction, ServerLogEntry, ServerMetrics, ServerStatus, TestRequest};

#[async_trait]
pub trait Backend: Send + Sync {
    /// Entities, server address and API prefix currently configured
    async fn get_current_configuration(&self) -> Result<ApiConfiguration>;

    /// Raw status report, see [`parse_status`]
    async fn get_server_status(&self) -> Result<String>;

    async fn get_server_metrics(&self) -> Result<ServerMetrics>;

    /// Most recent `limit` log lines
    async fn get_server_logs(&self, limit: usize) -> Result<Vec<ServerLogEntry>>;

    async fn start_server(&self) -> Result<String>;

    async fn stop_server(&self) -> Result<String>;

    async fn restart_server(&self) -> Result<String>;

    /// Sends a test request and returns the raw response body
    async fn test_endpoint(&self, request: &TestRequest) -> Result<String>;

    async fn test_database_connection(&self) -> Result<String>;

    async fn control(&self, action: ControlAction) -> Result<String> {
        match action {
            ControlAction::Start => self.start_server().await,
            ControlAction::Stop => self.stop_server().await,
            ControlAction::Restart => self.restart_server().await,
        }
    }
}

/// Interprets a status report.
///
/// `error:<message>` yields `Error` with the trimmed message; unknown
/// reports are treated as errors too.
pub fn parse_status(report: &str) -> (ServerStatus, Option<String>) {
    let trimmed = report.trim();
    let lowered = trimmed.to_lowercase();

    let status = match lowered.as_str() {
        "running" => ServerStatus::Running,
        "stopped" => ServerStatus::Stopped,
        "starting" => ServerStatus::Starting,
        "stopping" => ServerStatus::Stopping,
        "restarting" => ServerStatus::Restarting,
        _ if lowered.starts_with("error") => {
            let message = trimmed
                .get("error".len()..)
                .unwrap_or("")
                .trim_start()
                .trim_start_matches(':')
                .trim();
            let message = if message.is_empty() {
                String::from("unknown error")
            } else {
                message.to_string()
            };
            return (ServerStatus::Error, Some(message));
        }
        _ => {
            return (
                ServerStatus::Error,
                Some(format!("unrecognized status '{}'", trimmed)),
            )
        }
    };

    (status, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_states() {
        assert_eq!(parse_status("running"), (ServerStatus::Running, None));
        assert_eq!(parse_status(" Stopped\n"), (ServerStatus::Stopped, None));
        assert_eq!(parse_status("starting"), (ServerStatus::Starting, None));
    }

    #[test]
    fn test_parse_error_message() {
        assert_eq!(
            parse_status("error: db unreachable"),
            (ServerStatus::Error, Some("db unreachable".to_string()))
        );
        assert_eq!(
            parse_status("error:port 8080 in use"),
            (ServerStatus::Error, Some("port 8080 in use".to_string()))
        );
        assert_eq!(
            parse_status("error"),
            (ServerStatus::Error, Some("unknown error".to_string()))
        );
    }

    #[test]
    fn test_parse_unknown_report() {
        let (status, message) = parse_status("sleeping");
        assert_eq!(status, ServerStatus::Error);
        assert_eq!(message.unwrap(), "unrecognized status 'sleeping'");
    }
}
