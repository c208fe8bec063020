//! # Ruster Console
//!
//! Operator console for a generated REST API server.
//!
//! ## Features
//! - Entity configuration editing (fields, endpoint flags, custom routes)
//! - Endpoint synthesis from entity configuration
//! - Sample JSON payloads for write endpoints
//! - Test requests with `{param}` path resolution
//! - Server lifecycle monitoring: status polling, start/stop/restart,
//!   metrics and logs
//! - cURL export
//!
//! ## Architecture
//! Actor-based with channels:
//! - Monitor actor (Tokio) - polling schedule and control calls
//! - Lifecycle monitor - publishes immutable snapshots over a watch channel
//! - Backend trait - the command surface, `HttpBackend` in production

pub mod app;
pub mod backend;
pub mod config;
pub mod constants;
pub mod curl;
pub mod error;
pub mod messages;
pub mod models;
pub mod monitor;
pub mod network;
pub mod settings;
pub mod synthesis;

// Re-export commonly used types
pub use app::Workbench;
pub use backend::Backend;
pub use config::{ApiConfiguration, ConfigSession, EntityConfig};
pub use curl::to_curl;
pub use error::{ConsoleError, Result};
pub use messages::MonitorCommand;
pub use models::{AuthType, ControlAction, EndpointDescriptor, HttpMethod, ServerStatus, TestRequest};
pub use monitor::{LifecycleMonitor, MonitorActor, MonitorHandle, MonitorSnapshot};
pub use network::HttpBackend;
pub use settings::Settings;
pub use synthesis::{sample_payload, synthesize_endpoints};
