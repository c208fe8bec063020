//! Application constants
//!
//! Centralized location for magic strings, intervals and timeouts.

use std::time::Duration;

/// Default address of the control surface that manages the API server process
pub const DEFAULT_CONTROL_URL: &str = "http://127.0.0.1:7878";

/// Host used when a configuration does not name one
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Port used when a configuration does not name one
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Interval between periodic status checks
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Bound on a single status check
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on a start call
pub const START_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on a stop call
pub const STOP_TIMEOUT: Duration = Duration::from_secs(15);

/// Bound on a restart call
pub const RESTART_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on a single test request sent to a generated endpoint
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay before the status poll that confirms a control operation
pub const CONFIRM_POLL_DELAY: Duration = Duration::from_secs(1);

/// Minimum spacing between two applied metrics snapshots
pub const METRICS_MIN_SPACING: Duration = Duration::from_secs(1);

/// Number of most recent log lines fetched on each refresh
pub const DEFAULT_LOG_LIMIT: usize = 100;

/// Placeholder value used by the fallback sample payload
pub const SAMPLE_FIELD_PLACEHOLDER: &str = "sample value";

/// Application name
pub const APP_NAME: &str = "Ruster Console";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
