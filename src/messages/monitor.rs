//! Monitor messages - communication between front ends and the monitor actor

use crate::models::ControlAction;
use crate::monitor::lifecycle::{ControlOutcome, FetchOutcome};

/// Commands sent to the monitor actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Poll status now, outside the periodic schedule
    PollNow,
    Control(ControlAction),
    /// Fetch the configuration unless already loading or loaded
    FetchConfiguration,
    /// Fetch the configuration again regardless of its state
    RefreshConfiguration,
    /// Resume periodic polling
    StartPolling,
    /// Pause periodic polling
    StopPolling,
    Shutdown,
}

/// Completion reports from tasks spawned by the actor
#[derive(Debug, Clone)]
pub enum TaskDone {
    Poll,
    Control {
        action: ControlAction,
        outcome: ControlOutcome,
    },
    Configuration(FetchOutcome),
}
