//! Server lifecycle monitoring.
//!
//! `LifecycleMonitor` does the work, `MonitorActor` decides when, and
//! `StateStore` publishes the resulting snapshots.

pub mod actor;
pub mod lifecycle;
pub mod schedule;
pub mod state;

pub use actor::{MonitorActor, MonitorHandle};
pub use lifecycle::{ControlOutcome, FetchOutcome, LifecycleMonitor, MonitorTimings};
pub use schedule::PollSchedule;
pub use state::{ConfigurationState, MonitorSnapshot, StateStore};
