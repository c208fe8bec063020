//! Message types flowing between the front end and the monitor actor.

pub mod monitor;

pub use monitor::{MonitorCommand, TaskDone};
