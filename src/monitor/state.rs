//! Monitor state - immutable snapshots behind a replace-only store

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::ApiConfiguration;
use crate::models::{ControlAction, ServerLogEntry, ServerMetrics, ServerStatus};

/// Whether the entity configuration has been fetched yet.
///
/// Kept apart from `ServerStatus` so "nothing loaded yet" never reads as
/// `stopped`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ConfigurationState {
    #[default]
    NotLoaded,
    Loading,
    Loaded(Arc<ApiConfiguration>),
    Failed(String),
}

impl ConfigurationState {
    pub fn configuration(&self) -> Option<&Arc<ApiConfiguration>> {
        match self {
            ConfigurationState::Loaded(config) => Some(config),
            _ => None,
        }
    }
}

/// Everything the monitor knows at one point in time
#[derive(Clone, Debug, Default)]
pub struct MonitorSnapshot {
    pub status: ServerStatus,
    /// Message kept while `status` is `Error`
    pub error_message: Option<String>,
    /// Control calls currently outstanding, oldest first
    pub in_flight: Vec<ControlAction>,
    pub metrics: Option<ServerMetrics>,
    pub metrics_applied_at: Option<Instant>,
    pub logs: Arc<Vec<ServerLogEntry>>,
    /// `None` until the first status check has settled
    pub last_status_check: Option<DateTime<Utc>>,
    pub configuration: ConfigurationState,
    /// Bumped on every replacement
    pub revision: u64,
}

impl MonitorSnapshot {
    pub fn is_running(&self) -> bool {
        self.status == ServerStatus::Running
    }

    pub fn has_polled(&self) -> bool {
        self.last_status_check.is_some()
    }

    /// One-line summary for status bars and logs
    pub fn describe(&self) -> String {
        match (&self.status, &self.error_message) {
            (ServerStatus::Error, Some(message)) => format!("error: {}", message),
            (status, _) if !self.has_polled() && !status.is_transitional() => {
                format!("{} (not checked yet)", status)
            }
            (status, _) => status.to_string(),
        }
    }
}

/// Owner of the current snapshot.
///
/// Updates always install a fresh `Arc`, so a snapshot handed out earlier
/// never changes under its holder.
pub struct StateStore {
    tx: watch::Sender<Arc<MonitorSnapshot>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(MonitorSnapshot::default()));
        StateStore { tx }
    }

    pub fn snapshot(&self) -> Arc<MonitorSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<MonitorSnapshot>> {
        self.tx.subscribe()
    }

    /// Builds the next snapshot from the current one. Returning `None`
    /// keeps the current snapshot; the check and the swap are atomic.
    pub fn replace<F>(&self, update: F) -> bool
    where
        F: FnOnce(&MonitorSnapshot) -> Option<MonitorSnapshot>,
    {
        self.tx.send_if_modified(|current| match update(current) {
            Some(mut next) => {
                next.revision = current.revision + 1;
                *current = Arc::new(next);
                true
            }
            None => false,
        })
    }
}
