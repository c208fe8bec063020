//! Lifecycle monitor - status polling, control operations and configuration
//! fetch for the managed API server.
//!
//! All state lives in a [`StateStore`]; every method reads a snapshot,
//! awaits at most one external call, then installs a replacement.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{timeout, Instant};

use crate::backend::{parse_status, Backend};
use crate::config::ApiConfiguration;
use crate::constants::{
    CONFIRM_POLL_DELAY, DEFAULT_LOG_LIMIT, METRICS_MIN_SPACING, REQUEST_TIMEOUT, RESTART_TIMEOUT,
    START_TIMEOUT, STATUS_POLL_INTERVAL, STATUS_TIMEOUT, STOP_TIMEOUT,
};
use crate::error::{ConsoleError, Result};
use crate::models::{ControlAction, ServerStatus};
use crate::monitor::state::{ConfigurationState, MonitorSnapshot, StateStore};

/// Intervals and bounds used by the monitor
#[derive(Clone, Debug, PartialEq)]
pub struct MonitorTimings {
    pub poll_interval: Duration,
    pub status_timeout: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
    pub restart_timeout: Duration,
    pub configuration_timeout: Duration,
    pub confirm_delay: Duration,
    pub metrics_min_spacing: Duration,
    pub log_limit: usize,
}

impl Default for MonitorTimings {
    fn default() -> Self {
        MonitorTimings {
            poll_interval: STATUS_POLL_INTERVAL,
            status_timeout: STATUS_TIMEOUT,
            start_timeout: START_TIMEOUT,
            stop_timeout: STOP_TIMEOUT,
            restart_timeout: RESTART_TIMEOUT,
            configuration_timeout: REQUEST_TIMEOUT,
            confirm_delay: CONFIRM_POLL_DELAY,
            metrics_min_spacing: METRICS_MIN_SPACING,
            log_limit: DEFAULT_LOG_LIMIT,
        }
    }
}

impl MonitorTimings {
    pub fn control_timeout(&self, action: ControlAction) -> Duration {
        match action {
            ControlAction::Start => self.start_timeout,
            ControlAction::Stop => self.stop_timeout,
            ControlAction::Restart => self.restart_timeout,
        }
    }
}

/// Result of a start/stop/restart request
#[derive(Clone, Debug, PartialEq)]
pub enum ControlOutcome {
    /// Same action already in flight; nothing was sent
    Coalesced,
    /// The call settled; a confirming poll is due after `confirm_after`
    Settled {
        result: Result<String>,
        confirm_after: Duration,
    },
}

/// Result of a configuration fetch request
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// A fetch is outstanding or the configuration is already loaded
    Skipped,
    Loaded(Arc<ApiConfiguration>),
    Failed(ConsoleError),
    /// A newer fetch started while this one was outstanding
    Superseded,
}

pub struct LifecycleMonitor<B: ?Sized> {
    backend: Arc<B>,
    store: StateStore,
    timings: MonitorTimings,
    control_epoch: AtomicU64,
    config_generation: AtomicU64,
}

impl<B> LifecycleMonitor<B>
where
    B: Backend + ?Sized,
{
    pub fn new(backend: Arc<B>, timings: MonitorTimings) -> Self {
        LifecycleMonitor {
            backend,
            store: StateStore::new(),
            timings,
            control_epoch: AtomicU64::new(0),
            config_generation: AtomicU64::new(0),
        }
    }

    pub fn timings(&self) -> &MonitorTimings {
        &self.timings
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn snapshot(&self) -> Arc<MonitorSnapshot> {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<Arc<MonitorSnapshot>> {
        self.store.subscribe()
    }

    // ========================
    // Polling
    // ========================

    /// One polling cycle: status check, then metrics and logs while running
    pub async fn poll(&self) -> ServerStatus {
        let status = self.poll_status().await;
        if status == ServerStatus::Running {
            self.refresh_running_views().await;
        }
        status
    }

    /// Checks the server status and installs it.
    ///
    /// The result is discarded while a control call is outstanding or when
    /// one started after this check was issued. Returns the status current
    /// after the check.
    pub async fn poll_status(&self) -> ServerStatus {
        let epoch = self.control_epoch.load(Ordering::SeqCst);
        let limit = self.timings.status_timeout;

        let (status, message) = match timeout(limit, self.backend.get_server_status()).await {
            Ok(Ok(report)) => parse_status(&report),
            Ok(Err(e)) => (ServerStatus::Error, Some(e.to_string())),
            Err(_) => (
                ServerStatus::Error,
                Some(format!("Status check timed out after {}s", limit.as_secs())),
            ),
        };

        let checked_at = Utc::now();
        let applied = self.store.replace(|current| {
            if !current.in_flight.is_empty()
                || self.control_epoch.load(Ordering::SeqCst) != epoch
            {
                return None;
            }
            Some(MonitorSnapshot {
                status,
                error_message: message.clone(),
                last_status_check: Some(checked_at),
                ..current.clone()
            })
        });

        let current = self.store.snapshot();
        if applied {
            match &current.error_message {
                Some(message) => tracing::warn!(status = %current.status, %message, "Status check"),
                None => tracing::debug!(status = %current.status, "Status check"),
            }
        } else {
            tracing::debug!(reported = %status, kept = %current.status, "Stale status check discarded");
        }
        current.status
    }

    /// Refreshes metrics and logs together
    pub async fn refresh_running_views(&self) {
        futures_util::future::join(self.refresh_metrics(), self.refresh_logs()).await;
    }

    /// Fetches a metrics snapshot and installs it unless the previous one is
    /// younger than the minimum spacing. Returns whether it was installed.
    pub async fn refresh_metrics(&self) -> bool {
        let spacing = self.timings.metrics_min_spacing;
        let too_soon = |applied_at: Option<Instant>| {
            applied_at.is_some_and(|at| Instant::now().saturating_duration_since(at) < spacing)
        };

        if too_soon(self.store.snapshot().metrics_applied_at) {
            tracing::trace!("Metrics refresh throttled");
            return false;
        }

        let metrics = match timeout(self.timings.status_timeout, self.backend.get_server_metrics()).await {
            Ok(Ok(metrics)) => metrics,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Metrics refresh failed");
                return false;
            }
            Err(_) => {
                tracing::warn!("Metrics refresh timed out");
                return false;
            }
        };

        self.store.replace(|current| {
            if too_soon(current.metrics_applied_at) {
                return None;
            }
            Some(MonitorSnapshot {
                metrics: Some(metrics),
                metrics_applied_at: Some(Instant::now()),
                ..current.clone()
            })
        })
    }

    /// Replaces the log view with the most recent entries
    pub async fn refresh_logs(&self) -> bool {
        let limit = self.timings.log_limit;
        match timeout(self.timings.status_timeout, self.backend.get_server_logs(limit)).await {
            Ok(Ok(entries)) => {
                let logs = Arc::new(entries);
                self.store.replace(|current| {
                    Some(MonitorSnapshot {
                        logs,
                        ..current.clone()
                    })
                })
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Log refresh failed");
                false
            }
            Err(_) => {
                tracing::warn!("Log refresh timed out");
                false
            }
        }
    }

    // ========================
    // Control operations
    // ========================

    pub async fn start(&self) -> ControlOutcome {
        self.control(ControlAction::Start).await
    }

    pub async fn stop(&self) -> ControlOutcome {
        self.control(ControlAction::Stop).await
    }

    pub async fn restart(&self) -> ControlOutcome {
        self.control(ControlAction::Restart).await
    }

    /// Sets the optimistic state, awaits the control call, and on failure
    /// moves to `Error`. The caller schedules the confirming poll.
    pub async fn control(&self, action: ControlAction) -> ControlOutcome {
        let accepted = self.store.replace(|current| {
            if current.in_flight.contains(&action) {
                return None;
            }
            let mut in_flight = current.in_flight.clone();
            in_flight.push(action);
            Some(MonitorSnapshot {
                status: action.intermediate_status(),
                error_message: None,
                in_flight,
                ..current.clone()
            })
        });

        if !accepted {
            tracing::debug!(%action, "Control request coalesced with one in flight");
            return ControlOutcome::Coalesced;
        }
        self.control_epoch.fetch_add(1, Ordering::SeqCst);
        tracing::info!(%action, "Control request sent");

        let limit = self.timings.control_timeout(action);
        let result = match timeout(limit, self.backend.control(action)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(match e {
                ConsoleError::ServerControlFailure { .. } | ConsoleError::Connection(_) => e,
                other => ConsoleError::ServerControlFailure {
                    action,
                    message: other.details(),
                },
            }),
            Err(_) => Err(ConsoleError::Connection(format!(
                "Server {} timed out after {}s",
                action,
                limit.as_secs()
            ))),
        };

        let failure = result.as_ref().err().map(ToString::to_string);
        self.store.replace(|current| {
            let mut in_flight = current.in_flight.clone();
            if let Some(pos) = in_flight.iter().position(|a| *a == action) {
                in_flight.remove(pos);
            }
            let next = match &failure {
                Some(message) => MonitorSnapshot {
                    status: ServerStatus::Error,
                    error_message: Some(message.clone()),
                    in_flight,
                    ..current.clone()
                },
                None => MonitorSnapshot {
                    in_flight,
                    ..current.clone()
                },
            };
            Some(next)
        });

        match &result {
            Ok(reply) => tracing::info!(%action, reply = %reply.trim(), "Control request accepted"),
            Err(e) => tracing::error!(%action, error = %e, "Control request failed"),
        }

        ControlOutcome::Settled {
            result,
            confirm_after: self.timings.confirm_delay,
        }
    }

    /// Control operation followed by its confirming poll, for callers that
    /// do not run the scheduling actor
    pub async fn control_and_confirm(&self, action: ControlAction) -> ControlOutcome {
        let outcome = self.control(action).await;
        if let ControlOutcome::Settled { confirm_after, .. } = &outcome {
            tokio::time::sleep(*confirm_after).await;
            self.poll().await;
        }
        outcome
    }

    // ========================
    // Configuration
    // ========================

    /// Fetches the configuration unless a fetch is outstanding or it is
    /// already loaded. A second request while one is in flight is dropped.
    pub async fn fetch_configuration(&self) -> FetchOutcome {
        let accepted = self.store.replace(|current| match current.configuration {
            ConfigurationState::Loading | ConfigurationState::Loaded(_) => None,
            _ => Some(MonitorSnapshot {
                configuration: ConfigurationState::Loading,
                ..current.clone()
            }),
        });

        if !accepted {
            tracing::debug!("Configuration fetch skipped, already loading or loaded");
            return FetchOutcome::Skipped;
        }

        let generation = self.config_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.load_configuration(generation).await
    }

    /// Resets the fetch guard and fetches again
    pub async fn refresh_configuration(&self) -> FetchOutcome {
        let generation = self.config_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.store.replace(|current| {
            Some(MonitorSnapshot {
                configuration: ConfigurationState::Loading,
                ..current.clone()
            })
        });
        tracing::info!(generation, "Configuration refresh requested");
        self.load_configuration(generation).await
    }

    async fn load_configuration(&self, generation: u64) -> FetchOutcome {
        let limit = self.timings.configuration_timeout;
        let result = match timeout(limit, self.backend.get_current_configuration()).await {
            Ok(Ok(config)) => Ok(Arc::new(config)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ConsoleError::Connection(format!(
                "Configuration fetch timed out after {}s",
                limit.as_secs()
            ))),
        };

        if self.config_generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "Configuration fetch superseded");
            return FetchOutcome::Superseded;
        }

        let state = match &result {
            Ok(config) => ConfigurationState::Loaded(Arc::clone(config)),
            Err(e) => ConfigurationState::Failed(e.to_string()),
        };
        self.store.replace(|current| {
            Some(MonitorSnapshot {
                configuration: state,
                ..current.clone()
            })
        });

        match result {
            Ok(config) => {
                for entity in &config.entities_basic {
                    if let Err(e) = entity.validate() {
                        tracing::warn!(entity = %entity.table_name, error = %e, "Entity configuration issue");
                    }
                }
                tracing::info!(entities = config.entities_basic.len(), "Configuration loaded");
                FetchOutcome::Loaded(config)
            }
            Err(e) => {
                tracing::error!(error = %e, "Configuration fetch failed");
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Asks the backend to test its database connection
    pub async fn check_database(&self) -> Result<String> {
        let limit = self.timings.status_timeout;
        match timeout(limit, self.backend.test_database_connection()).await {
            Ok(result) => result,
            Err(_) => Err(ConsoleError::Connection(format!(
                "Database check timed out after {}s",
                limit.as_secs()
            ))),
        }
    }
}
