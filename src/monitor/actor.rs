//! Monitor actor - drives polling, control calls and configuration fetches
//! on the Tokio runtime and publishes snapshots through a watch channel.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;

use crate::backend::Backend;
use crate::messages::{MonitorCommand, TaskDone};
use crate::models::ControlAction;
use crate::monitor::lifecycle::{ControlOutcome, LifecycleMonitor};
use crate::monitor::schedule::PollSchedule;
use crate::monitor::state::MonitorSnapshot;

pub struct MonitorActor<B: ?Sized> {
    monitor: Arc<LifecycleMonitor<B>>,
    schedule: PollSchedule,
    tasks: JoinSet<TaskDone>,
    polling: bool,
    poll_queued: bool,
}

impl<B> MonitorActor<B>
where
    B: Backend + ?Sized + 'static,
{
    pub fn new(monitor: Arc<LifecycleMonitor<B>>) -> Self {
        let schedule = PollSchedule::new(monitor.timings().poll_interval);
        MonitorActor {
            monitor,
            schedule,
            tasks: JoinSet::new(),
            polling: false,
            poll_queued: false,
        }
    }

    /// Spawns the actor on the current runtime
    pub fn spawn(monitor: Arc<LifecycleMonitor<B>>) -> (MonitorHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let handle = MonitorHandle {
            cmd_tx,
            state: monitor.subscribe(),
        };
        let actor = MonitorActor::new(monitor);
        (handle, tokio::spawn(actor.run(cmd_rx)))
    }

    /// Run the actor loop until `Shutdown` or every handle is dropped
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<MonitorCommand>) {
        tracing::info!("Monitor started");
        self.spawn_fetch(false);
        self.schedule.start(Instant::now());

        loop {
            let deadline = self.schedule.next_deadline();
            let wake = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(MonitorCommand::Shutdown) | None => break,
                        Some(cmd) => self.handle_command(cmd),
                    }
                }

                Some(done) = self.tasks.join_next() => {
                    match done {
                        Ok(done) => self.handle_done(done),
                        Err(e) => tracing::error!(error = %e, "Monitor task failed"),
                    }
                }

                _ = wake => {
                    if self.schedule.take_due(Instant::now()) {
                        self.request_poll();
                    }
                }
            }
        }

        self.tasks.shutdown().await;
        tracing::info!("Monitor stopped");
    }

    fn handle_command(&mut self, cmd: MonitorCommand) {
        match cmd {
            MonitorCommand::PollNow => self.request_poll(),
            MonitorCommand::Control(action) => self.spawn_control(action),
            MonitorCommand::FetchConfiguration => self.spawn_fetch(false),
            MonitorCommand::RefreshConfiguration => self.spawn_fetch(true),
            MonitorCommand::StartPolling => {
                if !self.schedule.is_running() {
                    self.schedule.start(Instant::now());
                }
            }
            MonitorCommand::StopPolling => self.schedule.stop(),
            MonitorCommand::Shutdown => {}
        }
    }

    fn handle_done(&mut self, done: TaskDone) {
        match done {
            TaskDone::Poll => {
                self.polling = false;
                if std::mem::take(&mut self.poll_queued) {
                    self.request_poll();
                }
            }
            TaskDone::Control { action, outcome } => {
                if let ControlOutcome::Settled { confirm_after, .. } = outcome {
                    tracing::debug!(%action, ?confirm_after, "Confirmation poll scheduled");
                    self.schedule
                        .schedule_confirmation(Instant::now(), confirm_after);
                }
            }
            TaskDone::Configuration(outcome) => {
                tracing::debug!(?outcome, "Configuration task finished");
            }
        }
    }

    /// Polls now, or right after the poll already running
    fn request_poll(&mut self) {
        if self.polling {
            self.poll_queued = true;
            return;
        }
        self.polling = true;
        let monitor = Arc::clone(&self.monitor);
        self.tasks.spawn(async move {
            monitor.poll().await;
            TaskDone::Poll
        });
    }

    fn spawn_control(&mut self, action: ControlAction) {
        let monitor = Arc::clone(&self.monitor);
        self.tasks.spawn(async move {
            let outcome = monitor.control(action).await;
            TaskDone::Control { action, outcome }
        });
    }

    fn spawn_fetch(&mut self, force: bool) {
        let monitor = Arc::clone(&self.monitor);
        self.tasks.spawn(async move {
            let outcome = if force {
                monitor.refresh_configuration().await
            } else {
                monitor.fetch_configuration().await
            };
            TaskDone::Configuration(outcome)
        });
    }
}

/// Cheap handle for talking to a running [`MonitorActor`]
#[derive(Clone)]
pub struct MonitorHandle {
    cmd_tx: mpsc::UnboundedSender<MonitorCommand>,
    state: watch::Receiver<Arc<MonitorSnapshot>>,
}

impl MonitorHandle {
    /// Returns false once the actor has stopped
    pub fn send(&self, cmd: MonitorCommand) -> bool {
        self.cmd_tx.send(cmd).is_ok()
    }

    pub fn start(&self) -> bool {
        self.send(MonitorCommand::Control(ControlAction::Start))
    }

    pub fn stop(&self) -> bool {
        self.send(MonitorCommand::Control(ControlAction::Stop))
    }

    pub fn restart(&self) -> bool {
        self.send(MonitorCommand::Control(ControlAction::Restart))
    }

    pub fn poll_now(&self) -> bool {
        self.send(MonitorCommand::PollNow)
    }

    pub fn refresh_configuration(&self) -> bool {
        self.send(MonitorCommand::RefreshConfiguration)
    }

    pub fn shutdown(&self) -> bool {
        self.send(MonitorCommand::Shutdown)
    }

    pub fn snapshot(&self) -> Arc<MonitorSnapshot> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<MonitorSnapshot>> {
        self.state.clone()
    }

    /// Waits for the first snapshot matching `pred`. `None` once the
    /// monitor is gone.
    pub async fn wait_until<F>(&self, mut pred: F) -> Option<Arc<MonitorSnapshot>>
    where
        F: FnMut(&MonitorSnapshot) -> bool,
    {
        let mut rx = self.state.clone();
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if pred(&snapshot) {
                return Some(snapshot);
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }
}
