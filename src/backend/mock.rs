//! Scriptable in-process backend for tests

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use crate::backend::Backend;
use crate::config::ApiConfiguration;
use crate::error::{ConsoleError, Result};
use crate::models::{ServerLogEntry, ServerMetrics, TestRequest};

pub(crate) struct MockBackend {
    pub status: Mutex<Result<String>>,
    pub metrics: Mutex<Result<ServerMetrics>>,
    pub logs: Mutex<Result<Vec<ServerLogEntry>>>,
    pub control_reply: Mutex<Result<String>>,
    pub configuration: Mutex<Result<ApiConfiguration>>,
    pub endpoint_reply: Mutex<Result<String>>,
    pub database_reply: Mutex<Result<String>>,
    /// Calls listed here never answer
    pub hang: Mutex<HashSet<&'static str>>,
    /// Calls listed here wait for a `release` before answering
    gates: Mutex<HashMap<&'static str, Arc<Notify>>>,
    calls: Mutex<Vec<&'static str>>,
    pub requests: Mutex<Vec<TestRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend {
            status: Mutex::new(Ok("stopped".into())),
            metrics: Mutex::new(Ok(sample_metrics(1))),
            logs: Mutex::new(Ok(Vec::new())),
            control_reply: Mutex::new(Ok("ok".into())),
            configuration: Mutex::new(Ok(ApiConfiguration::default())),
            endpoint_reply: Mutex::new(Ok("{}".into())),
            database_reply: Mutex::new(Ok("Connection successful".into())),
            hang: Mutex::new(HashSet::new()),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_status(&self, report: &str) {
        *self.status.lock().unwrap() = Ok(report.to_string());
    }

    pub fn hang_on(&self, call: &'static str) {
        self.hang.lock().unwrap().insert(call);
    }

    /// Makes `call` block until [`MockBackend::release`] is called
    pub fn gate(&self, call: &'static str) {
        self.gates
            .lock()
            .unwrap()
            .insert(call, Arc::new(Notify::new()));
    }

    pub fn release(&self, call: &'static str) {
        if let Some(gate) = self.gates.lock().unwrap().remove(call) {
            gate.notify_one();
        }
    }

    pub fn calls(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    pub fn call_log(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
        let hangs = self.hang.lock().unwrap().contains(call);
        if hangs {
            std::future::pending::<()>().await;
        }
        let gate = self.gates.lock().unwrap().get(call).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

pub(crate) fn sample_metrics(request_count: u64) -> ServerMetrics {
    ServerMetrics {
        uptime_seconds: 10,
        request_count,
        error_count: 0,
        is_running: true,
        start_time: Some(Utc::now()),
        current_time: Utc::now(),
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn get_current_configuration(&self) -> Result<ApiConfiguration> {
        self.enter("configuration").await;
        self.configuration.lock().unwrap().clone()
    }

    async fn get_server_status(&self) -> Result<String> {
        self.enter("status").await;
        self.status.lock().unwrap().clone()
    }

    async fn get_server_metrics(&self) -> Result<ServerMetrics> {
        self.enter("metrics").await;
        self.metrics.lock().unwrap().clone()
    }

    async fn get_server_logs(&self, limit: usize) -> Result<Vec<ServerLogEntry>> {
        self.enter("logs").await;
        self.logs
            .lock()
            .unwrap()
            .clone()
            .map(|logs| logs.into_iter().take(limit).collect())
    }

    async fn start_server(&self) -> Result<String> {
        self.enter("start").await;
        self.control_reply.lock().unwrap().clone()
    }

    async fn stop_server(&self) -> Result<String> {
        self.enter("stop").await;
        self.control_reply.lock().unwrap().clone()
    }

    async fn restart_server(&self) -> Result<String> {
        self.enter("restart").await;
        self.control_reply.lock().unwrap().clone()
    }

    async fn test_endpoint(&self, request: &TestRequest) -> Result<String> {
        self.enter("test_endpoint").await;
        self.requests.lock().unwrap().push(request.clone());
        self.endpoint_reply.lock().unwrap().clone()
    }

    async fn test_database_connection(&self) -> Result<String> {
        self.enter("database").await;
        self.database_reply
            .lock()
            .unwrap()
            .clone()
            .map_err(|e| ConsoleError::Connection(e.details()))
    }
}
