//! Workbench commands - selection, body editing and send gating

use std::sync::Arc;

use crate::app::state::{PendingSend, Workbench};
use crate::config::ApiConfiguration;
use crate::models::ServerStatus;
use crate::synthesis::{sample_payload, synthesize_endpoints};

impl Workbench {
    // ========================
    // Configuration
    // ========================

    /// Installs a freshly loaded configuration. The current selection is
    /// kept when its table still exists.
    pub fn load_configuration(&mut self, config: Arc<ApiConfiguration>) {
        self.configuration = Some(config);
        match self.selected_table.clone() {
            Some(table) if self.selected_entity().is_some() => {
                let keep = self.selected_endpoint;
                self.select_entity(&table);
                if keep < self.endpoints.len() {
                    self.selected_endpoint = keep;
                }
            }
            _ => {
                self.selected_table = None;
                self.endpoints.clear();
                self.selected_endpoint = 0;
            }
        }
    }

    // ========================
    // Selection
    // ========================

    /// Selects an entity by table name; false when it is not configured
    pub fn select_entity(&mut self, table_name: &str) -> bool {
        let Some(entity) = self
            .configuration
            .as_ref()
            .and_then(|config| config.entity(table_name))
        else {
            tracing::debug!(table = table_name, "Unknown entity selected");
            return false;
        };

        self.endpoints = synthesize_endpoints(entity);
        self.selected_table = Some(table_name.to_string());
        self.selected_endpoint = 0;
        self.prefill_body();
        true
    }

    pub fn next_endpoint(&mut self) {
        if !self.endpoints.is_empty() {
            self.selected_endpoint = (self.selected_endpoint + 1) % self.endpoints.len();
            self.prefill_body();
        }
    }

    pub fn prev_endpoint(&mut self) {
        if !self.endpoints.is_empty() {
            self.selected_endpoint = self
                .selected_endpoint
                .checked_sub(1)
                .unwrap_or(self.endpoints.len() - 1);
            self.prefill_body();
        }
    }

    pub fn select_endpoint(&mut self, index: usize) -> bool {
        if index >= self.endpoints.len() {
            return false;
        }
        self.selected_endpoint = index;
        self.prefill_body();
        true
    }

    // ========================
    // Body
    // ========================

    pub fn edit_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    /// Fills an empty body with a sample payload when the selected endpoint
    /// writes. An edited body is never replaced.
    fn prefill_body(&mut self) {
        let writes = self
            .current_endpoint()
            .is_some_and(|endpoint| endpoint.method.is_write());
        if writes && self.body.trim().is_empty() {
            self.body = sample_payload(self.selected_entity());
        }
    }

    // ========================
    // Sending
    // ========================

    /// Sending is allowed only while the server runs and nothing is pending
    pub fn can_send(&self, status: ServerStatus) -> bool {
        status == ServerStatus::Running && !self.is_loading && self.current_endpoint().is_some()
    }

    /// Marks a send as pending and hands back what to send
    pub fn begin_send(&mut self, status: ServerStatus) -> Option<PendingSend> {
        if !self.can_send(status) {
            return None;
        }
        let endpoint = self.current_endpoint()?.clone();
        let base_url = self.base_url()?;
        let body = (!self.body.trim().is_empty()).then(|| self.body.clone());

        let id = self.next_id();
        self.is_loading = true;
        self.pending_request_id = Some(id);
        self.response.clear();

        Some(PendingSend {
            id,
            endpoint,
            base_url,
            body,
        })
    }

    /// Shows the response of send `id`. Responses for anything but the
    /// pending send are dropped.
    pub fn finish_send(&mut self, id: u64, text: String) -> bool {
        if self.pending_request_id != Some(id) {
            tracing::debug!(id, "Dropping response for stale request");
            return false;
        }
        self.pending_request_id = None;
        self.is_loading = false;
        self.response = text;
        true
    }
}
