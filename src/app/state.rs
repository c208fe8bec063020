//! Workbench state - pure data structure with no I/O logic

use std::sync::Arc;

use crate::config::{ApiConfiguration, EntityConfig};
use crate::models::EndpointDescriptor;

/// A send approved by the workbench, ready for the request engine
#[derive(Clone, Debug, PartialEq)]
pub struct PendingSend {
    pub id: u64,
    pub endpoint: EndpointDescriptor,
    pub base_url: String,
    pub body: Option<String>,
}

/// Test-request workbench: which entity and endpoint are selected, the body
/// being edited and the last response shown.
#[derive(Debug)]
pub struct Workbench {
    pub configuration: Option<Arc<ApiConfiguration>>,
    pub selected_table: Option<String>,
    pub endpoints: Vec<EndpointDescriptor>,
    pub selected_endpoint: usize,

    // Request
    pub body: String,

    // Response
    pub response: String,
    pub is_loading: bool,
    pub next_request_id: u64,
    pub pending_request_id: Option<u64>,
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbench {
    pub fn new() -> Self {
        Workbench {
            configuration: None,
            selected_table: None,
            endpoints: Vec::new(),
            selected_endpoint: 0,
            body: String::new(),
            response: String::new(),
            is_loading: false,
            next_request_id: 1,
            pending_request_id: None,
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    pub fn selected_entity(&self) -> Option<&EntityConfig> {
        let table = self.selected_table.as_deref()?;
        self.configuration.as_ref()?.entity(table)
    }

    pub fn current_endpoint(&self) -> Option<&EndpointDescriptor> {
        self.endpoints.get(self.selected_endpoint)
    }

    /// `http://{host}:{port}{apiPrefix}` of the loaded configuration
    pub fn base_url(&self) -> Option<String> {
        self.configuration.as_ref().map(|config| config.base_url())
    }
}
