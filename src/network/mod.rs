//! Network layer - HTTP transport and test-request execution
//!
//! `HttpBackend` talks to the control surface; the engine resolves path
//! parameters and sends test requests through any `Backend`.

pub mod client;
pub mod engine;
pub mod params;

pub use client::HttpBackend;
pub use engine::{format_response, prepare_request, send, send_for_display};
pub use params::{ParameterResolver, PromptResolver};
