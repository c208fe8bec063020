//! Pure derivations from entity configuration: endpoints and sample bodies

pub mod endpoints;
pub mod payload;

pub use endpoints::synthesize_endpoints;
pub use payload::{sample_payload, sample_payload_at};
