//! App layer - test-request workbench state and the commands that edit it

pub mod commands;
pub mod state;

pub use state::{PendingSend, Workbench};
