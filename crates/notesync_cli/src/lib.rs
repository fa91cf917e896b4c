//! Command-line client for the notesync service.

pub mod api_client;
pub mod args;
pub mod commands;

pub use api_client::{ApiClient, ApiError};
