//! Core domain logic for notesync.
//! This crate is the single source of truth for todo lifecycle invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::todo::{Todo, TodoId, TodoStatus, TodoValidationError};
pub use repo::todo_repo::{
    RepoError, RepoResult, SqliteTodoRepository, TodoListQuery, TodoRepository,
};
pub use service::archiver::{ArchiveError, ArchiveOutcome, Archiver};
pub use service::todo_service::{TodoService, TodoServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
