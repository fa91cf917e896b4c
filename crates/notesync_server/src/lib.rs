//! HTTP surface for notesync.
//!
//! Exposes the core todo use-cases, most importantly
//! `POST /todos/archive-completed`, over a small blocking HTTP/1.1 server.

pub mod api;
pub mod config;
pub mod http;
pub mod server;
pub mod wire;

pub use api::{route_request, AppState};
pub use config::ServerConfig;
pub use server::{bind_server, serve, BoundServer, ServerError};
pub use wire::{ArchiveResponse, CreateTodoRequest, ErrorBody, ErrorKind, HealthResponse};
