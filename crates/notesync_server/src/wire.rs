//! JSON bodies exchanged between the service and its clients.

use serde::{Deserialize, Serialize};

/// Body of a successful `POST /todos/archive-completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveResponse {
    pub archived_count: usize,
}

/// Body of `POST /todos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    pub content: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Machine-readable failure category carried by every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    StoreUnavailable,
    TransitionFailure,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    InvalidTransition,
    PayloadTooLarge,
    Internal,
}

impl ErrorKind {
    /// HTTP status paired with this kind.
    pub fn status(self) -> u16 {
        match self {
            Self::StoreUnavailable => 503,
            Self::TransitionFailure | Self::Internal => 500,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::InvalidTransition => 409,
            Self::PayloadTooLarge => 413,
        }
    }
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}
