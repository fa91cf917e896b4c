//! Blocking HTTP client for the notesync service.

use log::debug;
use notesync_core::{Todo, TodoId, TodoStatus};
use notesync_server::{ArchiveResponse, CreateTodoRequest, ErrorBody, ErrorKind, HealthResponse};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_LENGTH;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client-side failure, keeping the service's error kind when there is one.
#[derive(Debug)]
pub enum ApiError {
    /// The service or its store could not be reached, including timeouts.
    StoreUnavailable(String),
    /// The service rolled back a bulk transition.
    TransitionFailure(String),
    /// Any other non-2xx answer.
    Rejected {
        status: u16,
        kind: Option<ErrorKind>,
        message: String,
    },
    /// The response could not be decoded.
    Decode(String),
    Http(reqwest::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StoreUnavailable(_) => "StoreUnavailable",
            Self::TransitionFailure(_) => "TransitionFailure",
            Self::Rejected { .. } => "Rejected",
            Self::Decode(_) => "Decode",
            Self::Http(_) => "Http",
        }
    }

    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::StoreUnavailable(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable(message) => write!(f, "service unavailable: {message}"),
            Self::TransitionFailure(message) => write!(f, "transition failed: {message}"),
            Self::Rejected {
                status, message, ..
            } => write!(f, "request rejected ({status}): {message}"),
            Self::Decode(message) => write!(f, "unexpected response: {message}"),
            Self::Http(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

/// Client for the notesync service.
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Http)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health(&self) -> Result<HealthResponse, ApiError> {
        self.send(self.client.get(self.url("/health")))
    }

    /// Archives every completed todo on the service.
    pub fn archive_completed_todos(&self) -> Result<ArchiveResponse, ApiError> {
        self.send(self.post_empty("/todos/archive-completed"))
    }

    pub fn create_todo(&self, content: impl Into<String>) -> Result<Todo, ApiError> {
        let request = CreateTodoRequest {
            content: content.into(),
        };
        self.send(self.client.post(self.url("/todos")).json(&request))
    }

    pub fn complete_todo(&self, id: TodoId) -> Result<Todo, ApiError> {
        self.send(self.post_empty(&format!("/todos/{id}/complete")))
    }

    pub fn list_todos(&self, status: Option<TodoStatus>) -> Result<Vec<Todo>, ApiError> {
        let path = match status {
            Some(status) => format!("/todos?status={status}"),
            None => "/todos".to_string(),
        };
        self.send(self.client.get(self.url(&path)))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post_empty(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path)).header(CONTENT_LENGTH, "0")
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().map_err(ApiError::from_transport)?;
        debug!(
            "event=api_call module=cli status={} url={}",
            response.status().as_u16(),
            response.url()
        );
        if response.status().is_success() {
            // A stalled body is a transport failure, not a decode failure.
            let body = response.bytes().map_err(ApiError::from_transport)?;
            serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
        } else {
            Err(error_from_response(response))
        }
    }
}

fn error_from_response(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let text = match response.text() {
        Ok(text) => text,
        Err(err) => return ApiError::from_transport(err),
    };

    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody {
            error,
            kind: ErrorKind::StoreUnavailable,
        }) => ApiError::StoreUnavailable(error),
        Ok(ErrorBody {
            error,
            kind: ErrorKind::TransitionFailure,
        }) => ApiError::TransitionFailure(error),
        Ok(ErrorBody { error, kind }) => ApiError::Rejected {
            status,
            kind: Some(kind),
            message: error,
        },
        Err(_) => ApiError::Rejected {
            status,
            kind: None,
            message: text,
        },
    }
}
