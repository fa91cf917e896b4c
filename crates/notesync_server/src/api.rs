//! Request routing and use-case handlers.
//!
//! # Responsibility
//! - Map HTTP method + path onto core use-cases.
//! - Translate core errors into `{error, kind}` bodies with stable statuses.
//!
//! # Invariants
//! - Every request opens its own connection; nothing is cached across
//!   requests.
//! - Handlers never panic; every failure becomes a JSON error response.

use crate::http::{HttpRequest, HttpResponse};
use crate::wire::{ArchiveResponse, CreateTodoRequest, ErrorBody, ErrorKind, HealthResponse};
use log::warn;
use notesync_core::db::{open_db_with_options, DbOptions};
use notesync_core::{
    core_version, ArchiveError, Archiver, SqliteTodoRepository, TodoId, TodoListQuery,
    TodoService, TodoServiceError, TodoStatus,
};
use serde::Serialize;
use std::path::PathBuf;

/// Shared, read-only state handed to every request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db_path: PathBuf,
    pub db_options: DbOptions,
}

impl AppState {
    pub fn new(db_path: impl Into<PathBuf>, db_options: DbOptions) -> Self {
        Self {
            db_path: db_path.into(),
            db_options,
        }
    }
}

/// Dispatches one parsed request.
pub fn route_request(req: &HttpRequest, state: &AppState) -> HttpResponse {
    let path = req.path().trim_end_matches('/');
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let method = req.method.as_str();

    match segments.as_slice() {
        ["health"] => match method {
            "GET" => health(),
            _ => method_not_allowed(method, path),
        },
        ["todos"] => match method {
            "GET" => list_todos(req, state),
            "POST" => create_todo(req, state),
            _ => method_not_allowed(method, path),
        },
        ["todos", "archive-completed"] => match method {
            "POST" => archive_completed(state),
            _ => method_not_allowed(method, path),
        },
        ["todos", id] => match method {
            "GET" => with_todo_id(id, |id| get_todo(id, state)),
            _ => method_not_allowed(method, path),
        },
        ["todos", id, "complete"] => match method {
            "POST" => with_todo_id(id, |id| complete_todo(id, state)),
            _ => method_not_allowed(method, path),
        },
        _ => json_error(ErrorKind::NotFound, format!("no route for {path}")),
    }
}

fn health() -> HttpResponse {
    json_response(
        200,
        &HealthResponse {
            status: "ok".to_string(),
            version: core_version().to_string(),
        },
    )
}

fn archive_completed(state: &AppState) -> HttpResponse {
    with_repo(state, |repo| {
        match Archiver::new(repo).archive_completed_todos() {
            Ok(outcome) => json_response(
                200,
                &ArchiveResponse {
                    archived_count: outcome.archived_count,
                },
            ),
            Err(err) => archive_error_response(&err),
        }
    })
}

fn create_todo(req: &HttpRequest, state: &AppState) -> HttpResponse {
    let request: CreateTodoRequest = match serde_json::from_slice(&req.body) {
        Ok(request) => request,
        Err(err) => return json_error(ErrorKind::BadRequest, format!("invalid body: {err}")),
    };

    with_repo(state, |repo| {
        match TodoService::new(repo).create_todo(request.content) {
            Ok(todo) => json_response(201, &todo),
            Err(err) => service_error_response(&err),
        }
    })
}

fn complete_todo(id: TodoId, state: &AppState) -> HttpResponse {
    with_repo(state, |repo| match TodoService::new(repo).complete_todo(id) {
        Ok(todo) => json_response(200, &todo),
        Err(err) => service_error_response(&err),
    })
}

fn get_todo(id: TodoId, state: &AppState) -> HttpResponse {
    with_repo(state, |repo| match TodoService::new(repo).get_todo(id) {
        Ok(Some(todo)) => json_response(200, &todo),
        Ok(None) => json_error(ErrorKind::NotFound, format!("todo not found: {id}")),
        Err(err) => service_error_response(&err),
    })
}

fn list_todos(req: &HttpRequest, state: &AppState) -> HttpResponse {
    let query = match parse_list_query(req) {
        Ok(query) => query,
        Err(message) => return json_error(ErrorKind::BadRequest, message),
    };

    with_repo(state, |repo| match TodoService::new(repo).list_todos(&query) {
        Ok(todos) => json_response(200, &todos),
        Err(err) => service_error_response(&err),
    })
}

fn parse_list_query(req: &HttpRequest) -> Result<TodoListQuery, String> {
    let mut query = TodoListQuery::default();
    for (key, value) in req.query_pairs() {
        match key {
            "status" => {
                query.status = Some(
                    TodoStatus::parse(value)
                        .ok_or_else(|| format!("unknown status `{value}`"))?,
                );
            }
            "limit" => {
                query.limit = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid limit `{value}`"))?,
                );
            }
            "offset" => {
                query.offset = value
                    .parse()
                    .map_err(|_| format!("invalid offset `{value}`"))?;
            }
            other => return Err(format!("unknown query parameter `{other}`")),
        }
    }
    Ok(query)
}

fn with_todo_id(raw: &str, handler: impl FnOnce(TodoId) -> HttpResponse) -> HttpResponse {
    match TodoId::parse_str(raw) {
        Ok(id) => handler(id),
        Err(_) => json_error(ErrorKind::BadRequest, format!("invalid todo id `{raw}`")),
    }
}

/// Opens a migrated connection and hands a repository over it to `handler`.
fn with_repo(
    state: &AppState,
    handler: impl FnOnce(SqliteTodoRepository<'_>) -> HttpResponse,
) -> HttpResponse {
    let mut conn = match open_db_with_options(&state.db_path, &state.db_options) {
        Ok(conn) => conn,
        Err(err) => {
            warn!("event=store_open module=server status=error error={err}");
            return json_error(ErrorKind::StoreUnavailable, err.to_string());
        }
    };

    match SqliteTodoRepository::try_new(&mut conn) {
        Ok(repo) => handler(repo),
        Err(err) => json_error(ErrorKind::StoreUnavailable, err.to_string()),
    }
}

fn archive_error_response(err: &ArchiveError) -> HttpResponse {
    let kind = match err {
        ArchiveError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        ArchiveError::TransitionFailure(_) => ErrorKind::TransitionFailure,
    };
    json_error(kind, err.to_string())
}

fn service_error_response(err: &TodoServiceError) -> HttpResponse {
    let kind = match err {
        TodoServiceError::EmptyContent => ErrorKind::BadRequest,
        TodoServiceError::TodoNotFound(_) => ErrorKind::NotFound,
        TodoServiceError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
        err if err.is_store_unavailable() => ErrorKind::StoreUnavailable,
        TodoServiceError::Repo(_) | TodoServiceError::InconsistentState(_) => ErrorKind::Internal,
    };
    json_error(kind, err.to_string())
}

fn method_not_allowed(method: &str, path: &str) -> HttpResponse {
    json_error(
        ErrorKind::MethodNotAllowed,
        format!("{method} is not allowed on {path}"),
    )
}

/// Builds an error response whose status follows `kind`.
pub fn json_error(kind: ErrorKind, message: impl Into<String>) -> HttpResponse {
    json_response(
        kind.status(),
        &ErrorBody {
            error: message.into(),
            kind,
        },
    )
}

fn json_response(status: u16, value: &impl Serialize) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => HttpResponse {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        },
        Err(err) => HttpResponse {
            status: 500,
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: format!("failed to encode response: {err}").into_bytes(),
        },
    }
}
