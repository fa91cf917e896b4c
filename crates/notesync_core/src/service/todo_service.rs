//! Todo use-case service.
//!
//! # Responsibility
//! - Provide create/complete/get/list entry points for core callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - New todos always start `active`.
//! - Completion only moves `active -> completed`.
//! - Service layer remains storage-agnostic.

use crate::model::todo::{Todo, TodoId, TodoStatus};
use crate::repo::todo_repo::{RepoError, TodoListQuery, TodoRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for todo use-cases.
#[derive(Debug)]
pub enum TodoServiceError {
    /// Content is empty after trimming.
    EmptyContent,
    TodoNotFound(TodoId),
    InvalidTransition {
        id: TodoId,
        from: TodoStatus,
        to: TodoStatus,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl TodoServiceError {
    /// Returns whether the underlying store could not be reached.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Repo(RepoError::Db(db)) if db.is_unavailable())
    }
}

impl Display for TodoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "todo content must not be empty"),
            Self::TodoNotFound(id) => write!(f, "todo not found: {id}"),
            Self::InvalidTransition { id, from, to } => {
                write!(f, "todo {id} cannot move from `{from}` to `{to}`")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent todo state: {details}"),
        }
    }
}

impl Error for TodoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TodoServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TodoNotFound(id),
            RepoError::InvalidTransition { id, from, to } => {
                Self::InvalidTransition { id, from, to }
            }
            other => Self::Repo(other),
        }
    }
}

/// Todo service facade over repository implementations.
pub struct TodoService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one active todo and returns the stored record.
    pub fn create_todo(&self, content: impl Into<String>) -> Result<Todo, TodoServiceError> {
        let content = content.into().trim().to_string();
        if content.is_empty() {
            return Err(TodoServiceError::EmptyContent);
        }

        let todo = Todo::new(content);
        let id = self.repo.create_todo(&todo)?;
        self.repo
            .get_todo(id)?
            .ok_or(TodoServiceError::InconsistentState(
                "created todo not found in read-back",
            ))
    }

    /// Marks an active todo as completed.
    pub fn complete_todo(&self, id: TodoId) -> Result<Todo, TodoServiceError> {
        Ok(self.repo.transition_todo(id, TodoStatus::Completed)?)
    }

    pub fn get_todo(&self, id: TodoId) -> Result<Option<Todo>, TodoServiceError> {
        Ok(self.repo.get_todo(id)?)
    }

    pub fn list_todos(&self, query: &TodoListQuery) -> Result<Vec<Todo>, TodoServiceError> {
        Ok(self.repo.list_todos(query)?)
    }
}
