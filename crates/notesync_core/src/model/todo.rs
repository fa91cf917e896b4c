//! Todo domain model.
//!
//! # Responsibility
//! - Define the canonical todo record shared by service and HTTP layers.
//! - Encode the status lifecycle as a closed enum with explicit edges.
//!
//! # Invariants
//! - `uuid` is stable and never nil.
//! - `content` is non-empty after trimming.
//! - `archived_at` is set if and only if `status == TodoStatus::Archived`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a todo record.
pub type TodoId = Uuid;

/// Lifecycle state of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    /// Open and actionable.
    Active,
    /// Finished, still visible in active views.
    Completed,
    /// Finished and excluded from active views, retained in storage.
    Archived,
}

impl TodoStatus {
    /// Every status in lifecycle order.
    pub const ALL: [TodoStatus; 3] = [Self::Active, Self::Completed, Self::Archived];

    /// Stable lowercase name used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Parses a stable status name. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Returns whether `self -> next` is a legal lifecycle edge.
    ///
    /// Only `active -> completed` and `completed -> archived` are allowed.
    pub fn can_transition_to(self, next: TodoStatus) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Completed) | (Self::Completed, Self::Archived)
        )
    }
}

impl Display for TodoStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for todo records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    NilUuid,
    EmptyContent,
    /// `archived_at` is missing on an archived todo, or present on any other.
    ArchivedAtMismatch {
        status: TodoStatus,
        archived_at: Option<i64>,
    },
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "todo uuid must not be nil"),
            Self::EmptyContent => write!(f, "todo content must not be empty"),
            Self::ArchivedAtMismatch {
                status,
                archived_at,
            } => write!(
                f,
                "archived_at ({archived_at:?}) is inconsistent with status `{status}`"
            ),
        }
    }
}

impl Error for TodoValidationError {}

/// Canonical todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTodo")]
pub struct Todo {
    /// Stable global ID.
    pub uuid: TodoId,
    /// Free-form description of the task.
    pub content: String,
    pub status: TodoStatus,
    /// Unix epoch milliseconds of archival. `Some` only for archived todos.
    pub archived_at: Option<i64>,
}

#[derive(Deserialize)]
struct RawTodo {
    uuid: TodoId,
    content: String,
    status: TodoStatus,
    #[serde(default)]
    archived_at: Option<i64>,
}

impl TryFrom<RawTodo> for Todo {
    type Error = TodoValidationError;

    fn try_from(raw: RawTodo) -> Result<Self, Self::Error> {
        let todo = Todo {
            uuid: raw.uuid,
            content: raw.content,
            status: raw.status,
            archived_at: raw.archived_at,
        };
        todo.validate()?;
        Ok(todo)
    }
}

impl Todo {
    /// Creates a new active todo with a generated stable ID.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            content: content.into(),
            status: TodoStatus::Active,
            archived_at: None,
        }
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.uuid.is_nil() {
            return Err(TodoValidationError::NilUuid);
        }
        if self.content.trim().is_empty() {
            return Err(TodoValidationError::EmptyContent);
        }
        let is_archived = self.status == TodoStatus::Archived;
        if is_archived != self.archived_at.is_some() {
            return Err(TodoValidationError::ArchivedAtMismatch {
                status: self.status,
                archived_at: self.archived_at,
            });
        }
        Ok(())
    }

    /// Returns whether the archiver would select this todo.
    pub fn is_archivable(&self) -> bool {
        self.status == TodoStatus::Completed
    }
}
