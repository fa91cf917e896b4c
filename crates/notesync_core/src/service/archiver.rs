//! Bulk archival of completed todos.
//!
//! # Responsibility
//! - Transition every completed todo to archived in one atomic pass.
//! - Collapse repository failures into the two archival error kinds.
//!
//! # Invariants
//! - A successful outcome's `archived_count` equals the number of todos that
//!   were completed immediately before the call.
//! - An error never carries a partial count.
//! - Todos in any other status are never touched.

use crate::model::todo::TodoId;
use crate::repo::todo_repo::{RepoError, TodoRepository};
use log::{error, info};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Result of a successful archival pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveOutcome {
    /// Number of todos moved from completed to archived. May be 0.
    pub archived_count: usize,
    /// Archived ids in creation order.
    #[serde(skip)]
    pub archived_ids: Vec<TodoId>,
}

/// Archival failure. Both kinds are retryable by the caller.
#[derive(Debug)]
pub enum ArchiveError {
    /// The store could not be opened, locked, or read.
    StoreUnavailable(RepoError),
    /// At least one selected todo failed to persist; the batch was rolled back.
    TransitionFailure(RepoError),
}

impl ArchiveError {
    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StoreUnavailable(_) => "StoreUnavailable",
            Self::TransitionFailure(_) => "TransitionFailure",
        }
    }
}

impl Display for ArchiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable(err) => write!(f, "todo store unavailable: {err}"),
            Self::TransitionFailure(err) => write!(f, "archive transition failed: {err}"),
        }
    }
}

impl Error for ArchiveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) | Self::TransitionFailure(err) => Some(err),
        }
    }
}

impl From<RepoError> for ArchiveError {
    fn from(value: RepoError) -> Self {
        if matches!(&value, RepoError::Db(db) if db.is_unavailable()) {
            Self::StoreUnavailable(value)
        } else {
            Self::TransitionFailure(value)
        }
    }
}

/// Archives completed todos held by an injected repository.
pub struct Archiver<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> Archiver<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Moves every completed todo to archived.
    ///
    /// # Errors
    /// - `StoreUnavailable` when the store cannot be reached or stays locked
    ///   past the busy timeout.
    /// - `TransitionFailure` when any selected todo fails to persist; no todo
    ///   changes status in that case.
    pub fn archive_completed_todos(&mut self) -> Result<ArchiveOutcome, ArchiveError> {
        let started_at = Instant::now();

        match self.repo.archive_completed() {
            Ok(archived_ids) => {
                info!(
                    "event=archive_completed module=service status=ok archived_count={} duration_ms={}",
                    archived_ids.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(ArchiveOutcome {
                    archived_count: archived_ids.len(),
                    archived_ids,
                })
            }
            Err(err) => {
                let err = ArchiveError::from(err);
                error!(
                    "event=archive_completed module=service status=error error_kind={} duration_ms={} error={}",
                    err.kind(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Releases the wrapped repository.
    pub fn into_inner(self) -> R {
        self.repo
    }
}
