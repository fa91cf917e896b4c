//! Todo repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/list APIs over canonical `todos` storage.
//! - Own status transitions, including the bulk completed -> archived pass.
//!
//! # Invariants
//! - Write paths must call `Todo::validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - `archive_completed` selects and updates inside one `IMMEDIATE`
//!   transaction; either every selected row is archived or none is.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::todo::{Todo, TodoId, TodoStatus, TodoValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TODO_SELECT_SQL: &str = "SELECT
    uuid,
    content,
    status,
    archived_at
FROM todos";

const TODO_ORDER_SQL: &str = " ORDER BY created_at ASC, rowid ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for todo persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TodoValidationError),
    Db(DbError),
    NotFound(TodoId),
    InvalidData(String),
    /// Requested status change is not a legal edge for this call.
    InvalidTransition {
        id: TodoId,
        from: TodoStatus,
        to: TodoStatus,
    },
    /// Bulk transition touched a different number of rows than it selected.
    PartialTransition { expected: usize, applied: usize },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
            Self::InvalidTransition { id, from, to } => {
                write!(f, "todo {id} cannot move from `{from}` to `{to}`")
            }
            Self::PartialTransition { expected, applied } => write!(
                f,
                "bulk transition applied to {applied} of {expected} selected todos"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TodoValidationError> for RepoError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing todos.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoListQuery {
    /// Exact status filter. `None` lists every status.
    pub status: Option<TodoStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for todo storage.
pub trait TodoRepository {
    fn create_todo(&self, todo: &Todo) -> RepoResult<TodoId>;
    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>>;
    fn list_todos(&self, query: &TodoListQuery) -> RepoResult<Vec<Todo>>;
    /// Moves one todo along a single lifecycle edge and returns the stored
    /// result. Archival is refused here; use `archive_completed`.
    fn transition_todo(&self, id: TodoId, next: TodoStatus) -> RepoResult<Todo>;
    /// Archives every completed todo atomically and returns the archived ids
    /// in creation order.
    fn archive_completed(&mut self) -> RepoResult<Vec<TodoId>>;
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// # Errors
    /// - `InvalidData` when the connection schema is not at the latest
    ///   migration version.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn create_todo(&self, todo: &Todo) -> RepoResult<TodoId> {
        todo.validate()?;

        self.conn.execute(
            "INSERT INTO todos (
                uuid,
                content,
                status,
                archived_at
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                todo.uuid.to_string(),
                todo.content.as_str(),
                todo.status.as_str(),
                todo.archived_at,
            ],
        )?;

        Ok(todo.uuid)
    }

    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TODO_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_todo_row(row)?));
        }

        Ok(None)
    }

    fn list_todos(&self, query: &TodoListQuery) -> RepoResult<Vec<Todo>> {
        let mut sql = format!("{TODO_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        sql.push_str(TODO_ORDER_SQL);

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut todos = Vec::new();

        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(row)?);
        }

        Ok(todos)
    }

    fn transition_todo(&self, id: TodoId, next: TodoStatus) -> RepoResult<Todo> {
        let current = self.get_todo(id)?.ok_or(RepoError::NotFound(id))?;
        if next == TodoStatus::Archived || !current.status.can_transition_to(next) {
            return Err(RepoError::InvalidTransition {
                id,
                from: current.status,
                to: next,
            });
        }

        // Guarded on the observed status so a concurrent writer cannot be
        // overwritten between the read and the update.
        let changed = self.conn.execute(
            "UPDATE todos
             SET
                status = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND status = ?3;",
            params![id.to_string(), next.as_str(), current.status.as_str()],
        )?;

        if changed == 0 {
            let latest = self.get_todo(id)?.ok_or(RepoError::NotFound(id))?;
            return Err(RepoError::InvalidTransition {
                id,
                from: latest.status,
                to: next,
            });
        }

        self.get_todo(id)?.ok_or(RepoError::NotFound(id))
    }

    fn archive_completed(&mut self) -> RepoResult<Vec<TodoId>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let selected = select_ids_by_status_in_tx(&tx, TodoStatus::Completed)?;
        if selected.is_empty() {
            tx.commit()?;
            return Ok(selected);
        }

        let applied = tx.execute(
            "UPDATE todos
             SET
                status = 'archived',
                archived_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE status = 'completed';",
            [],
        )?;

        if applied != selected.len() {
            // Dropping `tx` rolls the batch back.
            return Err(RepoError::PartialTransition {
                expected: selected.len(),
                applied,
            });
        }

        tx.commit()?;
        Ok(selected)
    }
}

fn select_ids_by_status_in_tx(tx: &Transaction<'_>, status: TodoStatus) -> RepoResult<Vec<TodoId>> {
    let mut stmt = tx.prepare(&format!(
        "SELECT uuid FROM todos WHERE status = ?1{TODO_ORDER_SQL};"
    ))?;
    let mut rows = stmt.query([status.as_str()])?;
    let mut ids = Vec::new();

    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get(0)?;
        ids.push(parse_uuid(&uuid_text)?);
    }

    Ok(ids)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();
    if version != latest {
        return Err(RepoError::InvalidData(format!(
            "connection schema version {version} does not match expected {latest}; open it with db::open_db"
        )));
    }
    Ok(())
}

fn parse_uuid(value: &str) -> RepoResult<TodoId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in todos.uuid")))
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<Todo> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text)?;

    let status_text: String = row.get("status")?;
    let status = TodoStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid todo status `{status_text}` in todos.status"))
    })?;

    let todo = Todo {
        uuid,
        content: row.get("content")?,
        status,
        archived_at: row.get("archived_at")?,
    };
    todo.validate()?;
    Ok(todo)
}
