use notesync_core::{Todo, TodoStatus, TodoValidationError};
use uuid::Uuid;

#[test]
fn todo_new_starts_active() {
    let todo = Todo::new("water plants");

    assert!(!todo.uuid.is_nil());
    assert_eq!(todo.content, "water plants");
    assert_eq!(todo.status, TodoStatus::Active);
    assert_eq!(todo.archived_at, None);
    assert!(!todo.is_archivable());
    assert_eq!(todo.validate(), Ok(()));
}

#[test]
fn validate_rejects_nil_uuid() {
    let mut todo = Todo::new("invalid");
    todo.uuid = Uuid::nil();
    assert_eq!(todo.validate(), Err(TodoValidationError::NilUuid));
}

#[test]
fn validate_rejects_blank_content() {
    let todo = Todo::new("   ");
    assert_eq!(todo.validate(), Err(TodoValidationError::EmptyContent));
}

#[test]
fn validate_ties_archived_at_to_archived_status() {
    let mut todo = Todo::new("file taxes");
    todo.status = TodoStatus::Archived;
    assert_eq!(
        todo.validate(),
        Err(TodoValidationError::ArchivedAtMismatch {
            status: TodoStatus::Archived,
            archived_at: None,
        })
    );

    todo.archived_at = Some(1_700_000_000_000);
    assert_eq!(todo.validate(), Ok(()));

    todo.status = TodoStatus::Completed;
    assert!(todo.validate().is_err());
}

#[test]
fn todo_serialization_uses_snake_case_status() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let mut todo = Todo::new("ship release");
    todo.uuid = id;
    todo.status = TodoStatus::Completed;

    let json = serde_json::to_value(&todo).unwrap();
    assert_eq!(json["uuid"], id.to_string());
    assert_eq!(json["content"], "ship release");
    assert_eq!(json["status"], "completed");
    assert!(json["archived_at"].is_null());

    let decoded: Todo = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, todo);
}

#[test]
fn deserialize_rejects_unknown_status_and_inconsistent_records() {
    let deleted = serde_json::json!({
        "uuid": "11111111-2222-4333-8444-555555555555",
        "content": "gone",
        "status": "deleted",
        "archived_at": null
    });
    assert!(serde_json::from_value::<Todo>(deleted).is_err());

    let archived_without_time = serde_json::json!({
        "uuid": "11111111-2222-4333-8444-555555555555",
        "content": "old",
        "status": "archived"
    });
    let err = serde_json::from_value::<Todo>(archived_without_time).unwrap_err();
    assert!(
        err.to_string().contains("inconsistent with status `archived`"),
        "unexpected error: {err}"
    );
}
