use notesync_core::db::DbOptions;
use notesync_server::http::{HttpRequest, HttpResponse};
use notesync_server::{route_request, AppState, ErrorBody, ErrorKind};
use serde_json::Value;
use std::time::Duration;
use tempfile::TempDir;

fn state() -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(dir.path().join("notesync.db"), DbOptions::default());
    (dir, state)
}

fn request(method: &str, target: &str, body: &str) -> HttpRequest {
    HttpRequest {
        method: method.to_string(),
        target: target.to_string(),
        headers: Vec::new(),
        body: body.as_bytes().to_vec(),
    }
}

fn json(response: &HttpResponse) -> Value {
    serde_json::from_slice(&response.body).unwrap()
}

fn error_kind(response: &HttpResponse) -> ErrorKind {
    serde_json::from_slice::<ErrorBody>(&response.body)
        .unwrap()
        .kind
}

fn create(state: &AppState, content: &str) -> String {
    let body = serde_json::json!({ "content": content }).to_string();
    let response = route_request(&request("POST", "/todos", &body), state);
    assert_eq!(response.status, 201);
    json(&response)["uuid"].as_str().unwrap().to_string()
}

fn complete(state: &AppState, id: &str) {
    let response = route_request(
        &request("POST", &format!("/todos/{id}/complete"), ""),
        state,
    );
    assert_eq!(response.status, 200);
    assert_eq!(json(&response)["status"], "completed");
}

#[test]
fn archive_on_empty_store_returns_zero() {
    let (_dir, state) = state();

    let response = route_request(&request("POST", "/todos/archive-completed", ""), &state);
    assert_eq!(response.status, 200);
    assert_eq!(json(&response), serde_json::json!({ "archivedCount": 0 }));
}

#[test]
fn archive_moves_completed_todos_once() {
    let (_dir, state) = state();
    let first = create(&state, "first");
    let second = create(&state, "second");
    let third = create(&state, "third");
    complete(&state, &first);
    complete(&state, &third);

    let response = route_request(&request("POST", "/todos/archive-completed", ""), &state);
    assert_eq!(response.status, 200);
    assert_eq!(json(&response)["archivedCount"], 2);

    let listed = json(&route_request(&request("GET", "/todos", ""), &state));
    let statuses: Vec<(String, String)> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|todo| {
            (
                todo["uuid"].as_str().unwrap().to_string(),
                todo["status"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            (first, "archived".to_string()),
            (second, "active".to_string()),
            (third, "archived".to_string()),
        ]
    );

    let again = route_request(&request("POST", "/todos/archive-completed", ""), &state);
    assert_eq!(json(&again)["archivedCount"], 0);
}

#[test]
fn list_filters_by_status() {
    let (_dir, state) = state();
    let done = create(&state, "done");
    create(&state, "open");
    complete(&state, &done);

    let response = route_request(&request("GET", "/todos?status=completed", ""), &state);
    let listed = json(&response);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["uuid"], done.as_str());

    let bad = route_request(&request("GET", "/todos?status=deleted", ""), &state);
    assert_eq!(bad.status, 400);
    assert_eq!(error_kind(&bad), ErrorKind::BadRequest);
}

#[test]
fn get_single_todo_and_missing_todo() {
    let (_dir, state) = state();
    let id = create(&state, "read me");

    let found = route_request(&request("GET", &format!("/todos/{id}"), ""), &state);
    assert_eq!(found.status, 200);
    assert_eq!(json(&found)["content"], "read me");

    let missing = route_request(
        &request("GET", "/todos/11111111-2222-4333-8444-555555555555", ""),
        &state,
    );
    assert_eq!(missing.status, 404);
    assert_eq!(error_kind(&missing), ErrorKind::NotFound);
}

#[test]
fn completing_twice_is_a_conflict() {
    let (_dir, state) = state();
    let id = create(&state, "once");
    complete(&state, &id);

    let response = route_request(
        &request("POST", &format!("/todos/{id}/complete"), ""),
        &state,
    );
    assert_eq!(response.status, 409);
    assert_eq!(error_kind(&response), ErrorKind::InvalidTransition);
}

#[test]
fn malformed_input_is_rejected() {
    let (_dir, state) = state();

    let bad_json = route_request(&request("POST", "/todos", "{not json"), &state);
    assert_eq!(bad_json.status, 400);

    let blank = route_request(&request("POST", "/todos", r#"{"content":"  "}"#), &state);
    assert_eq!(blank.status, 400);

    let bad_id = route_request(&request("POST", "/todos/nope/complete", ""), &state);
    assert_eq!(bad_id.status, 400);
}

#[test]
fn unknown_routes_and_methods() {
    let (_dir, state) = state();

    let unknown = route_request(&request("GET", "/projects", ""), &state);
    assert_eq!(unknown.status, 404);

    let wrong_method = route_request(&request("GET", "/todos/archive-completed", ""), &state);
    assert_eq!(wrong_method.status, 405);
    assert_eq!(error_kind(&wrong_method), ErrorKind::MethodNotAllowed);

    let health = route_request(&request("GET", "/health", ""), &state);
    assert_eq!(health.status, 200);
    assert_eq!(json(&health)["status"], "ok");
}

#[test]
fn locked_store_answers_service_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notesync.db");
    let state = AppState::new(
        &path,
        DbOptions {
            busy_timeout: Duration::from_millis(50),
        },
    );
    let id = create(&state, "stuck");
    complete(&state, &id);

    let holder = rusqlite::Connection::open(&path).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let response = route_request(&request("POST", "/todos/archive-completed", ""), &state);
    assert_eq!(response.status, 503);
    assert_eq!(error_kind(&response), ErrorKind::StoreUnavailable);

    holder.execute_batch("ROLLBACK;").unwrap();
    let retried = route_request(&request("POST", "/todos/archive-completed", ""), &state);
    assert_eq!(json(&retried)["archivedCount"], 1);
}

#[test]
fn unopenable_store_answers_service_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(
        dir.path().join("missing").join("notesync.db"),
        DbOptions::default(),
    );

    let response = route_request(&request("POST", "/todos/archive-completed", ""), &state);
    assert_eq!(response.status, 503);
    assert_eq!(error_kind(&response), ErrorKind::StoreUnavailable);
}
