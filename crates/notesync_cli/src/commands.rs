//! Subcommand implementations.
//!
//! Each command talks to the service through `ApiClient` and prints a short
//! human-readable result. Failures are printed here; the returned
//! `ExitCode` tells `main` how to exit.

use crate::api_client::ApiError;
use crate::args::{Cli, ClientArgs, Commands, ServeArgs};
use anyhow::{Context, Result};
use notesync_core::{Todo, TodoId, TodoStatus};
use notesync_server::bind_server;
use std::process::ExitCode;

const SERVICE_HINT: &str = "Is the service running? Try: notesync serve";

pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Serve(args) => serve(&args),
        Commands::Archive(client) => archive(&client),
        Commands::Add { content, client } => add(&client, &content.join(" ")),
        Commands::Complete { id, client } => complete(&client, id),
        Commands::List { status, client } => list(&client, status),
    }
}

fn serve(args: &ServeArgs) -> Result<ExitCode> {
    let config = args.to_config();
    let server = bind_server(&config).context("failed to start notesync service")?;
    println!("🚀 notesync service listening on http://{}", server.local_addr());
    println!("   Database: {}", server.db_path().display());
    println!("   Press Ctrl+C to stop");
    server.run();
    Ok(ExitCode::SUCCESS)
}

pub fn archive(args: &ClientArgs) -> Result<ExitCode> {
    let client = args.client()?;
    match client.archive_completed_todos() {
        Ok(result) => {
            println!("{}", archive_summary(result.archived_count));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("❌ Failed to archive todos: {err}");
            eprintln!("💡 {SERVICE_HINT}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn add(args: &ClientArgs, content: &str) -> Result<ExitCode> {
    let client = args.client()?;
    match client.create_todo(content) {
        Ok(todo) => {
            println!("✅ Added {}", todo.uuid);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(report_failure("add todo", &err)),
    }
}

fn complete(args: &ClientArgs, id: TodoId) -> Result<ExitCode> {
    let client = args.client()?;
    match client.complete_todo(id) {
        Ok(todo) => {
            println!("✅ Completed: {}", todo.content);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(report_failure("complete todo", &err)),
    }
}

fn list(args: &ClientArgs, status: Option<TodoStatus>) -> Result<ExitCode> {
    let client = args.client()?;
    match client.list_todos(status) {
        Ok(todos) if todos.is_empty() => {
            println!("📋 No todos");
            Ok(ExitCode::SUCCESS)
        }
        Ok(todos) => {
            for todo in &todos {
                println!("{}", format_todo_line(todo));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(report_failure("list todos", &err)),
    }
}

fn report_failure(action: &str, err: &ApiError) -> ExitCode {
    eprintln!("❌ Failed to {action}: {err}");
    if matches!(err, ApiError::StoreUnavailable(_)) {
        eprintln!("💡 {SERVICE_HINT}");
    }
    ExitCode::FAILURE
}

/// One-line result of an archive call.
pub fn archive_summary(archived_count: usize) -> String {
    match archived_count {
        0 => "📋 No completed todos to archive".to_string(),
        1 => "✅ Archived 1 completed todo".to_string(),
        n => format!("✅ Archived {n} completed todos"),
    }
}

fn format_todo_line(todo: &Todo) -> String {
    let marker = match todo.status {
        TodoStatus::Active => "[ ]",
        TodoStatus::Completed => "[x]",
        TodoStatus::Archived => "[a]",
    };
    format!("{marker} {}  {}", todo.uuid, todo.content)
}

#[cfg(test)]
mod tests {
    use super::{archive_summary, format_todo_line};
    use notesync_core::{Todo, TodoStatus};

    #[test]
    fn archive_summary_pluralizes() {
        assert_eq!(archive_summary(0), "📋 No completed todos to archive");
        assert_eq!(archive_summary(1), "✅ Archived 1 completed todo");
        assert_eq!(archive_summary(3), "✅ Archived 3 completed todos");
    }

    #[test]
    fn todo_line_marks_status() {
        let mut todo = Todo::new("ship it");
        todo.status = TodoStatus::Completed;
        let line = format_todo_line(&todo);
        assert!(line.starts_with("[x] "));
        assert!(line.ends_with("  ship it"));
    }
}
