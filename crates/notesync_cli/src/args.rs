use crate::api_client::{ApiClient, ApiError, DEFAULT_BASE_URL};
use clap::{Args, Parser, Subcommand};
use notesync_core::{TodoId, TodoStatus};
use notesync_server::config::{DEFAULT_DB_FILE_NAME, DEFAULT_HOST, DEFAULT_PORT};
use notesync_server::ServerConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "notesync")]
#[command(version, about = "Todo service with bulk archival of completed items", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the todo service
    Serve(ServeArgs),

    /// Archive every completed todo
    Archive(ClientArgs),

    /// Create a todo
    Add {
        /// Description of the todo
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Mark a todo as completed
    #[command(alias = "done")]
    Complete {
        /// Todo id
        id: TodoId,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// List todos
    #[command(alias = "ls")]
    List {
        /// Only show todos with this status (active, completed, archived)
        #[arg(short, long, value_parser = parse_status)]
        status: Option<TodoStatus>,

        #[command(flatten)]
        client: ClientArgs,
    },
}

/// Connection settings shared by every client subcommand.
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Base URL of the notesync service
    #[arg(long, env = "NOTESYNC_URL", default_value = DEFAULT_BASE_URL)]
    pub url: String,

    /// Give up on the service after this many seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ClientArgs {
    pub fn client(&self) -> Result<ApiClient, ApiError> {
        ApiClient::with_timeout(self.url.as_str(), Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long, env = "NOTESYNC_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "NOTESYNC_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database file
    #[arg(long, env = "NOTESYNC_DB", default_value = DEFAULT_DB_FILE_NAME)]
    pub db: PathBuf,

    /// Milliseconds to wait on a locked database
    #[arg(long, default_value_t = 5000)]
    pub busy_timeout_ms: u64,

    /// Directory for rolling log files (absolute path)
    #[arg(long, env = "NOTESYNC_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, env = "NOTESYNC_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl ServeArgs {
    pub fn to_config(&self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            db_path: self.db.clone(),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            log_level: self.log_level.clone().unwrap_or(defaults.log_level),
            log_dir: self.log_dir.clone(),
        }
    }
}

fn parse_status(value: &str) -> Result<TodoStatus, String> {
    TodoStatus::parse(&value.to_ascii_lowercase())
        .ok_or_else(|| format!("unknown status `{value}`; expected active|completed|archived"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_defaults_to_local_service() {
        let cli = Cli::try_parse_from(["notesync", "archive"]).unwrap();
        match cli.command {
            Commands::Archive(client) => {
                assert_eq!(client.url, DEFAULT_BASE_URL);
                assert_eq!(client.timeout_secs, 30);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn list_parses_status_filter() {
        let cli = Cli::try_parse_from(["notesync", "ls", "--status", "Completed"]).unwrap();
        match cli.command {
            Commands::List { status, .. } => assert_eq!(status, Some(TodoStatus::Completed)),
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["notesync", "list", "--status", "deleted"]).is_err());
    }

    #[test]
    fn complete_requires_a_valid_id() {
        assert!(Cli::try_parse_from(["notesync", "complete", "not-a-uuid"]).is_err());
        let cli = Cli::try_parse_from([
            "notesync",
            "done",
            "11111111-2222-4333-8444-555555555555",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Complete { .. }));
    }

    #[test]
    fn serve_args_map_onto_server_config() {
        let cli = Cli::try_parse_from([
            "notesync",
            "serve",
            "--port",
            "4100",
            "--db",
            "/tmp/todos.db",
            "--busy-timeout-ms",
            "250",
        ])
        .unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        let config = args.to_config();
        assert_eq!(config.port, 4100);
        assert_eq!(config.db_path, PathBuf::from("/tmp/todos.db"));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(config.log_dir.is_none());
    }
}
