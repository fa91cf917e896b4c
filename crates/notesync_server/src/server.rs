//! TCP accept loop and process bootstrap.
//!
//! # Invariants
//! - One thread per accepted connection; connections never share a
//!   database handle.
//! - A bad request gets an error response; it never stops the loop.

use crate::api::{json_error, route_request, AppState};
use crate::config::ServerConfig;
use crate::http::{read_request, write_response, RequestError};
use crate::wire::ErrorKind;
use log::{debug, info, warn};
use notesync_core::db::{open_db_with_options, DbError};
use notesync_core::{init_logging, LoggingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub enum ServerError {
    Logging(LoggingError),
    /// The database could not be opened or migrated at startup.
    Store(DbError),
    Bind { addr: String, source: io::Error },
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "failed to initialize logging: {err}"),
            Self::Store(err) => write!(f, "failed to open todo store: {err}"),
            Self::Bind { addr, source } => write!(f, "failed to bind {addr}: {source}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Bind { source, .. } => Some(source),
        }
    }
}

impl From<LoggingError> for ServerError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for ServerError {
    fn from(value: DbError) -> Self {
        Self::Store(value)
    }
}

/// A listening socket plus the state its connections are served with.
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: Arc<AppState>,
}

impl BoundServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn db_path(&self) -> &Path {
        &self.state.db_path
    }

    /// Serves until the listener stops yielding connections.
    pub fn run(self) {
        serve(self.listener, self.state);
    }
}

/// Initializes logging, migrates the store and binds the listener.
pub fn bind_server(config: &ServerConfig) -> Result<BoundServer, ServerError> {
    if let Some(logging) = config.logging_config() {
        init_logging(&logging)?;
    }

    // Fail fast on an unreachable or too-new database.
    drop(open_db_with_options(&config.db_path, &config.db_options())?);

    let addr = config.bind_addr();
    let bind_error = |source: io::Error| ServerError::Bind {
        addr: addr.clone(),
        source,
    };
    let listener = TcpListener::bind(&addr).map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;
    info!(
        "event=server_start module=server status=ok addr={} db_path={}",
        local_addr,
        config.db_path.display()
    );

    let state = Arc::new(AppState::new(config.db_path.clone(), config.db_options()));
    Ok(BoundServer {
        listener,
        local_addr,
        state,
    })
}

/// Accepts connections on `listener` until it stops yielding them.
pub fn serve(listener: TcpListener, state: Arc<AppState>) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let state = Arc::clone(&state);
                std::thread::spawn(move || handle_connection(stream, &state));
            }
            Err(err) => warn!("event=accept module=server status=error error={err}"),
        }
    }
}

fn handle_connection(mut stream: TcpStream, state: &AppState) {
    let started_at = Instant::now();
    if let Err(err) = stream.set_read_timeout(Some(REQUEST_READ_TIMEOUT)) {
        warn!("event=http_request module=server status=error error={err}");
        return;
    }

    let (label, response) = match read_request(&mut stream) {
        Ok(Some(req)) => {
            let label = format!("{} {}", req.method, req.path());
            (label, route_request(&req, state))
        }
        Ok(None) => return,
        Err(err) => ("-".to_string(), request_error_response(&err)),
    };

    if let Err(err) = write_response(&mut stream, &response) {
        warn!("event=http_request module=server status=error request={label} error={err}");
    }
    info!(
        "event=http_request module=server request={} status={} duration_ms={}",
        label,
        response.status,
        started_at.elapsed().as_millis()
    );
    if let Err(err) = stream.shutdown(Shutdown::Write) {
        debug!("event=http_shutdown module=server request={label} error={err}");
    }
}

fn request_error_response(err: &RequestError) -> crate::http::HttpResponse {
    let mut response = match err.status() {
        413 => json_error(ErrorKind::PayloadTooLarge, err.to_string()),
        _ => json_error(ErrorKind::BadRequest, err.to_string()),
    };
    response.status = err.status();
    response
}
