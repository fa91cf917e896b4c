//! Minimal blocking HTTP/1.1 codec over any `Read + Write` stream.
//!
//! # Invariants
//! - One request per connection; responses always carry `Connection: close`.
//! - Chunked transfer encoding is rejected.
//! - Bodies require `Content-Length` and are capped regardless of what the
//!   header claims.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, Read, Write};

/// Header section cap (32 KiB).
pub const MAX_HEADER_SIZE: usize = 32 * 1024;

/// Request body cap (1 MiB).
pub const MAX_BODY_SIZE: usize = 1_048_576;

const MAX_HEADERS: usize = 64;

/// Parsed HTTP request, detached from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    /// Request target including any query string.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Path component of the target, without the query string.
    pub fn path(&self) -> &str {
        self.target
            .split_once('?')
            .map_or(self.target.as_str(), |(path, _)| path)
    }

    /// Decoded-as-is `key=value` pairs from the query string.
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        let Some((_, query)) = self.target.split_once('?') else {
            return Vec::new();
        };
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .collect()
    }
}

/// HTTP response to write back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Reasons a request could not be read.
#[derive(Debug)]
pub enum RequestError {
    HeadersTooLarge,
    BodyTooLarge,
    MissingContentLength,
    ChunkedNotSupported,
    Malformed(String),
    Io(io::Error),
}

impl RequestError {
    /// Status code to answer with.
    pub fn status(&self) -> u16 {
        match self {
            Self::HeadersTooLarge | Self::BodyTooLarge => 413,
            Self::MissingContentLength => 411,
            _ => 400,
        }
    }
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HeadersTooLarge => write!(f, "request headers too large"),
            Self::BodyTooLarge => write!(f, "request body too large"),
            Self::MissingContentLength => write!(f, "request body requires Content-Length"),
            Self::ChunkedNotSupported => write!(f, "chunked transfer encoding not supported"),
            Self::Malformed(message) => write!(f, "malformed request: {message}"),
            Self::Io(err) => write!(f, "read error: {err}"),
        }
    }
}

impl Error for RequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        411 => "Length Required",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Reads one request from `stream`.
///
/// Returns `Ok(None)` when the peer closed the connection before sending
/// anything.
pub fn read_request(stream: &mut impl Read) -> Result<Option<HttpRequest>, RequestError> {
    let Some(header_buf) = read_header_section(stream)? else {
        return Ok(None);
    };

    let mut parsed_headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut parsed_headers);
    match req.parse(&header_buf) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(RequestError::Malformed("incomplete request head".to_string()));
        }
        Err(err) => return Err(RequestError::Malformed(err.to_string())),
    }

    let method = req.method.unwrap_or_default().to_string();
    let target = req.path.unwrap_or("/").to_string();

    let mut headers = Vec::with_capacity(req.headers.len());
    let mut content_length: Option<usize> = None;
    for header in req.headers.iter() {
        let name = header.name.to_string();
        let value = String::from_utf8_lossy(header.value).trim().to_string();

        if name.eq_ignore_ascii_case("Transfer-Encoding")
            && value.to_ascii_lowercase().contains("chunked")
        {
            return Err(RequestError::ChunkedNotSupported);
        }
        if name.eq_ignore_ascii_case("Content-Length") {
            content_length = Some(value.parse().map_err(|_| {
                RequestError::Malformed(format!("invalid Content-Length `{value}`"))
            })?);
        }
        headers.push((name, value));
    }

    let expects_body = matches!(method.as_str(), "POST" | "PUT" | "PATCH");
    let body = match (expects_body, content_length) {
        (_, Some(len)) => read_body(stream, len)?,
        (true, None) => return Err(RequestError::MissingContentLength),
        (false, None) => Vec::new(),
    };

    Ok(Some(HttpRequest {
        method,
        target,
        headers,
        body,
    }))
}

fn read_header_section(stream: &mut impl Read) -> Result<Option<Vec<u8>>, RequestError> {
    let mut header_buf = Vec::with_capacity(1024);
    let mut byte = [0u8; 1];

    loop {
        match stream.read(&mut byte) {
            Ok(0) if header_buf.is_empty() => return Ok(None),
            Ok(0) => {
                return Err(RequestError::Malformed(
                    "connection closed mid-request".to_string(),
                ))
            }
            Ok(_) => {
                header_buf.push(byte[0]);
                if header_buf.len() > MAX_HEADER_SIZE {
                    return Err(RequestError::HeadersTooLarge);
                }
                if header_buf.ends_with(b"\r\n\r\n") {
                    return Ok(Some(header_buf));
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(RequestError::Io(err)),
        }
    }
}

fn read_body(stream: &mut impl Read, declared_len: usize) -> Result<Vec<u8>, RequestError> {
    if declared_len > MAX_BODY_SIZE {
        return Err(RequestError::BodyTooLarge);
    }
    let mut body = Vec::with_capacity(declared_len);
    stream
        .take(declared_len as u64)
        .read_to_end(&mut body)
        .map_err(RequestError::Io)?;
    if body.len() < declared_len {
        return Err(RequestError::Malformed(format!(
            "body shorter than Content-Length ({} < {declared_len})",
            body.len()
        )));
    }
    Ok(body)
}

/// Writes `response` to `stream` and flushes it.
pub fn write_response(stream: &mut impl Write, response: &HttpResponse) -> io::Result<()> {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        reason(response.status),
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");

    stream.write_all(head.as_bytes())?;
    stream.write_all(&response.body)?;
    stream.flush()
}
