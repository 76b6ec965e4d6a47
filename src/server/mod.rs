//! One-shot HTTP facade over the payment record API
//!
//! Every connection carries a single request: a JSON `POST` is turned into a
//! PNG payment code, or into a JSON error body carrying the validation message.
//! The connection is closed after the response.

pub mod generate;

pub use generate::GenerateRequest;

use crate::config::ServerOptions;
use crate::error::{Error, Result};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time;
use tracing::{info, warn};

const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Response produced by the handler, independent of the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Headers in emission order
    pub headers: Vec<(&'static str, String)>,
    /// Raw body
    pub body: Vec<u8>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: u16,
    error: &'a str,
}

impl HttpResponse {
    /// PNG image response with caching disabled
    pub fn png(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: vec![
                ("Content-Type", "image/png".to_string()),
                (
                    "Cache-Control",
                    "no-cache, no-store, must-revalidate".to_string(),
                ),
                ("Pragma", "no-cache".to_string()),
                ("Expires", "0".to_string()),
            ],
            body,
        }
    }

    /// JSON error response: `{"code":<status>,"error":"<message>"}`
    pub fn error(status: u16, message: &str) -> Self {
        let body = serde_json::to_vec(&ErrorBody {
            code: status,
            error: message,
        })
        .unwrap_or_default();

        Self {
            status,
            headers: vec![
                ("Content-Type", "application/json".to_string()),
                ("X-Content-Type-Options", "nosniff".to_string()),
            ],
            body,
        }
    }

    /// First header value with the given name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Serialize as an HTTP/1.1 response
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut response = Vec::with_capacity(256 + self.body.len());
        let status_line = format!("HTTP/1.1 {} {}\r\n", self.status, reason(self.status));
        response.extend_from_slice(status_line.as_bytes());
        response.extend_from_slice(b"Connection: close\r\n");
        for (name, value) in &self.headers {
            response.extend_from_slice(name.as_bytes());
            response.extend_from_slice(b": ");
            response.extend_from_slice(value.as_bytes());
            response.extend_from_slice(b"\r\n");
        }
        let length_header = format!("Content-Length: {}\r\n\r\n", self.body.len());
        response.extend_from_slice(length_header.as_bytes());
        response.extend_from_slice(&self.body);
        response
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        _ => "Internal Server Error",
    }
}

/// Bind the configured address and serve until the listener fails.
pub async fn serve(options: &ServerOptions) -> Result<()> {
    let address = options.socket_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| Error::Config(format!("Failed to bind {address}: {e}")))?;
    info!(address = %address, "Listening for generate requests");
    run(listener, options.max_body_bytes).await
}

/// Bind `addr` and serve on a background task, returning the bound address.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_http_endpoint(addr: SocketAddr, max_body_bytes: usize) -> Result<SocketAddr> {
    let std_listener = std::net::TcpListener::bind(addr).map_err(Error::Io)?;
    std_listener.set_nonblocking(true).map_err(Error::Io)?;
    let listener = TcpListener::from_std(std_listener).map_err(Error::Io)?;
    let local = listener.local_addr().map_err(Error::Io)?;

    tokio::spawn(async move {
        if let Err(err) = run(listener, max_body_bytes).await {
            tracing::error!(target: "mnbqr::server", error = %err, "HTTP endpoint error");
        }
    });

    Ok(local)
}

async fn run(listener: TcpListener, max_body_bytes: usize) -> Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(err) => {
                warn!(target: "mnbqr::server", error = %err, "accept failed");
                time::sleep(Duration::from_millis(250)).await;
                continue;
            }
        };

        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, max_body_bytes).await {
                tracing::debug!(
                    target: "mnbqr::server",
                    peer = %peer,
                    error = %err,
                    "connection closed"
                );
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, max_body_bytes: usize) -> Result<()> {
    let response = match read_request(&mut stream, max_body_bytes).await {
        Ok(request) => {
            tracing::debug!(
                target: "mnbqr::server",
                method = %request.method,
                path = %request.path,
                body_bytes = request.body.len(),
                "request received"
            );
            generate::handle(&request.method, &request.body)
        }
        Err(err @ Error::BodyTooLarge { .. }) => HttpResponse::error(413, &err.to_string()),
        Err(Error::Http(message)) => HttpResponse::error(400, &message),
        Err(err) => return Err(err),
    };

    stream.write_all(&response.to_bytes()).await.map_err(Error::Io)?;
    stream.shutdown().await.map_err(Error::Io)?;
    Ok(())
}

struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

async fn read_request(stream: &mut TcpStream, max_body_bytes: usize) -> Result<HttpRequest> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        if let Some(pos) = find_header_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_HEADER_BYTES {
            return Err(Error::Http("request headers too large".to_string()));
        }
        let n = stream.read(&mut chunk).await.map_err(Error::Io)?;
        if n == 0 {
            return Err(Error::Http("connection closed mid-request".to_string()));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = std::str::from_utf8(&buf[..header_end])
        .map_err(|_| Error::Http("request head is not valid UTF-8".to_string()))?;
    let (method, path, content_length) = parse_head(head)?;
    if content_length > max_body_bytes {
        return Err(Error::BodyTooLarge {
            limit: max_body_bytes,
        });
    }

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.map_err(Error::Io)?;
        if n == 0 {
            return Err(Error::Http("request body truncated".to_string()));
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok(HttpRequest { method, path, body })
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

fn parse_head(head: &str) -> Result<(String, String, usize)> {
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line
        .next()
        .ok_or_else(|| Error::Http("missing request line".to_string()))?;
    let path = request_line.next().unwrap_or("/");

    let mut content_length = 0;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| Error::Http("invalid Content-Length".to_string()))?;
            }
        }
    }

    Ok((method.to_string(), path.to_string(), content_length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_json() {
        let response = HttpResponse::error(500, "test err");
        assert_eq!(response.body, br#"{"code":500,"error":"test err"}"#);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("X-Content-Type-Options"), Some("nosniff"));
    }

    #[test]
    fn test_error_json_empty_message() {
        let response = HttpResponse::error(0, "");
        assert_eq!(response.body, br#"{"code":0,"error":""}"#);
    }

    #[test]
    fn test_response_bytes() {
        let response = HttpResponse::error(405, "invalid method");
        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert!(text.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.contains(&format!("Content-Length: {}\r\n\r\n", response.body.len())));
        assert!(text.ends_with(r#"{"code":405,"error":"invalid method"}"#));
    }

    #[test]
    fn test_parse_head() {
        let (method, path, length) =
            parse_head("POST /generate HTTP/1.1\r\nHost: x\r\ncontent-length: 42").unwrap();
        assert_eq!(method, "POST");
        assert_eq!(path, "/generate");
        assert_eq!(length, 42);

        let (_, _, length) = parse_head("GET / HTTP/1.1\r\nHost: x").unwrap();
        assert_eq!(length, 0);

        assert!(parse_head("").is_err());
        assert!(parse_head("POST / HTTP/1.1\r\nContent-Length: lots").is_err());
    }

    #[test]
    fn test_find_header_end() {
        assert_eq!(find_header_end(b"GET / HTTP/1.1\r\n\r\nbody"), Some(14));
        assert_eq!(find_header_end(b"GET / HTTP/1.1\r\n"), None);
    }
}
