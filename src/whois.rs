//! Minimal WHOIS (RFC 3912) client for route object lookups.
//!
//! A session is one TCP connection: the query is sent terminated by CRLF and
//! the response is everything the server writes before closing.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::error::FetchError;
use crate::routes::SourceRoutes;

pub const WHOIS_PORT: u16 = 43;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default cap on a single WHOIS response (10 MB)
const DEFAULT_MAX_RESPONSE: usize = 10 * 1024 * 1024;

const READ_CHUNK: usize = 8192;

/// WHOIS client settings. Each query opens its own connection.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    port: u16,
    timeout: Duration,
    max_response: usize,
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self {
            port: WHOIS_PORT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_response: DEFAULT_MAX_RESPONSE,
        }
    }
}

impl WhoisClient {
    pub fn new(port: u16, timeout: Duration, max_response: usize) -> Self {
        Self {
            port,
            timeout,
            max_response,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Query `server` and extract its `route:` / `route6:` objects.
    ///
    /// The whole session (connect, send, read until close) shares one
    /// deadline. The stream is dropped, and so closed, on every return path.
    pub async fn query_routes(&self, server: &str, query: &str) -> Result<SourceRoutes, FetchError> {
        let target = format!("{}:{}", server, self.port);
        let deadline = Instant::now() + self.timeout;
        let timed_out = || FetchError::Timeout {
            target: target.clone(),
            after: self.timeout,
        };

        debug!("WHOIS {} <- {:?}", target, query);

        let mut stream = timeout_at(deadline, TcpStream::connect((server, self.port)))
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| FetchError::Connect {
                target: target.clone(),
                source: e,
            })?;

        let response = timeout_at(deadline, self.exchange(&mut stream, &target, query))
            .await
            .map_err(|_| timed_out())??;

        let text = String::from_utf8_lossy(&response);
        let routes = parse_routes(&text);
        debug!(
            "WHOIS {} -> {} bytes, {} route, {} route6",
            target,
            response.len(),
            routes.ipv4.len(),
            routes.ipv6.len()
        );
        Ok(routes)
    }

    /// Send the query and read until the peer closes the connection
    async fn exchange(
        &self,
        stream: &mut TcpStream,
        target: &str,
        query: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let io_error = |e: std::io::Error| FetchError::Protocol {
            target: target.to_string(),
            message: e.to_string(),
        };

        stream
            .write_all(format!("{}\r\n", query).as_bytes())
            .await
            .map_err(io_error)?;
        stream.flush().await.map_err(io_error)?;

        let mut response = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = stream.read(&mut chunk).await.map_err(io_error)?;
            if n == 0 {
                break;
            }
            if response.len() + n > self.max_response {
                return Err(FetchError::Protocol {
                    target: target.to_string(),
                    message: format!("response exceeds {} bytes", self.max_response),
                });
            }
            response.extend_from_slice(&chunk[..n]);
        }

        Ok(response)
    }
}

/// Query `server` on port 43 with the given overall timeout.
pub async fn query_routes(
    server: &str,
    query: &str,
    timeout: Duration,
) -> Result<SourceRoutes, FetchError> {
    WhoisClient::new(WHOIS_PORT, timeout, DEFAULT_MAX_RESPONSE)
        .query_routes(server, query)
        .await
}

/// Extract route objects from a WHOIS response.
///
/// `route:` lines feed IPv4 and `route6:` lines feed IPv6; the value is the
/// last whitespace-separated token after the keyword, or an empty string
/// when there is none. All other lines are ignored.
pub fn parse_routes(text: &str) -> SourceRoutes {
    let mut routes = SourceRoutes::default();

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("route:") {
            routes.ipv4.push(last_token(rest));
        } else if let Some(rest) = line.strip_prefix("route6:") {
            routes.ipv6.push(last_token(rest));
        }
    }

    routes
}

fn last_token(rest: &str) -> String {
    rest.split_whitespace()
        .next_back()
        .unwrap_or_default()
        .to_string()
}
