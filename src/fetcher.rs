//! Route collection for one configured source.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{FetchSettings, SourceConfig};
use crate::error::FetchError;
use crate::routes::{AddressFamily, RouteSet, SourceRoutes};
use crate::whois::WhoisClient;

#[cfg(test)]
use mockall::automock;

/// Anything able to turn a source configuration into routes.
///
/// The pipeline only depends on this trait, so it can be driven by mocks.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SourceFetcher {
    async fn fetch_source(&self, source: &SourceConfig) -> Result<SourceRoutes, FetchError>;
}

/// HTTP and WHOIS backed fetcher
pub struct Fetcher {
    client: Client,
    whois: WhoisClient,
    max_response_bytes: usize,
}

impl Fetcher {
    /// Create a new fetcher from the configured limits
    pub fn new(settings: &FetchSettings) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .timeout(settings.http_timeout())
            .user_agent(format!("blocklister/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            whois: WhoisClient::new(
                settings.whois_port,
                settings.whois_timeout(),
                settings.max_response_bytes,
            ),
            max_response_bytes: settings.max_response_bytes,
        })
    }

    /// GET a JSON document, enforcing status and size limits
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let network = |message: String| FetchError::Network {
            url: url.to_string(),
            message,
        };

        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network(describe_reqwest_error(&e)))?;

        if !response.status().is_success() {
            return Err(network(format!("HTTP {}", response.status())));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_response_bytes as u64 {
                return Err(network(format!(
                    "Response too large: {} bytes (max: {} bytes)",
                    content_length, self.max_response_bytes
                )));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| network(describe_reqwest_error(&e)))?;

        // Content-Length may be absent or wrong
        if body.len() > self.max_response_bytes {
            return Err(network(format!(
                "Downloaded content too large: {} bytes (max: {} bytes)",
                body.len(),
                self.max_response_bytes
            )));
        }

        serde_json::from_slice(&body).map_err(|e| FetchError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl SourceFetcher for Fetcher {
    /// Static entries first, then the JSON endpoint, then WHOIS.
    async fn fetch_source(&self, source: &SourceConfig) -> Result<SourceRoutes, FetchError> {
        let mut routes = SourceRoutes::default();

        for family in AddressFamily::ALL {
            routes
                .get_mut(family)
                .extend_from_slice(source.static_routes(family));
        }

        if let Some(ref url) = source.json {
            let document = self.fetch_json(url).await?;
            for family in AddressFamily::ALL {
                let found = extract_json_routes(
                    &document,
                    source.json_prefix(family),
                    &source.json_field(family),
                )
                .map_err(|message| FetchError::Parse {
                    url: url.clone(),
                    message,
                })?;
                debug!("{}: {} {} entries from JSON", source.name, found.len(), family);
                routes.get_mut(family).extend(found);
            }
        }

        if let Some(ref server) = source.whois {
            let query = source.query.as_deref().unwrap_or_default();
            info!("Querying {} for {}...", server, source.name);
            let found = self.whois.query_routes(server, query).await?;
            routes.append(found);
        }

        Ok(routes)
    }
}

/// Collect the values at `field` from every element of the top-level array
/// `prefix`.
///
/// A missing top-level key or a non-array value is an error. Elements that
/// lack the field, or hold a falsy value there, are skipped. Other
/// non-string values are skipped with a warning.
pub fn extract_json_routes(document: &Value, prefix: &str, field: &str) -> Result<RouteSet, String> {
    let entries = document
        .get(prefix)
        .ok_or_else(|| format!("missing top-level key '{}'", prefix))?
        .as_array()
        .ok_or_else(|| format!("top-level key '{}' is not an array", prefix))?;

    let mut routes = RouteSet::new();
    for entry in entries {
        match entry.get(field) {
            Some(Value::String(s)) if !s.is_empty() => routes.push(s.clone()),
            Some(value) if is_truthy(value) => {
                warn!("Skipping non-string '{}' value: {}", field, value);
            }
            _ => {}
        }
    }

    Ok(routes)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn describe_reqwest_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}
