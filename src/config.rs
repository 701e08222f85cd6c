//! Configuration management for blocklister.

use anyhow::{Context, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::routes::AddressFamily;

/// Reserved for the files the publisher assembles from all sources.
const RESERVED_SOURCE_NAMES: &[&str] = &["combined"];

const DEFAULT_JSON_PREFIX: &str = "prefixes";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// What to do when a single source fails
    pub on_source_error: FailurePolicy,

    /// Network limits applied to every upstream
    pub fetch: FetchSettings,

    /// Sources in file order
    #[serde(deserialize_with = "deserialize_sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from YAML text without validating it
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            anyhow::bail!("No sources configured");
        }

        for source in &self.sources {
            source.validate()?;
        }

        if self.fetch.http_timeout_secs == 0 {
            anyhow::bail!("fetch.http_timeout_secs must be greater than zero");
        }
        if self.fetch.whois_timeout_secs == 0 {
            anyhow::bail!("fetch.whois_timeout_secs must be greater than zero");
        }
        if self.fetch.max_response_bytes == 0 {
            anyhow::bail!("fetch.max_response_bytes must be greater than zero");
        }

        Ok(())
    }

    /// Look up a source by name
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Example configuration shipped with the crate
    pub fn example_yaml() -> &'static str {
        include_str!("../config.example.yaml")
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the whole run at the first failing source
    #[default]
    Abort,
    /// Log the failure and move on to the next source
    Continue,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FetchSettings {
    pub http_timeout_secs: u64,
    pub whois_timeout_secs: u64,
    pub whois_port: u16,
    /// Upper bound for a single HTTP body or WHOIS response
    pub max_response_bytes: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            http_timeout_secs: 30,
            whois_timeout_secs: 30,
            whois_port: 43,
            max_response_bytes: 10 * 1024 * 1024,
        }
    }
}

impl FetchSettings {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn whois_timeout(&self) -> Duration {
        Duration::from_secs(self.whois_timeout_secs)
    }
}

/// One upstream and the mechanisms used to query it
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Filled from the mapping key
    #[serde(skip)]
    pub name: String,

    pub ipv4: Option<Vec<String>>,
    pub ipv6: Option<Vec<String>>,

    /// JSON endpoint
    pub json: Option<String>,
    pub ipv4_prefix: Option<String>,
    pub ipv6_prefix: Option<String>,
    pub ipv4_field: Option<String>,
    pub ipv6_field: Option<String>,

    /// WHOIS server hostname
    pub whois: Option<String>,
    pub query: Option<String>,
}

impl SourceConfig {
    /// Static entries configured for a family
    pub fn static_routes(&self, family: AddressFamily) -> &[String] {
        let list = match family {
            AddressFamily::V4 => &self.ipv4,
            AddressFamily::V6 => &self.ipv6,
        };
        list.as_deref().unwrap_or_default()
    }

    /// Top-level JSON key holding the array to scan
    pub fn json_prefix(&self, family: AddressFamily) -> &str {
        let prefix = match family {
            AddressFamily::V4 => &self.ipv4_prefix,
            AddressFamily::V6 => &self.ipv6_prefix,
        };
        prefix.as_deref().unwrap_or(DEFAULT_JSON_PREFIX)
    }

    /// Key inside each array element holding the prefix string
    pub fn json_field(&self, family: AddressFamily) -> String {
        let field = match family {
            AddressFamily::V4 => &self.ipv4_field,
            AddressFamily::V6 => &self.ipv6_field,
        };
        field
            .clone()
            .unwrap_or_else(|| format!("ipv{}Prefix", family.number()))
    }

    /// Names of the mechanisms this source uses, in fetch order
    pub fn mechanisms(&self) -> Vec<&'static str> {
        let mut mechanisms = Vec::new();
        if self.ipv4.is_some() || self.ipv6.is_some() {
            mechanisms.push("static");
        }
        if self.json.is_some() {
            mechanisms.push("json");
        }
        if self.whois.is_some() {
            mechanisms.push("whois");
        }
        mechanisms
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_source_name(&self.name) {
            anyhow::bail!(
                "Invalid source name '{}'. Use letters, digits, '.', '-' or '_'",
                self.name
            );
        }
        if RESERVED_SOURCE_NAMES.contains(&self.name.as_str()) {
            anyhow::bail!("Source name '{}' is reserved", self.name);
        }

        if self.mechanisms().is_empty() {
            anyhow::bail!(
                "Source '{}' has no ipv4, ipv6, json or whois entry",
                self.name
            );
        }

        if let Some(ref url) = self.json {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                anyhow::bail!(
                    "Source '{}' json URL must use http or https: {}",
                    self.name,
                    url
                );
            }
        }

        if let Some(ref server) = self.whois {
            if server.trim().is_empty() {
                anyhow::bail!("Source '{}' has an empty whois server", self.name);
            }
            if self.query.as_deref().map_or(true, |q| q.trim().is_empty()) {
                anyhow::bail!("Source '{}' sets whois but no query", self.name);
            }
        }

        Ok(())
    }
}

/// Source names become file names, so keep them to a safe alphabet
fn is_valid_source_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._-".contains(c))
}

/// Deserialize the `sources` mapping into a list that keeps file order
fn deserialize_sources<'de, D>(deserializer: D) -> Result<Vec<SourceConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SourcesVisitor;

    impl<'de> Visitor<'de> for SourcesVisitor {
        type Value = Vec<SourceConfig>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping of source names to source settings")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut sources: Vec<SourceConfig> = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, mut source)) = map.next_entry::<String, SourceConfig>()? {
                if sources.iter().any(|s| s.name == name) {
                    return Err(de::Error::custom(format!("duplicate source '{}'", name)));
                }
                source.name = name;
                sources.push(source);
            }
            Ok(sources)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(SourcesVisitor)
}
