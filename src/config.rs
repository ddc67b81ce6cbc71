use crate::codec::MappingCodec;
use crate::error::Error;
use crate::policy::FieldPolicy;
use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Connection and mapping settings for a [`DataSource`](crate::DataSource).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (`DATABASE_URL`)
    #[serde(default)]
    pub url: Option<String>,
    /// Pool size (`DATABASE_MAX_CONNECTIONS`)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection (`DATABASE_ACQUIRE_TIMEOUT_SECS`)
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Store mapping fields as XML instead of JSON (`DATABASE_XML`)
    #[serde(default)]
    pub xml: bool,
    /// Fail on per-field errors instead of skipping the field (`DATABASE_STRICT_FIELDS`)
    #[serde(default)]
    pub strict_fields: bool,
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_acquire_timeout_secs() -> u64 {
    DEFAULT_ACQUIRE_TIMEOUT_SECS
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            xml: false,
            strict_fields: false,
        }
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            acquire_timeout_secs: lookup("DATABASE_ACQUIRE_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            xml: lookup("DATABASE_XML").is_some_and(|s| parse_flag(&s)),
            strict_fields: lookup("DATABASE_STRICT_FIELDS").is_some_and(|s| parse_flag(&s)),
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] when no URL is set.
    pub fn url(&self) -> crate::Result<&str> {
        self.url
            .as_deref()
            .ok_or_else(|| Error::Config("DATABASE_URL is not set".into()))
    }

    pub fn codec(&self) -> MappingCodec {
        if self.xml {
            MappingCodec::Xml
        } else {
            MappingCodec::Json
        }
    }

    pub fn policy(&self) -> FieldPolicy {
        if self.strict_fields {
            FieldPolicy::Strict
        } else {
            FieldPolicy::Lenient
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
