//! Service configuration loading and management.
//!
//! Configuration is assembled in layers:
//!
//! 1. built-in defaults
//! 2. a TOML file (explicit path, or `fetchtext.toml` discovered in the current
//!    directory or any parent)
//! 3. environment variables, which override the file
//!
//! Every value is optional. Environment values that fail to parse are logged and
//! ignored, so a typo never prevents the service from starting with defaults.

use crate::{FetchtextError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

pub const CONFIG_FILE_NAME: &str = "fetchtext.toml";

const DEFAULT_MAX_REQUEST_BODY_BYTES: usize = 100 * 1024 * 1024;

/// Main service configuration.
///
/// # Example
///
/// ```rust
/// use fetchtext::core::config::ServiceConfig;
///
/// let config = ServiceConfig::default();
/// assert_eq!(config.pool_size, 8);
/// assert_eq!(config.source_field, "url");
/// assert_eq!(config.target_field, "_content");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Size of the process-wide worker pool. Bounds outbound concurrency
    /// across all requests, not per request.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Maximum time without traffic on an established connection.
    #[serde(default = "default_socket_timeout_secs")]
    pub socket_timeout_secs: u64,

    /// Maximum time to establish a connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Record field holding the content source.
    #[serde(default = "default_source_field")]
    pub source_field: String,

    /// Record field receiving the extracted text.
    #[serde(default = "default_target_field")]
    pub target_field: String,

    #[serde(default)]
    pub auth: AuthConfig,

    /// Accept any TLS certificate and skip hostname verification.
    #[serde(default)]
    pub trust_everything: bool,

    /// Idle keep-alive connections kept per host in the client pool. Active
    /// connections per host are bounded only by the worker pool size.
    #[serde(default = "default_max_idle_connections_per_host")]
    pub max_idle_connections_per_host: usize,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Maximum accepted size of a `/transform` request body.
    #[serde(default = "default_max_request_body_bytes")]
    pub max_request_body_bytes: usize,
}

/// Outbound authentication settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// NTLM domain. Default (unset) is all domains. Unused until NTLM is supported.
    #[serde(default)]
    pub domain: Option<String>,
    /// NTLM workstation the authentication request originates from.
    #[serde(default)]
    pub workstation: Option<String>,
}

/// Outbound authentication scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    None,
    #[default]
    Basic,
    Digest,
    Ntlm,
}

impl FromStr for AuthMode {
    type Err = FetchtextError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(AuthMode::None),
            "basic" => Ok(AuthMode::Basic),
            "digest" => Ok(AuthMode::Digest),
            "ntlm" => Ok(AuthMode::Ntlm),
            other => Err(FetchtextError::validation(format!(
                "Unknown auth mode '{}', expected one of: none, basic, digest, ntlm",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AuthMode::None => "none",
            AuthMode::Basic => "basic",
            AuthMode::Digest => "digest",
            AuthMode::Ntlm => "ntlm",
        };
        f.write_str(name)
    }
}

/// Which per-source failures escalate to a batch failure.
///
/// An unexpected HTTP status always aborts the batch. Transport and extraction
/// failures are skipped unless escalated here.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FailurePolicy {
    #[serde(default)]
    pub fatal_on_transport_error: bool,
    #[serde(default)]
    pub fatal_on_extraction_error: bool,
}

fn default_pool_size() -> usize {
    8
}

fn default_socket_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_source_field() -> String {
    "url".to_string()
}

fn default_target_field() -> String {
    "_content".to_string()
}

fn default_max_idle_connections_per_host() -> usize {
    30
}

fn default_max_request_body_bytes() -> usize {
    DEFAULT_MAX_REQUEST_BODY_BYTES
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            socket_timeout_secs: default_socket_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            source_field: default_source_field(),
            target_field: default_target_field(),
            auth: AuthConfig::default(),
            trust_everything: false,
            max_idle_connections_per_host: default_max_idle_connections_per_host(),
            failure_policy: FailurePolicy::default(),
            max_request_body_bytes: default_max_request_body_bytes(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `FetchtextError::Validation` if the file can't be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            FetchtextError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| FetchtextError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Discover `fetchtext.toml` in the current directory or its parents.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(FetchtextError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Full layered load: file (explicit or discovered), then environment,
    /// then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::from_toml_file(path)?
            }
            None => match Self::discover()? {
                Some(config) => {
                    tracing::info!("Loaded configuration from discovered {}", CONFIG_FILE_NAME);
                    config
                }
                None => {
                    tracing::info!("No config file found, using defaults and environment");
                    Self::default()
                }
            },
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override fields from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Override fields from an arbitrary key/value lookup.
    ///
    /// Recognized keys: `THREADS`, `SOCKET_TIMEOUT`, `CONNECTION_TIMEOUT`,
    /// `SOURCE_PROPERTY`, `TARGET_PROPERTY`, `AUTH_TYPE`, `USERNAME`, `PASSWORD`,
    /// `DOMAIN`, `WORKSTATION`, `TRUST_EVERYTHING`, `MAX_IDLE_CONNECTIONS_PER_HOST`,
    /// `FATAL_ON_TRANSPORT_ERROR`, `FATAL_ON_EXTRACTION_ERROR`,
    /// `FETCHTEXT_MAX_REQUEST_BODY_BYTES`.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "THREADS") {
            self.pool_size = v;
        }
        if let Some(v) = parse_var(&lookup, "SOCKET_TIMEOUT") {
            self.socket_timeout_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "CONNECTION_TIMEOUT") {
            self.connect_timeout_secs = v;
        }
        if let Some(v) = lookup("SOURCE_PROPERTY") {
            self.source_field = v;
        }
        if let Some(v) = lookup("TARGET_PROPERTY") {
            self.target_field = v;
        }
        if let Some(v) = parse_var(&lookup, "AUTH_TYPE") {
            self.auth.mode = v;
        }
        if let Some(v) = lookup("USERNAME") {
            self.auth.username = Some(v);
        }
        if let Some(v) = lookup("PASSWORD") {
            self.auth.password = Some(v);
        }
        if let Some(v) = lookup("DOMAIN") {
            self.auth.domain = Some(v);
        }
        if let Some(v) = lookup("WORKSTATION") {
            self.auth.workstation = Some(v);
        }
        if let Some(v) = lookup("TRUST_EVERYTHING") {
            self.trust_everything = parse_flag(&v);
        }
        if let Some(v) = parse_var(&lookup, "MAX_IDLE_CONNECTIONS_PER_HOST") {
            self.max_idle_connections_per_host = v;
        }
        if let Some(v) = lookup("FATAL_ON_TRANSPORT_ERROR") {
            self.failure_policy.fatal_on_transport_error = parse_flag(&v);
        }
        if let Some(v) = lookup("FATAL_ON_EXTRACTION_ERROR") {
            self.failure_policy.fatal_on_extraction_error = parse_flag(&v);
        }
        if let Some(v) = parse_var::<usize, _>(&lookup, "FETCHTEXT_MAX_REQUEST_BODY_BYTES") {
            if v > 0 {
                self.max_request_body_bytes = v;
            } else {
                tracing::warn!("Invalid FETCHTEXT_MAX_REQUEST_BODY_BYTES value (must be > 0)");
            }
        }
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(FetchtextError::validation("pool_size must be greater than 0"));
        }
        if self.source_field.is_empty() || self.target_field.is_empty() {
            return Err(FetchtextError::validation("source and target field names must not be empty"));
        }
        if self.source_field == self.target_field {
            return Err(FetchtextError::validation(format!(
                "source and target field must differ (both are '{}')",
                self.source_field
            )));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key)?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Failed to parse {}='{}', keeping previous value: {}", key, value, e);
            None
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
