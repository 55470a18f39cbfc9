//! Content fetching over a shared, pooled HTTP client.
//!
//! The client is built once from [`ServiceConfig`] and reused for the life of the
//! process: timeouts, TLS trust and credentials are fixed at startup, never per
//! request. Basic credentials are sent preemptively; digest credentials answer
//! the server's `401` challenge. `reqwest::Client` is internally reference counted, so cloning a
//! [`ContentFetcher`] shares the same connection pool.

use std::time::Duration;

use diqwest::WithDigestAuth;
use reqwest::{StatusCode, header};
use thiserror::Error;

use crate::core::config::{AuthMode, ServiceConfig};
use crate::core::source::ContentSource;
use crate::{FetchtextError, Result};

/// Failure to retrieve the bytes of a resolved source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote answered 404. Recoverable.
    #[error("URL not found: '{url}'")]
    NotFound { url: String },

    /// Any other non-2xx status. Aborts the batch.
    #[error("URL '{url}' returned status code: {status}")]
    UnexpectedStatus { url: String, status: u16 },

    /// DNS, connect, TLS, timeout or body-read failure. Recoverable by default.
    #[error("Request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FetchError {
    /// Whether this failure aborts the batch regardless of policy.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::UnexpectedStatus { .. })
    }

    fn transport<E>(url: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FetchError::Transport {
            url: url.to_string(),
            source: Box::new(source),
        }
    }
}

impl From<FetchError> for FetchtextError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::UnexpectedStatus { url, status } => FetchtextError::UnexpectedStatus { url, status },
            FetchError::NotFound { .. } => FetchtextError::Other(err.to_string()),
            FetchError::Transport { url, source } => FetchtextError::Transport {
                message: format!("Request to '{}' failed", url),
                source: Some(source),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    Basic,
    Digest,
}

#[derive(Debug, Clone)]
struct Credentials {
    scheme: Scheme,
    username: String,
    password: String,
}

/// Fetches raw document bytes for a [`ContentSource`].
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: reqwest::Client,
    credentials: Option<Credentials>,
}

impl ContentFetcher {
    /// Build the process-wide client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `FetchtextError::Validation` when `ntlm` is configured with
    /// credentials, and `FetchtextError::Transport` if the TLS backend cannot be initialized.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let auth = &config.auth;
        let credentials = match (auth.mode, &auth.username, &auth.password) {
            (AuthMode::None, _, _) => None,
            (AuthMode::Basic, Some(username), Some(password)) => Some(Credentials {
                scheme: Scheme::Basic,
                username: username.clone(),
                password: password.clone(),
            }),
            (AuthMode::Digest, Some(username), Some(password)) => Some(Credentials {
                scheme: Scheme::Digest,
                username: username.clone(),
                password: password.clone(),
            }),
            (AuthMode::Ntlm, Some(_), Some(_)) => {
                return Err(FetchtextError::validation(format!(
                    "Auth mode 'ntlm' is not supported (domain '{}', workstation '{}'); use 'basic' or 'digest'",
                    auth.domain.as_deref().unwrap_or("*"),
                    auth.workstation.as_deref().unwrap_or("*"),
                )));
            }
            (AuthMode::Ntlm, _, _) => {
                tracing::warn!("Auth mode 'ntlm' without credentials; requests are sent unauthenticated");
                None
            }
            (AuthMode::Basic | AuthMode::Digest, _, _) => None,
        };

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.socket_timeout_secs))
            .pool_max_idle_per_host(config.max_idle_connections_per_host)
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(concat!("fetchtext/", env!("CARGO_PKG_VERSION")));

        if config.trust_everything {
            tracing::warn!("TLS certificate and hostname verification disabled (trust_everything = true)");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| FetchtextError::transport_with_source("Failed to create HTTP client", e))?;

        tracing::debug!(
            auth = %config.auth.mode,
            connect_timeout_secs = config.connect_timeout_secs,
            socket_timeout_secs = config.socket_timeout_secs,
            "HTTP client configured"
        );

        Ok(Self { client, credentials })
    }

    /// Retrieve the bytes behind a source.
    ///
    /// Embedded sources are returned without any I/O.
    pub async fn fetch(&self, source: ContentSource) -> std::result::Result<Vec<u8>, FetchError> {
        match source {
            ContentSource::Embedded(bytes) => Ok(bytes),
            ContentSource::Remote(url) => self.get(url).await,
        }
    }

    async fn get(&self, url: reqwest::Url) -> std::result::Result<Vec<u8>, FetchError> {
        let url_str = url.to_string();

        let request = self.client.get(url).header(header::CONNECTION, "keep-alive");
        let response = match &self.credentials {
            Some(creds) if creds.scheme == Scheme::Digest => request
                .send_with_digest_auth(&creds.username, &creds.password)
                .await
                .map_err(|e| FetchError::transport(&url_str, e))?,
            Some(creds) => request
                .basic_auth(&creds.username, Some(&creds.password))
                .send()
                .await
                .map_err(|e| FetchError::transport(&url_str, e))?,
            None => request.send().await.map_err(|e| FetchError::transport(&url_str, e))?,
        };

        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await.map_err(|e| FetchError::transport(&url_str, e))?;
            return Ok(body.to_vec());
        }

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { url: url_str });
        }

        Err(FetchError::UnexpectedStatus {
            url: url_str,
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AuthConfig;

    #[test]
    fn test_new_with_defaults() {
        let fetcher = ContentFetcher::new(&ServiceConfig::default()).unwrap();
        assert!(fetcher.credentials.is_none());
    }

    #[test]
    fn test_basic_credentials_require_both_parts() {
        let mut config = ServiceConfig::default();
        config.auth.username = Some("alice".to_string());
        assert!(ContentFetcher::new(&config).unwrap().credentials.is_none());

        config.auth.password = Some("secret".to_string());
        let creds = ContentFetcher::new(&config).unwrap().credentials.unwrap();
        assert_eq!(creds.scheme, Scheme::Basic);
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_none_mode_ignores_credentials() {
        let config = ServiceConfig {
            auth: AuthConfig {
                mode: AuthMode::None,
                username: Some("alice".to_string()),
                password: Some("secret".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(ContentFetcher::new(&config).unwrap().credentials.is_none());
    }

    fn with_auth(mode: AuthMode, username: Option<&str>, password: Option<&str>) -> ServiceConfig {
        ServiceConfig {
            auth: AuthConfig {
                mode,
                username: username.map(str::to_string),
                password: password.map(str::to_string),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_digest_credentials() {
        let fetcher = ContentFetcher::new(&with_auth(AuthMode::Digest, Some("alice"), Some("secret"))).unwrap();
        let creds = fetcher.credentials.unwrap();
        assert_eq!(creds.scheme, Scheme::Digest);
        assert_eq!(creds.username, "alice");

        let fetcher = ContentFetcher::new(&with_auth(AuthMode::Digest, None, None)).unwrap();
        assert!(fetcher.credentials.is_none());
    }

    #[test]
    fn test_ntlm_without_credentials_builds() {
        let fetcher = ContentFetcher::new(&with_auth(AuthMode::Ntlm, None, None)).unwrap();
        assert!(fetcher.credentials.is_none());
        assert!(ContentFetcher::new(&with_auth(AuthMode::Ntlm, Some("alice"), None)).is_ok());
    }

    #[test]
    fn test_ntlm_with_credentials_rejected() {
        let mut config = with_auth(AuthMode::Ntlm, Some("alice"), Some("secret"));
        config.auth.domain = Some("CORP".to_string());
        let err = ContentFetcher::new(&config).unwrap_err();
        assert!(matches!(err, FetchtextError::Validation { .. }));
        assert!(err.to_string().contains("ntlm"));
        assert!(err.to_string().contains("CORP"));
    }

    #[test]
    fn test_trust_everything_builds() {
        let config = ServiceConfig {
            trust_everything: true,
            ..Default::default()
        };
        assert!(ContentFetcher::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_embedded_source_needs_no_io() {
        let fetcher = ContentFetcher::new(&ServiceConfig::default()).unwrap();
        let bytes = fetcher.fetch(ContentSource::Embedded(b"inline".to_vec())).await.unwrap();
        assert_eq!(bytes, b"inline");
    }

    #[test]
    fn test_fetch_error_fatality() {
        assert!(
            FetchError::UnexpectedStatus {
                url: "http://x/".to_string(),
                status: 500
            }
            .is_fatal()
        );
        assert!(
            !FetchError::NotFound {
                url: "http://x/".to_string()
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_transport_converts_with_source() {
        let err: FetchtextError = FetchError::transport("http://x/", std::io::Error::other("reset")).into();
        assert!(matches!(err, FetchtextError::Transport { source: Some(_), .. }));
        assert!(err.to_string().contains("http://x/"));
    }

    #[test]
    fn test_unexpected_status_converts() {
        let err: FetchtextError = FetchError::UnexpectedStatus {
            url: "http://x/boom".to_string(),
            status: 503,
        }
        .into();
        assert!(matches!(err, FetchtextError::UnexpectedStatus { status: 503, .. }));
    }
}
