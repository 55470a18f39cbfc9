//! Error types for fetchtext.
//!
//! All library operations return [`FetchtextError`]. Component-level enums
//! ([`ResolutionError`](crate::core::source::ResolutionError) and
//! [`FetchError`](crate::core::fetch::FetchError)) carry the per-source
//! classification the batch orchestrator needs; they are folded into
//! `FetchtextError` only when a job escalates to a batch failure.
//!
//! # Error Handling Philosophy
//!
//! **Batch-level errors abort the whole request:**
//! - `UnexpectedStatus` - a remote source answered with a non-2xx, non-404 status
//! - `Io` - system errors, never wrapped or suppressed
//!
//! **Source-level errors are absorbed at the worker boundary:**
//! - `Transport` - DNS, connect, TLS or timeout failures (unless escalated by policy)
//! - `Extraction` - a single document could not be converted to text
//!
//! # Example
//!
//! ```rust
//! use fetchtext::{FetchtextError, Result};
//!
//! fn require_field(name: &str) -> Result<&str> {
//!     if name.is_empty() {
//!         return Err(FetchtextError::validation("field name must not be empty"));
//!     }
//!     Ok(name)
//! }
//! ```
use thiserror::Error;

/// Result type alias using `FetchtextError`.
pub type Result<T> = std::result::Result<T, FetchtextError>;

/// Main error type for all fetchtext operations.
///
/// # Variants
///
/// - `Io` - File system and socket errors (always bubble up)
/// - `Validation` - Invalid configuration, payloads or parameters
/// - `Serialization` - JSON (de)serialization errors
/// - `Transport` - Outbound HTTP failures below the status-code level
/// - `Extraction` - Byte-to-text conversion failures
/// - `UnexpectedStatus` - A remote source returned a status that signals a systemic problem
/// - `Other` - Catch-all for uncommon errors
#[derive(Debug, Error)]
pub enum FetchtextError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Extraction error: {message}")]
    Extraction {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("URL '{url}' returned status code: {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for FetchtextError {
    fn from(err: serde_json::Error) -> Self {
        FetchtextError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl FetchtextError {
    error_constructor!(validation, Validation);
    error_constructor!(serialization, Serialization);
    error_constructor!(transport, Transport);
    error_constructor!(extraction, Extraction);
}
