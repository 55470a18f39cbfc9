//! Content-source classification and normalization.
//!
//! A content source is one of:
//!
//! - `"~b" + base64(bytes)` - the document travels inline with the record
//! - `"~r" + uri` - a remote reference; the marker is stripped and has no other effect
//! - a bare `uri`
//!
//! Only `http` and `https` URLs resolve.
//!
//! # Example
//!
//! ```rust
//! use fetchtext::core::source::{ContentSource, resolve};
//!
//! let source = resolve("~bSGVsbG8=").unwrap();
//! assert_eq!(source, ContentSource::Embedded(b"Hello".to_vec()));
//!
//! let source = resolve("~rhttps://example.com/doc.pdf").unwrap();
//! assert!(matches!(source, ContentSource::Remote(_)));
//! ```

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use reqwest::Url;
use thiserror::Error;

pub const EMBEDDED_MARKER: &str = "~b";
pub const REFERENCE_MARKER: &str = "~r";
pub const SUPPORTED_SCHEMES: &[&str] = &["http", "https"];

/// Standard alphabet; trailing `=` padding is optional.
const EMBEDDED_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A resolved content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Already-decoded document bytes.
    Embedded(Vec<u8>),
    /// A URL whose scheme is one of [`SUPPORTED_SCHEMES`].
    Remote(Url),
}

/// A source string that cannot be turned into a [`ContentSource`].
///
/// Both variants are recoverable: the record is skipped, the batch goes on.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Invalid Base64 encoded string: '{payload}'")]
    InvalidEncoding {
        payload: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Invalid URL: '{raw}' ({reason})")]
    UnsupportedScheme { raw: String, reason: String },
}

/// Classify and normalize a raw content-source string.
pub fn resolve(raw: &str) -> Result<ContentSource, ResolutionError> {
    if let Some(payload) = raw.strip_prefix(EMBEDDED_MARKER) {
        return EMBEDDED_ENGINE
            .decode(payload)
            .map(ContentSource::Embedded)
            .map_err(|source| ResolutionError::InvalidEncoding {
                payload: payload.to_string(),
                source,
            });
    }

    let location = raw.strip_prefix(REFERENCE_MARKER).unwrap_or(raw);
    parse_remote(raw, location).map(ContentSource::Remote)
}

fn parse_remote(raw: &str, location: &str) -> Result<Url, ResolutionError> {
    let url = Url::parse(location).map_err(|e| ResolutionError::UnsupportedScheme {
        raw: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(ResolutionError::UnsupportedScheme {
            raw: raw.to_string(),
            reason: format!("unsupported URL scheme '{}'", url.scheme()),
        });
    }

    Ok(url)
}
