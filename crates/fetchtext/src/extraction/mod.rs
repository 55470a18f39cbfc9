//! Byte-to-text extraction.
//!
//! The batch orchestrator treats extraction as an opaque capability behind the
//! [`TextExtractor`] trait. [`DefaultExtractor`] covers text-based formats:
//!
//! - plain text, JSON, CSV, Markdown (with encoding detection)
//! - HTML (feature `html`)
//! - XML (feature `xml`)
//!
//! Binary formats it cannot read (PDF, Office, images, ...) produce an
//! `Extraction` error, which the orchestrator treats as a per-document failure.
//! Deployments needing those formats plug in their own `TextExtractor`.
//!
//! # Example
//!
//! ```rust
//! use fetchtext::extraction::{DefaultExtractor, TextExtractor};
//!
//! # #[tokio::main]
//! # async fn main() -> fetchtext::Result<()> {
//! let extractor = DefaultExtractor::new();
//! let text = extractor.extract(b"<root><a>Hello</a></root>").await?;
//! assert_eq!(text, "Hello");
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "html")]
pub mod html;
pub mod text;
#[cfg(feature = "xml")]
pub mod xml;

use async_trait::async_trait;

use crate::core::mime;
use crate::{FetchtextError, Result};

/// Converts raw document bytes to plain text.
///
/// Implementations must be thread-safe: one instance serves every worker of
/// every concurrent batch.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Extract text from a complete document.
    ///
    /// # Errors
    ///
    /// `FetchtextError::Extraction` when the document cannot be converted.
    async fn extract(&self, content: &[u8]) -> Result<String>;
}

/// Built-in extractor for text-based formats.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultExtractor;

impl DefaultExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous conversion used from a blocking worker thread.
    pub fn extract_sync(content: &[u8]) -> Result<String> {
        if content.is_empty() {
            return Ok(String::new());
        }

        let mime_type = mime::detect_mime_type_from_bytes(content);
        tracing::trace!(mime_type, size_bytes = content.len(), "Detected document type");

        match mime_type {
            #[cfg(feature = "html")]
            mime::HTML_MIME_TYPE => html::html_to_text(&text::decode_text(content)),
            #[cfg(feature = "xml")]
            mime::XML_MIME_TYPE => xml::xml_to_text(text::decode_text(content).as_bytes()),
            #[cfg(not(feature = "html"))]
            mime::HTML_MIME_TYPE => Ok(text::decode_text(content)),
            #[cfg(not(feature = "xml"))]
            mime::XML_MIME_TYPE => Ok(text::decode_text(content)),
            other if mime::is_text_mime_type(other) => Ok(text::decode_text(content)),
            other => Err(FetchtextError::extraction(format!("Unsupported format: {}", other))),
        }
    }
}

#[async_trait]
impl TextExtractor for DefaultExtractor {
    fn name(&self) -> &str {
        "default-extractor"
    }

    async fn extract(&self, content: &[u8]) -> Result<String> {
        let owned = content.to_vec();
        tokio::task::spawn_blocking(move || Self::extract_sync(&owned))
            .await
            .map_err(|e| FetchtextError::Other(format!("Extraction task failed: {}", e)))?
    }
}
