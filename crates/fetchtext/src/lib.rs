//! fetchtext - batch text extraction for JSON records
//!
//! Each input record names a content source in one of its fields: either an
//! inline payload (`~b` followed by base64) or an `http`/`https` URL, optionally
//! prefixed with `~r`. fetchtext fetches every source concurrently on a bounded,
//! process-wide worker pool, extracts plain text from the bytes and writes it into
//! a target field of the same record.
//!
//! A batch either succeeds as a whole, with records returned in input order, or
//! fails as a whole on the first non-recoverable error.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fetchtext::{BatchProcessor, DefaultExtractor, ServiceConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> fetchtext::Result<()> {
//! let config = ServiceConfig::load(None)?;
//! let processor = BatchProcessor::new(&config, Arc::new(DefaultExtractor::new()))?;
//!
//! let input: Vec<fetchtext::Record> = serde_json::from_str(r#"[{"url": "~baGVsbG8="}]"#)?;
//! let output = processor.run_batch(input).await?;
//! assert_eq!(output[0]["_content"], "hello");
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): source resolution, fetching, batching, configuration
//! - **Extraction** (`extraction`): the `TextExtractor` seam and built-in extractor
//! - **API** (`api`, feature `api`): the HTTP service

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod extraction;
pub mod types;

#[cfg(feature = "api")]
pub mod api;

pub use error::{FetchtextError, Result};
pub use types::*;

pub use core::batch::BatchProcessor;
pub use core::config::{AuthConfig, AuthMode, CONFIG_FILE_NAME, FailurePolicy, ServiceConfig};
pub use core::source::{ContentSource, resolve};
pub use extraction::{DefaultExtractor, TextExtractor};
