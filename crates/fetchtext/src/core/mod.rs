//! Core transform orchestration.
//!
//! # Architecture
//!
//! - **Source resolution** (`source`): turning a record's source string into an
//!   embedded payload or a remote URL
//! - **Fetching** (`fetch`): the shared HTTP client and status classification
//! - **Batching** (`batch`): the process-wide worker pool and fail-fast batch runner
//! - **MIME detection** (`mime`): content sniffing for the default extractor
//! - **Configuration** (`config`): layered TOML and environment configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fetchtext::core::{BatchProcessor, ServiceConfig};
//! use fetchtext::extraction::DefaultExtractor;
//!
//! # async fn example() -> fetchtext::Result<()> {
//! let config = ServiceConfig::default();
//! let processor = BatchProcessor::new(&config, Arc::new(DefaultExtractor::new()))?;
//!
//! let record = serde_json::json!({"url": "https://example.com/page.html"});
//! let records = vec![record.as_object().cloned().unwrap_or_default()];
//! let output = processor.run_batch(records).await?;
//! println!("{}", output[0]["_content"]);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod fetch;
pub mod mime;
pub mod source;

pub use batch::BatchProcessor;
pub use config::{AuthConfig, AuthMode, FailurePolicy, ServiceConfig};
pub use fetch::{ContentFetcher, FetchError};
pub use source::{ContentSource, ResolutionError, resolve};
