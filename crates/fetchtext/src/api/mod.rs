//! HTTP service for batch text extraction.
//!
//! # Endpoints
//!
//! - `POST /transform` - Fetch and extract the source of every record in the body
//! - `GET /health` - Health check endpoint
//! - `GET /info` - Server information
//!
//! # Examples
//!
//! ## Starting the server
//!
//! ```no_run
//! use fetchtext::{ServiceConfig, api::serve};
//!
//! #[tokio::main]
//! async fn main() -> fetchtext::Result<()> {
//!     serve("127.0.0.1", 8000, ServiceConfig::load(None)?).await
//! }
//! ```
//!
//! # cURL Examples
//!
//! ```bash
//! # Single record
//! curl -H 'Content-Type: application/json' \
//!      -d '{"url": "https://example.com/"}' http://localhost:8000/transform
//!
//! # Batch with an embedded payload
//! curl -H 'Content-Type: application/json' \
//!      -d '[{"url": "~baGVsbG8="}, {"url": "~rhttps://example.com/a.xml"}]' \
//!      http://localhost:8000/transform
//!
//! # Health check
//! curl http://localhost:8000/health
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::{ApiError, FATAL_RESPONSE_BODY};
pub use server::{create_router, create_router_with_state, serve};
pub use types::{ApiState, HealthResponse, InfoResponse, TransformResponse};
