//! API server setup and configuration.

use std::net::{IpAddr, SocketAddr};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{FetchtextError, Result, ServiceConfig};

use super::{
    handlers::{health_handler, info_handler, transform_handler},
    types::ApiState,
};

/// Create the API router from configuration, using the built-in extractor.
///
/// Builds the worker pool and HTTP client; call once per process.
///
/// # Errors
///
/// Returns `FetchtextError::Validation` for an invalid configuration.
///
/// # Examples
///
/// ```no_run
/// use fetchtext::{ServiceConfig, api::create_router};
///
/// # fn main() -> fetchtext::Result<()> {
/// let router = create_router(&ServiceConfig::default())?;
/// let app = axum::Router::new().nest("/api", router);
/// # Ok(())
/// # }
/// ```
pub fn create_router(config: &ServiceConfig) -> Result<Router> {
    let state = ApiState::from_config(config)?;
    Ok(create_router_with_state(state, config.max_request_body_bytes))
}

/// Create the API router around prepared state.
pub fn create_router_with_state(state: ApiState, max_request_body_bytes: usize) -> Router {
    Router::new()
        .route("/transform", post(transform_handler))
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .layer(DefaultBodyLimit::max(max_request_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_request_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server.
///
/// # Arguments
///
/// * `host` - IP address to bind to (e.g., "127.0.0.1" or "0.0.0.0")
/// * `port` - Port number to bind to (e.g., 8000)
/// * `config` - Service configuration, typically from [`ServiceConfig::load`]
///
/// # Examples
///
/// ```no_run
/// use fetchtext::{ServiceConfig, api::serve};
///
/// #[tokio::main]
/// async fn main() -> fetchtext::Result<()> {
///     let config = ServiceConfig::load(None)?;
///     serve("0.0.0.0", 8000, config).await
/// }
/// ```
pub async fn serve(host: impl AsRef<str>, port: u16, config: ServiceConfig) -> Result<()> {
    let ip: IpAddr = host
        .as_ref()
        .parse()
        .map_err(|e| FetchtextError::validation(format!("Invalid host address: {}", e)))?;

    let addr = SocketAddr::new(ip, port);
    let app = create_router(&config)?;

    tracing::info!(
        pool_size = config.pool_size,
        source_field = %config.source_field,
        target_field = %config.target_field,
        "Starting fetchtext API server on http://{}:{}",
        ip,
        port
    );

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(FetchtextError::Io)?;

    axum::serve(listener, app)
        .await
        .map_err(|e| FetchtextError::Other(e.to_string()))?;

    Ok(())
}
