//! API request handlers.

use axum::{Json, body::Bytes, extract::State};

use crate::types::parse_records;

use super::{
    error::ApiError,
    types::{ApiState, HealthResponse, InfoResponse, TransformResponse},
};

/// Transform endpoint handler.
///
/// POST /transform
///
/// Accepts a JSON object or an array of objects. Each record's source field is
/// fetched and its text written to the target field; the records are returned in
/// input order.
///
/// Responses:
/// - `200` with the JSON array of records
/// - `400` (`text/plain`) if the body is not a JSON object or array
/// - `500` (`text/plain`) if any record hit a non-recoverable error
///
/// Body size is limited at the router layer; oversized requests get `413`.
pub async fn transform_handler(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<TransformResponse>, ApiError> {
    let records = parse_records(&body).map_err(ApiError::bad_request)?;
    let output = state.processor.run_batch(records).await.map_err(ApiError::fatal)?;
    Ok(Json(output))
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Server info endpoint handler.
///
/// GET /info
pub async fn info_handler(State(state): State<ApiState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        pool_size: state.processor.pool_size(),
        source_field: state.processor.source_field().to_string(),
        target_field: state.processor.target_field().to_string(),
    })
}
