//! API request and response types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{BatchProcessor, DefaultExtractor, Record, Result, ServiceConfig, TextExtractor};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status
    pub status: String,
    /// API version
    pub version: String,
}

/// Server information response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    pub version: String,
    /// Size of the process-wide worker pool
    pub pool_size: usize,
    pub source_field: String,
    pub target_field: String,
}

/// Transform response: the input records, in order, with their target field set.
pub type TransformResponse = Vec<Record>;

/// API server state.
///
/// Built once at startup. Every request shares the same worker pool, HTTP client
/// and extractor through the cloned `BatchProcessor`.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub processor: BatchProcessor,
}

impl ApiState {
    /// State backed by the built-in extractor.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::with_extractor(config, Arc::new(DefaultExtractor::new()))
    }

    /// State backed by a custom extractor.
    pub fn with_extractor(config: &ServiceConfig, extractor: Arc<dyn TextExtractor>) -> Result<Self> {
        Ok(Self {
            processor: BatchProcessor::new(config, extractor)?,
        })
    }
}
