use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::core::source::ResolutionError;
use crate::error::{FetchtextError, Result};

/// A single JSON object from the request payload.
///
/// Key order is irrelevant; the position of the record in its batch is not.
pub type Record = Map<String, Value>;

/// One unit of work: a record plus the field names it is processed with.
///
/// The job owns its record for the duration of the batch, so exactly one
/// worker can mutate it.
#[derive(Debug)]
pub struct Job {
    pub index: usize,
    pub record: Record,
    pub source_field: Arc<str>,
    pub target_field: Arc<str>,
}

impl Job {
    pub fn new(index: usize, record: Record, source_field: Arc<str>, target_field: Arc<str>) -> Self {
        Self {
            index,
            record,
            source_field,
            target_field,
        }
    }

    /// The content-source string of this job's record.
    ///
    /// Strings are used as-is; numbers and booleans are rendered to their JSON
    /// text. Missing, `null`, array and object values are not sources.
    pub fn source(&self) -> std::result::Result<String, SkipReason> {
        match self.record.get(self.source_field.as_ref()) {
            None => Err(SkipReason::MissingSource),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(_) => Err(SkipReason::NonScalarSource),
        }
    }

    /// Write the extracted text (or `null`) into the target field.
    pub fn set_target(&mut self, content: Option<String>) {
        let value = content.map(Value::String).unwrap_or(Value::Null);
        self.record.insert(self.target_field.to_string(), value);
    }
}

/// Why a job produced no content without failing the batch.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("source field is missing")]
    MissingSource,

    #[error("source field is not a scalar value")]
    NonScalarSource,

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("URL not found: '{0}'")]
    NotFound(String),

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Extraction(String),
}

impl SkipReason {
    /// Whether the record had a usable source and therefore gets an explicit
    /// `null` in its target field.
    pub fn nulls_target(&self) -> bool {
        !matches!(self, SkipReason::MissingSource | SkipReason::NonScalarSource)
    }
}

/// The result of running one job.
#[derive(Debug)]
pub enum JobOutcome {
    /// Text was extracted (possibly empty) and written to the target field.
    Success(String),
    /// The source was absent or unusable; the batch continues.
    Skipped(SkipReason),
    /// The batch must be aborted.
    Fatal(FetchtextError),
}

/// Parse a batch payload: a single JSON object or an array of objects.
///
/// Array elements that are not objects are dropped. Any other JSON value, or
/// bytes that are not JSON at all, are rejected.
pub fn parse_records(payload: &[u8]) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| FetchtextError::validation_with_source(format!("Malformed JSON payload: {}", e), e))?;

    match value {
        Value::Object(record) => Ok(vec![record]),
        Value::Array(items) => {
            let total = items.len();
            let records: Vec<Record> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect();
            if records.len() < total {
                tracing::debug!(dropped = total - records.len(), "Ignoring non-object array elements");
            }
            Ok(records)
        }
        _ => Err(FetchtextError::validation(
            "Payload must be a JSON object or an array of objects",
        )),
    }
}
