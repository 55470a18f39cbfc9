//! Concurrent batch orchestration.
//!
//! A batch is the ordered list of records from one request. Every record becomes
//! a [`Job`] that runs on the process-wide worker pool:
//!
//! 1. jobs are dispatched in input order, each holding one pool permit while it runs
//! 2. a worker resolves the record's source, fetches it, extracts text and writes
//!    the text (or `null`) into the record's target field
//! 3. the first fatal outcome cancels the batch: nothing further is dispatched,
//!    jobs already running finish in the background and their results are dropped
//! 4. otherwise records are reassembled by job index, so output order always
//!    matches input order
//!
//! The pool is a [`Semaphore`] shared by every request, so the number of jobs in
//! flight across the whole process never exceeds the configured pool size.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::core::config::{FailurePolicy, ServiceConfig};
use crate::core::fetch::{ContentFetcher, FetchError};
use crate::core::source::resolve;
use crate::extraction::TextExtractor;
use crate::types::{Job, JobOutcome, Record, SkipReason};
use crate::{FetchtextError, Result};

/// Process-scoped batch runner.
///
/// Cheap to clone; clones share the worker pool, HTTP client and extractor.
#[derive(Clone)]
pub struct BatchProcessor {
    pool: Arc<Semaphore>,
    pool_size: usize,
    worker: Arc<Worker>,
    source_field: Arc<str>,
    target_field: Arc<str>,
}

struct Worker {
    fetcher: ContentFetcher,
    extractor: Arc<dyn TextExtractor>,
    policy: FailurePolicy,
}

struct CompletedJob {
    index: usize,
    record: Record,
    fatal: Option<FetchtextError>,
}

impl std::fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("pool_size", &self.pool_size)
            .field("available_permits", &self.pool.available_permits())
            .field("source_field", &self.source_field)
            .field("target_field", &self.target_field)
            .field("extractor", &self.worker.extractor.name())
            .finish()
    }
}

impl BatchProcessor {
    /// Build the processor, including the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `FetchtextError::Validation` for an invalid configuration or an
    /// unsupported auth mode.
    pub fn new(config: &ServiceConfig, extractor: Arc<dyn TextExtractor>) -> Result<Self> {
        let fetcher = ContentFetcher::new(config)?;
        Self::with_fetcher(config, fetcher, extractor)
    }

    /// Build the processor around an existing fetcher.
    pub fn with_fetcher(
        config: &ServiceConfig,
        fetcher: ContentFetcher,
        extractor: Arc<dyn TextExtractor>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            pool: Arc::new(Semaphore::new(config.pool_size)),
            pool_size: config.pool_size,
            worker: Arc::new(Worker {
                fetcher,
                extractor,
                policy: config.failure_policy,
            }),
            source_field: Arc::from(config.source_field.as_str()),
            target_field: Arc::from(config.target_field.as_str()),
        })
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn source_field(&self) -> &str {
        &self.source_field
    }

    pub fn target_field(&self) -> &str {
        &self.target_field
    }

    /// Run one batch to completion.
    ///
    /// Returns every record, in input order, with its target field populated, or
    /// the first fatal error. Partial results are never returned.
    #[tracing::instrument(skip(self, records), fields(batch.size = records.len()))]
    pub async fn run_batch(&self, records: Vec<Record>) -> Result<Vec<Record>> {
        if records.is_empty() {
            return Ok(records);
        }

        let total = records.len();
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        for (index, record) in records.into_iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::debug!(dispatched = index, total, "Batch cancelled, stopping dispatch");
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(dispatched = index, total, "Batch cancelled while waiting for a worker");
                    break;
                }
                permit = Arc::clone(&self.pool).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(e) => {
                        cancel.cancel();
                        tasks.detach_all();
                        return Err(FetchtextError::Other(format!("Worker pool closed: {}", e)));
                    }
                },
            };

            let job = Job::new(
                index,
                record,
                Arc::clone(&self.source_field),
                Arc::clone(&self.target_field),
            );
            let worker = Arc::clone(&self.worker);
            let token = cancel.clone();
            tasks.spawn(async move { worker.run(job, permit, token).await });
        }

        let mut slots: Vec<Option<Record>> = (0..total).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(CompletedJob {
                    fatal: Some(err), ..
                }) => {
                    cancel.cancel();
                    tasks.detach_all();
                    return Err(err);
                }
                Ok(CompletedJob { index, record, .. }) => {
                    slots[index] = Some(record);
                }
                Err(join_err) => {
                    cancel.cancel();
                    tasks.detach_all();
                    tracing::error!("Worker task failed: {}", join_err);
                    return Err(FetchtextError::Other(format!("Worker task failed: {}", join_err)));
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| FetchtextError::Other(format!("Record {} was never processed", index)))
            })
            .collect()
    }
}

impl Worker {
    async fn run(&self, mut job: Job, _permit: OwnedSemaphorePermit, cancel: CancellationToken) -> CompletedJob {
        // A panicking worker cancels the batch on unwind.
        let guard = cancel.clone().drop_guard();

        tracing::debug!(index = job.index, "Processing record");
        let outcome = self.process(&job).await;

        let fatal = match outcome {
            JobOutcome::Success(text) => {
                job.set_target(Some(text));
                None
            }
            JobOutcome::Skipped(reason) => {
                if reason.nulls_target() {
                    job.set_target(None);
                }
                tracing::debug!(index = job.index, "Record skipped: {}", reason);
                None
            }
            JobOutcome::Fatal(err) => {
                let record = serde_json::to_string(&job.record).unwrap_or_default();
                tracing::error!("Non-recoverable error while extracting content from {}: {}", record, err);
                cancel.cancel();
                Some(err)
            }
        };

        guard.disarm();

        CompletedJob {
            index: job.index,
            record: job.record,
            fatal,
        }
    }

    async fn process(&self, job: &Job) -> JobOutcome {
        let raw = match job.source() {
            Ok(raw) => raw,
            Err(reason) => return JobOutcome::Skipped(reason),
        };

        let source = match resolve(&raw) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("{}", e);
                return JobOutcome::Skipped(SkipReason::Resolution(e));
            }
        };

        let bytes = match self.fetcher.fetch(source).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_fatal() => return JobOutcome::Fatal(e.into()),
            Err(FetchError::NotFound { url }) => {
                tracing::warn!("URL not found: '{}'", url);
                return JobOutcome::Skipped(SkipReason::NotFound(url));
            }
            Err(e) => {
                if self.policy.fatal_on_transport_error {
                    return JobOutcome::Fatal(e.into());
                }
                tracing::warn!("{}", e);
                return JobOutcome::Skipped(SkipReason::Transport(e.to_string()));
            }
        };

        match self.extractor.extract(&bytes).await {
            Ok(text) => JobOutcome::Success(text),
            Err(e @ FetchtextError::Extraction { .. }) if !self.policy.fatal_on_extraction_error => {
                tracing::error!("Unable to extract content from '{}': {}", raw, e);
                JobOutcome::Skipped(SkipReason::Extraction(e.to_string()))
            }
            Err(e) => JobOutcome::Fatal(e),
        }
    }
}
