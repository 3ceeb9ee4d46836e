//! The index sink contract and the batching/upload policy.
//!
//! Records are upserted by id (fingerprint), so re-submitting an identical
//! batch is a content-level no-op. Batches are independent of each other,
//! which is what makes per-batch failure isolation safe: one rejected batch
//! never aborts the run.

pub mod rest;

pub use rest::SearchRestSink;

use async_trait::async_trait;

use indexfeed_core::config::RetryConfig;
use indexfeed_core::{Batch, EmbeddedRecord, IngestError};

use crate::retry;

/// The vector-index capability consumed by the pipeline.
#[async_trait]
pub trait IndexSink: Send + Sync {
    /// Upsert a batch of records, keyed by record id.
    async fn upsert_batch(&self, records: &[EmbeddedRecord]) -> Result<(), IngestError>;
}

/// Outcome counters for a run's uploads.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadStats {
    pub uploaded_batches: usize,
    pub uploaded_records: usize,
    pub skipped_batches: usize,
    pub failed_batches: usize,
}

impl UploadStats {
    /// Fold another run segment's counters into this one.
    pub fn absorb(&mut self, other: UploadStats) {
        self.uploaded_batches += other.uploaded_batches;
        self.uploaded_records += other.uploaded_records;
        self.skipped_batches += other.skipped_batches;
        self.failed_batches += other.failed_batches;
    }
}

/// Submit batches to the sink under the uniform upload policy: empty
/// batches are skipped with a warning (the sink is never invoked), failed
/// batches are logged with reason and record count and do not stop the run.
pub async fn upload_batches(
    sink: &dyn IndexSink,
    retry_config: &RetryConfig,
    batches: Vec<Batch>,
) -> UploadStats {
    let mut stats = UploadStats::default();

    for batch in batches {
        if batch.is_empty() {
            tracing::warn!("nothing to upload, skipping empty batch");
            stats.skipped_batches += 1;
            continue;
        }

        let count = batch.len();
        let result = retry::with_backoff(retry_config, "index upload", || {
            sink.upsert_batch(&batch)
        })
        .await;

        match result {
            Ok(()) => {
                tracing::info!(records = count, "uploaded batch");
                stats.uploaded_batches += 1;
                stats.uploaded_records += count;
            }
            Err(err) => {
                tracing::warn!(records = count, error = %err, "batch upload failed, continuing");
                stats.failed_batches += 1;
            }
        }
    }

    stats
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::*;

    /// In-memory sink recording every accepted batch; can be set to fail
    /// batches whose first record has a given id.
    pub struct MemorySink {
        pub batches: Mutex<Vec<Batch>>,
        pub fail_ids: Vec<String>,
        pub calls: Mutex<usize>,
    }

    impl MemorySink {
        pub fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail_ids: Vec::new(),
                calls: Mutex::new(0),
            }
        }

        pub fn failing_on(ids: &[&str]) -> Self {
            Self {
                fail_ids: ids.iter().map(|s| s.to_string()).collect(),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl IndexSink for MemorySink {
        async fn upsert_batch(&self, records: &[EmbeddedRecord]) -> Result<(), IngestError> {
            *self.calls.lock().unwrap() += 1;
            if records
                .first()
                .is_some_and(|r| self.fail_ids.contains(&r.id))
            {
                return Err(IngestError::Upload {
                    count: records.len(),
                    reason: "rejected by test sink".into(),
                });
            }
            self.batches.lock().unwrap().push(records.to_vec());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::MemorySink;
    use super::*;

    fn record(id: &str) -> EmbeddedRecord {
        EmbeddedRecord {
            id: id.into(),
            content: "text".into(),
            filepath: "f".into(),
            title: "t".into(),
            url: "u".into(),
            content_vector: vec![0.0; 4],
        }
    }

    fn retry_once() -> RetryConfig {
        RetryConfig {
            max_attempts: 1,
            base_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn empty_batch_never_reaches_the_sink() {
        let sink = MemorySink::new();
        let stats = upload_batches(&sink, &retry_once(), vec![vec![]]).await;
        assert_eq!(*sink.calls.lock().unwrap(), 0);
        assert_eq!(stats.skipped_batches, 1);
        assert_eq!(stats.uploaded_batches, 0);
    }

    #[tokio::test]
    async fn failed_batch_does_not_stop_later_batches() {
        let sink = MemorySink::failing_on(&["bad"]);
        let batches = vec![
            vec![record("ok-1")],
            vec![record("bad"), record("bad-2")],
            vec![record("ok-2")],
        ];
        let stats = upload_batches(&sink, &retry_once(), batches).await;
        assert_eq!(stats.uploaded_batches, 2);
        assert_eq!(stats.uploaded_records, 2);
        assert_eq!(stats.failed_batches, 1);

        let stored = sink.batches.lock().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0][0].id, "ok-1");
        assert_eq!(stored[1][0].id, "ok-2");
    }

    #[tokio::test]
    async fn failed_batch_is_retried_before_giving_up() {
        let sink = MemorySink::failing_on(&["flaky"]);
        let retry = RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
        };
        let stats = upload_batches(&sink, &retry, vec![vec![record("flaky")]]).await;
        assert_eq!(stats.failed_batches, 1);
        assert_eq!(*sink.calls.lock().unwrap(), 3);
    }
}
