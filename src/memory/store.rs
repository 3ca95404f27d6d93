//! Write and read paths for agent event memory.
//!
//! [`MemoryStore::add_event`] never waits on the index: it tags the event,
//! assigns the next sequence index, and hands the document to a worker task.
//! Workers take a permit from a semaphore before writing, so at most
//! `max_concurrent_inserts` index writes run at once. Failed writes are logged
//! and kept in a dead-letter list instead of being reported to the caller.
//! [`MemoryStore::search`] is a plain blocking query.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::index::{SqliteVectorIndex, VectorIndex};
use super::types::{FailedInsert, IngestedDocument, SearchHit};
use crate::config::LongmemConfig;
use crate::db;
use crate::embedding::retry::{RetryPolicy, RetryingProvider};
use crate::embedding::{self, EmbeddingProvider};
use crate::error::MemoryError;
use crate::events::Event;

/// Number of results `search` returns when the caller has no preference.
pub const DEFAULT_K: usize = 10;

pub struct MemoryStore {
    index: Arc<dyn VectorIndex>,
    permits: Arc<Semaphore>,
    next_seq: AtomicU64,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
    failures: Arc<Mutex<Vec<FailedInsert>>>,
    runtime: Handle,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    /// Build a store over any index. Must be called from within a tokio
    /// runtime; worker tasks are spawned onto it.
    pub fn new(index: Arc<dyn VectorIndex>, max_concurrent_inserts: usize) -> Result<Self, MemoryError> {
        if max_concurrent_inserts == 0 {
            return Err(MemoryError::Config(
                "memory.max_concurrent_inserts must be at least 1".into(),
            ));
        }
        let runtime = Handle::try_current().map_err(|e| MemoryError::Runtime(e.to_string()))?;
        let next_seq = index.next_sequence()?;

        tracing::info!(
            max_concurrent_inserts,
            next_seq,
            "memory store ready"
        );

        Ok(Self {
            index,
            permits: Arc::new(Semaphore::new(max_concurrent_inserts)),
            next_seq: AtomicU64::new(next_seq),
            in_flight: Mutex::new(Vec::new()),
            failures: Arc::new(Mutex::new(Vec::new())),
            runtime,
        })
    }

    /// Build the configured embedding provider (wrapped in the retry policy),
    /// open the SQLite index, and resume after the highest stored sequence.
    pub fn open(config: &LongmemConfig) -> Result<Self, MemoryError> {
        let provider = embedding::create_provider(&config.embedding)?;
        let policy = RetryPolicy::from_config(&config.retry);
        let provider: Arc<dyn EmbeddingProvider> =
            Arc::new(RetryingProvider::new(provider, policy));

        let db_path = config.resolved_db_path();
        let conn = db::open_database(&db_path).map_err(|e| MemoryError::Open(format!("{e:#}")))?;
        let index = SqliteVectorIndex::new(conn, provider)?;
        tracing::info!(db = %db_path.display(), "vector index ready");

        Self::new(Arc::new(index), config.memory.max_concurrent_inserts)
    }

    /// Queue an event mapping for insertion and return its sequence index.
    ///
    /// Returns immediately. Insertion failures never reach the caller; they
    /// are logged and show up in [`failed_inserts`](Self::failed_inserts).
    pub fn add_event(&self, event: &Value) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let doc = IngestedDocument::from_event(event, seq);
        tracing::debug!(kind = %doc.kind, seq, "adding event to memory");

        let handle = self.runtime.spawn(insert_document(
            Arc::clone(&self.index),
            Arc::clone(&self.permits),
            Arc::clone(&self.failures),
            doc,
        ));

        let mut in_flight = lock(&self.in_flight);
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
        seq
    }

    /// Serialize a typed event to its mapping and queue it.
    pub fn add_record<E: Event + Serialize>(&self, event: &E) -> Result<u64, MemoryError> {
        let mapping = serde_json::to_value(event)?;
        Ok(self.add_event(&mapping))
    }

    /// Text bodies of the `k` stored events most similar to `query`, most
    /// similar first. Blocks; call through `spawn_blocking` from async code.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<String>, MemoryError> {
        Ok(self
            .search_hits(query, k)?
            .into_iter()
            .map(|hit| hit.text)
            .collect())
    }

    /// Like [`search`](Self::search) but keeps sequence, kind and distance.
    pub fn search_hits(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, MemoryError> {
        tracing::debug!(k, query_len = query.len(), "searching memory");
        let mut hits = self.index.query(query, k)?;
        hits.truncate(k);
        Ok(hits)
    }

    /// Wait for every insertion queued so far, including ones queued while waiting.
    pub async fn flush(&self) {
        loop {
            let handles = std::mem::take(&mut *lock(&self.in_flight));
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "insert worker did not complete");
                }
            }
        }
    }

    /// Insertions that failed, in the order they failed.
    pub fn failed_inserts(&self) -> Vec<FailedInsert> {
        lock(&self.failures).clone()
    }

    /// Number of insert workers that have not finished.
    pub fn pending(&self) -> usize {
        lock(&self.in_flight)
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Sequence index the next `add_event` call will assign.
    pub fn next_sequence(&self) -> u64 {
        self.next_seq.load(Ordering::SeqCst)
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        let pending = self.pending();
        if pending > 0 {
            tracing::warn!(pending, "memory store dropped with inserts still running");
        }
    }
}

/// Worker body: wait for a permit, write on the blocking pool, record failures.
async fn insert_document(
    index: Arc<dyn VectorIndex>,
    permits: Arc<Semaphore>,
    failures: Arc<Mutex<Vec<FailedInsert>>>,
    doc: IngestedDocument,
) {
    let seq = doc.seq;
    let kind = doc.kind;

    let Ok(_permit) = permits.acquire_owned().await else {
        tracing::warn!(seq, "insert permits closed; dropping document");
        return;
    };

    let error = match tokio::task::spawn_blocking(move || index.insert(&doc)).await {
        Ok(Ok(())) => return,
        Ok(Err(e)) => e.to_string(),
        Err(e) => format!("insert task panicked: {e}"),
    };

    tracing::error!(seq, kind = %kind, error = %error, "failed to insert event into memory");
    lock(&failures).push(FailedInsert { seq, kind, error });
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts everything and finds nothing.
    struct NullIndex;

    impl VectorIndex for NullIndex {
        fn insert(&self, _doc: &IngestedDocument) -> Result<(), MemoryError> {
            Ok(())
        }

        fn query(&self, _text: &str, _k: usize) -> Result<Vec<SearchHit>, MemoryError> {
            Ok(vec![])
        }

        fn next_sequence(&self) -> Result<u64, MemoryError> {
            Ok(41)
        }
    }

    #[tokio::test]
    async fn zero_permits_is_rejected() {
        let err = MemoryStore::new(Arc::new(NullIndex), 0).err().unwrap();
        assert!(matches!(err, MemoryError::Config(_)));
    }

    #[test]
    fn construction_requires_a_runtime() {
        let err = MemoryStore::new(Arc::new(NullIndex), 1).err().unwrap();
        assert!(matches!(err, MemoryError::Runtime(_)));
    }

    #[tokio::test]
    async fn sequence_resumes_from_index() {
        let store = MemoryStore::new(Arc::new(NullIndex), 1).unwrap();
        assert_eq!(store.next_sequence(), 41);
        assert_eq!(store.add_event(&serde_json::json!({"action": "run"})), 41);
        assert_eq!(store.next_sequence(), 42);
        store.flush().await;
        assert_eq!(store.pending(), 0);
        assert!(store.failed_inserts().is_empty());
    }

    #[tokio::test]
    async fn typed_records_take_the_next_sequence() {
        let store = MemoryStore::new(Arc::new(NullIndex), 1).unwrap();
        let action = crate::events::ActionEvent::new("browse");
        assert_eq!(store.add_record(&action).unwrap(), 41);
        store.flush().await;
    }
}
