#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use longmem::db;
use longmem::embedding::{EmbeddingProvider, NoopEmbeddingProvider};
use longmem::error::{EmbeddingError, MemoryError};
use longmem::memory::{EventKind, IngestedDocument, SearchHit, SqliteVectorIndex, VectorIndex};

/// Words the keyword embedding knows about; one dimension each.
pub const VOCAB: &[&str] = &[
    "run", "command", "ls", "output", "file", "browse", "url", "error", "python", "test",
];

/// Deterministic bag-of-words embedding over [`VOCAB`], plus one bias
/// dimension so unknown text still has a non-zero vector.
pub struct KeywordEmbedding;

impl EmbeddingProvider for KeywordEmbedding {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let lower = text.to_lowercase();
        let mut v = vec![0.0f32; VOCAB.len() + 1];
        for (i, word) in VOCAB.iter().enumerate() {
            if lower.contains(word) {
                v[i] = 1.0;
            }
        }
        v[VOCAB.len()] = 0.1;
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        Ok(v.into_iter().map(|x| x / norm).collect())
    }

    fn dimensions(&self) -> usize {
        VOCAB.len() + 1
    }

    fn model_id(&self) -> String {
        "test/keywords".into()
    }
}

/// SQLite index over an in-memory database using [`KeywordEmbedding`].
pub fn keyword_index() -> SqliteVectorIndex {
    let conn = db::open_memory_database().unwrap();
    SqliteVectorIndex::new(conn, Arc::new(KeywordEmbedding)).unwrap()
}

/// SQLite index over an in-memory database where every document ties.
pub fn noop_index() -> SqliteVectorIndex {
    let conn = db::open_memory_database().unwrap();
    SqliteVectorIndex::new(conn, Arc::new(NoopEmbeddingProvider)).unwrap()
}

/// In-memory index that records what it is given and how many inserts ran
/// at the same time.
#[derive(Default)]
pub struct RecordingIndex {
    pub docs: Mutex<Vec<IngestedDocument>>,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    /// How long each insert takes.
    pub insert_delay: Duration,
    /// Sequence indices whose insert fails.
    pub fail_seqs: BTreeSet<u64>,
    /// What `query` returns, most relevant first.
    pub ranked: Vec<String>,
}

impl RecordingIndex {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            insert_delay: delay,
            ..Default::default()
        }
    }

    pub fn failing(seqs: &[u64]) -> Self {
        Self {
            fail_seqs: seqs.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn ranked(texts: &[&str]) -> Self {
        Self {
            ranked: texts.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Recorded documents sorted by sequence index.
    pub fn sorted_docs(&self) -> Vec<IngestedDocument> {
        let mut docs = self.docs.lock().unwrap().clone();
        docs.sort_by_key(|d| d.seq);
        docs
    }
}

impl VectorIndex for RecordingIndex {
    fn insert(&self, doc: &IngestedDocument) -> Result<(), MemoryError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.insert_delay);
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.fail_seqs.contains(&doc.seq) {
            return Err(EmbeddingError::from_status(400, "rejected by test index").into());
        }
        self.docs.lock().unwrap().push(doc.clone());
        Ok(())
    }

    fn query(&self, _text: &str, k: usize) -> Result<Vec<SearchHit>, MemoryError> {
        Ok(self
            .ranked
            .iter()
            .take(k)
            .enumerate()
            .map(|(i, text)| SearchHit {
                seq: i as u64,
                kind: EventKind::Unknown,
                source_id: String::new(),
                text: text.clone(),
                distance: i as f64,
            })
            .collect())
    }
}
