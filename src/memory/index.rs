//! Vector index behind the memory store.
//!
//! [`VectorIndex`] is the seam the store writes through; [`SqliteVectorIndex`]
//! implements it with an `event_documents` table plus a sqlite-vec `vec0`
//! table keyed by sequence index.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use super::types::{EventKind, IngestedDocument, SearchHit};
use super::{embedding_to_bytes, stats::DocumentStats};
use crate::db;
use crate::embedding::EmbeddingProvider;
use crate::error::MemoryError;

/// sqlite-vec rejects KNN queries with `k` above this.
const MAX_KNN: usize = 4096;

/// Storage and similarity search over ingested documents.
///
/// Both methods block. `insert` may be called from several threads at once,
/// up to the store's permit count.
pub trait VectorIndex: Send + Sync {
    /// Embed and persist one document.
    fn insert(&self, doc: &IngestedDocument) -> Result<(), MemoryError>;

    /// The `k` documents nearest to `text`, nearest first.
    fn query(&self, text: &str, k: usize) -> Result<Vec<SearchHit>, MemoryError>;

    /// Sequence index the next document should get. A fresh index starts at 0.
    fn next_sequence(&self) -> Result<u64, MemoryError> {
        Ok(0)
    }
}

/// SQLite + sqlite-vec implementation of [`VectorIndex`].
pub struct SqliteVectorIndex {
    conn: Mutex<Connection>,
    embedder: Arc<dyn EmbeddingProvider>,
    dimensions: usize,
}

impl SqliteVectorIndex {
    /// Wrap an initialized connection (see [`db::open_database`]).
    ///
    /// Creates the vector table on first use and records the provider's model
    /// and width. Fails with [`MemoryError::DimensionMismatch`] if the database
    /// already holds vectors of a different width.
    pub fn new(conn: Connection, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self, MemoryError> {
        let dimensions = embedder.dimensions();
        let model = embedder.model_id();

        match db::meta::get_embedding_dim(&conn)? {
            Some(stored) if stored != dimensions => {
                return Err(MemoryError::DimensionMismatch {
                    expected: stored,
                    actual: dimensions,
                });
            }
            Some(_) => {}
            None => db::meta::set_embedding_dim(&conn, dimensions)?,
        }

        if let Some(stored_model) = db::meta::get_embedding_model(&conn)? {
            if stored_model != model {
                tracing::warn!(
                    stored = %stored_model,
                    configured = %model,
                    "embedding model changed; similarity against older vectors will be unreliable"
                );
            }
        }
        db::meta::set_embedding_model(&conn, &model)?;
        db::schema::ensure_vector_table(&conn, dimensions)?;

        tracing::debug!(model = %model, dimensions, "vector index ready");

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
            dimensions,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Document counts for this index.
    pub fn stats(&self) -> Result<DocumentStats, MemoryError> {
        let conn = self.lock()?;
        Ok(super::stats::document_stats(&conn)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, MemoryError> {
        self.conn.lock().map_err(|_| MemoryError::LockPoisoned)
    }

    fn embed_checked(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let embedding = self.embedder.embed(text)?;
        if embedding.len() != self.dimensions {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }
}

impl VectorIndex for SqliteVectorIndex {
    fn insert(&self, doc: &IngestedDocument) -> Result<(), MemoryError> {
        // Embed before taking the lock; this is the slow, retried part.
        let embedding = self.embed_checked(&doc.body)?;
        let seq = doc.seq as i64;
        let now = chrono::Utc::now().to_rfc3339();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO event_documents (seq, kind, source_id, body, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![seq, doc.kind.as_str(), doc.source_id, doc.body, now],
        )?;
        tx.execute(
            "INSERT INTO event_vectors (rowid, embedding) VALUES (?1, ?2)",
            params![seq, embedding_to_bytes(&embedding)],
        )?;
        tx.commit()?;

        tracing::debug!(seq = doc.seq, kind = %doc.kind, "document indexed");
        Ok(())
    }

    fn query(&self, text: &str, k: usize) -> Result<Vec<SearchHit>, MemoryError> {
        if k == 0 {
            return Ok(vec![]);
        }
        let k = k.min(MAX_KNN);
        let embedding = self.embed_checked(text)?;

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "WITH knn AS (
                 SELECT rowid AS seq, distance FROM event_vectors
                 WHERE embedding MATCH ?1 AND k = ?2
             )
             SELECT knn.seq, knn.distance, d.kind, d.source_id, d.body
             FROM knn JOIN event_documents d ON d.seq = knn.seq
             ORDER BY knn.distance, knn.seq",
        )?;

        let rows = stmt.query_map(params![embedding_to_bytes(&embedding), k as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (seq, distance, kind, source_id, body) = row?;
            hits.push(SearchHit {
                seq: seq as u64,
                kind: kind.parse().unwrap_or(EventKind::Unknown),
                source_id,
                text: body,
                distance,
            });
        }
        Ok(hits)
    }

    fn next_sequence(&self) -> Result<u64, MemoryError> {
        let conn = self.lock()?;
        let max: Option<i64> = conn
            .query_row("SELECT MAX(seq) FROM event_documents", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(max.map_or(0, |m| m as u64 + 1))
    }
}
