//! Long-term event memory: document types, the vector index, and the
//! concurrent ingestion store.

pub mod index;
pub mod stats;
pub mod store;
pub mod types;

pub use index::{SqliteVectorIndex, VectorIndex};
pub use store::MemoryStore;
pub use types::{EventKind, FailedInsert, IngestedDocument, SearchHit};

/// Convert an f32 embedding slice to raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            embedding.len() * std::mem::size_of::<f32>(),
        )
    }
}
