//! SQL DDL for the event memory tables.
//!
//! Defines `event_documents` (one row per ingested event), `schema_meta`, and
//! the `event_vectors` vec0 table. All DDL uses `IF NOT EXISTS` for idempotent
//! initialization.

use rusqlite::Connection;

pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = r#"
-- One row per ingested event; seq doubles as the vector rowid
CREATE TABLE IF NOT EXISTS event_documents (
    seq INTEGER PRIMARY KEY,
    kind TEXT NOT NULL CHECK(kind IN ('action','observation','')),
    source_id TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_event_documents_kind ON event_documents(kind);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize the document and metadata tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Create the vec0 table for `dimensions`-wide embeddings if it does not exist.
///
/// vec0 column widths are fixed at creation, so the width is part of the DDL.
pub fn ensure_vector_table(conn: &Connection, dimensions: usize) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS event_vectors USING vec0(embedding FLOAT[{dimensions}]);"
    ))
}

/// Whether the vec0 table has been created yet.
pub fn has_vector_table(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'event_vectors'",
        [],
        |row| row.get::<_, i64>(0),
    )
    .map(|count| count > 0)
}
