//! Key/value records in `schema_meta`.
//!
//! Tracks which embedding model and vector width the stored vectors were
//! produced with, so a store reopened with a different provider is caught.

use rusqlite::{Connection, OptionalExtension};

/// Read a metadata value, if present.
pub fn get_meta(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = ?1",
        [key],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

/// Insert or replace a metadata value.
pub fn set_meta(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    Ok(get_meta(conn, "schema_version")?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0))
}

pub fn get_embedding_model(conn: &Connection) -> rusqlite::Result<Option<String>> {
    get_meta(conn, "embedding_model")
}

pub fn set_embedding_model(conn: &Connection, model: &str) -> rusqlite::Result<()> {
    set_meta(conn, "embedding_model", model)
}

/// Width of the stored vectors. `None` until the first index open.
pub fn get_embedding_dim(conn: &Connection) -> rusqlite::Result<Option<usize>> {
    Ok(get_meta(conn, "embedding_dim")?.and_then(|v| v.parse().ok()))
}

pub fn set_embedding_dim(conn: &Connection, dimensions: usize) -> rusqlite::Result<()> {
    set_meta(conn, "embedding_dim", &dimensions.to_string())
}
