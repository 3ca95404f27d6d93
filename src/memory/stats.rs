use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::db;

/// Summary of what an index holds.
#[derive(Debug, Serialize)]
pub struct DocumentStats {
    pub total_documents: u64,
    /// Keyed by kind tag; untagged documents are counted under `"unknown"`.
    pub by_kind: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_seq: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_dim: Option<usize>,
    pub db_size_bytes: u64,
}

/// Compute document statistics. File size is left at 0; see [`with_file_size`].
pub fn document_stats(conn: &Connection) -> rusqlite::Result<DocumentStats> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM event_documents", [], |row| row.get(0))?;
    let newest: Option<i64> =
        conn.query_row("SELECT MAX(seq) FROM event_documents", [], |row| row.get(0))?;

    Ok(DocumentStats {
        total_documents: total as u64,
        by_kind: count_by_kind(conn)?,
        newest_seq: newest.map(|n| n as u64),
        embedding_model: db::meta::get_embedding_model(conn)?,
        embedding_dim: db::meta::get_embedding_dim(conn)?,
        db_size_bytes: 0,
    })
}

/// Fill in the on-disk size of the database file.
pub fn with_file_size(mut stats: DocumentStats, db_path: &Path) -> DocumentStats {
    stats.db_size_bytes = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    stats
}

fn count_by_kind(conn: &Connection) -> rusqlite::Result<BTreeMap<String, u64>> {
    let mut map: BTreeMap<String, u64> = ["action", "observation", "unknown"]
        .iter()
        .map(|k| (k.to_string(), 0))
        .collect();

    let mut stmt = conn.prepare("SELECT kind, COUNT(*) FROM event_documents GROUP BY kind")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    for (kind, count) in rows {
        let key = if kind.is_empty() { "unknown".to_string() } else { kind };
        map.insert(key, count as u64);
    }
    Ok(map)
}
