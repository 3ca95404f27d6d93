//! CLI `reset` command: delete all events after user confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use longmem::config::LongmemConfig;
use longmem::db;

/// Delete all stored events after user confirmation.
pub fn reset(config: &LongmemConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    println!("WARNING: This will permanently delete ALL stored events and their vectors.");
    println!("Database: {}", db_path.display());
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    let conn = db::open_database(&db_path)?;
    clear(&conn)?;

    println!("All events deleted. Database reset complete.");
    Ok(())
}

/// Remove every document and vector. Index metadata is kept, so the next
/// store opened on this database must use the same embedding width.
fn clear(conn: &rusqlite::Connection) -> Result<()> {
    if db::schema::has_vector_table(conn)? {
        conn.execute("DELETE FROM event_vectors", [])?;
    }
    conn.execute("DELETE FROM event_documents", [])?;
    Ok(())
}
