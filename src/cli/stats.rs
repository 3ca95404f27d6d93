use anyhow::Result;

use longmem::config::LongmemConfig;
use longmem::memory::stats::{document_stats, with_file_size};

/// Display index statistics in the terminal.
pub fn stats(config: &LongmemConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = longmem::db::open_database(&db_path)?;

    let stats = with_file_size(document_stats(&conn)?, &db_path);

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total events:        {}", stats.total_documents);
    println!();

    println!("By Kind:");
    for (kind, count) in &stats.by_kind {
        println!("  {:<12} {}", kind, count);
    }
    println!();

    println!(
        "Embedding model:       {}",
        stats.embedding_model.as_deref().unwrap_or("(none yet)")
    );
    if let Some(dim) = stats.embedding_dim {
        println!("Embedding dimensions:  {dim}");
    }
    if let Some(newest) = stats.newest_seq {
        println!("Newest seq:            {newest}");
    }
    println!("Database size:         {} bytes", stats.db_size_bytes);

    Ok(())
}
