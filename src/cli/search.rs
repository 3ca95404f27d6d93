use anyhow::Result;
use std::sync::Arc;

use longmem::config::LongmemConfig;
use longmem::memory::MemoryStore;

const PREVIEW_CHARS: usize = 120;

/// Run a similarity search from the terminal.
pub async fn search(config: &LongmemConfig, query: &str, k: Option<usize>) -> Result<()> {
    let k = k.unwrap_or(config.memory.default_k);
    let store = Arc::new(MemoryStore::open(config)?);

    let query_text = query.to_string();
    let s = Arc::clone(&store);
    let hits = tokio::task::spawn_blocking(move || s.search_hits(&query_text, k)).await??;

    if hits.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s)\n", hits.len());

    for (i, hit) in hits.iter().enumerate() {
        let preview = if hit.text.chars().count() > PREVIEW_CHARS {
            let head: String = hit.text.chars().take(PREVIEW_CHARS).collect();
            format!("{head}...")
        } else {
            hit.text.clone()
        };
        let kind = if hit.kind.as_str().is_empty() { "-" } else { hit.kind.as_str() };

        println!(
            "{}. [seq {}] {} {} (distance {:.4})",
            i + 1,
            hit.seq,
            kind,
            hit.source_id,
            hit.distance
        );
        println!("   {preview}");
        println!();
    }

    Ok(())
}
