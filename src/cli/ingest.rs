//! CLI `ingest` command: bulk-load events from a JSON Lines file.

use anyhow::{bail, Context, Result};
use std::path::Path;

use longmem::config::LongmemConfig;
use longmem::memory::MemoryStore;

/// Add every non-blank line of `path` as an event.
///
/// The whole file is parsed before anything is queued, so a malformed line
/// leaves the store untouched.
pub async fn ingest(config: &LongmemConfig, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let events = parse_lines(&text)?;
    if events.is_empty() {
        println!("No events in {}.", path.display());
        return Ok(());
    }

    let store = MemoryStore::open(config)?;
    let first = store.next_sequence();
    for event in &events {
        store.add_event(event);
    }
    println!("Queued {} event(s) starting at seq {first}...", events.len());

    let failed = super::drain(&store).await;
    println!("Inserted: {}", events.len() - failed);
    println!("Failed:   {failed}");
    if failed > 0 {
        bail!("{failed} event(s) were not stored");
    }
    Ok(())
}

fn parse_lines(text: &str) -> Result<Vec<serde_json::Value>> {
    let mut events = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: serde_json::Value = serde_json::from_str(line)
            .with_context(|| format!("line {}: invalid JSON", i + 1))?;
        if !event.is_object() {
            bail!("line {}: event must be a JSON object", i + 1);
        }
        events.push(event);
    }
    Ok(events)
}
