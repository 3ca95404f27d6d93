//! CLI `add` command: store one event and wait for it.

use anyhow::{bail, Context, Result};

use longmem::config::LongmemConfig;
use longmem::memory::MemoryStore;

pub async fn add(config: &LongmemConfig, json: &str) -> Result<()> {
    let event: serde_json::Value =
        serde_json::from_str(json).context("event is not valid JSON")?;
    if !event.is_object() {
        bail!("event must be a JSON object");
    }

    let store = MemoryStore::open(config)?;
    let seq = store.add_event(&event);

    if super::drain(&store).await > 0 {
        bail!("event {seq} was not stored");
    }
    println!("Stored event {seq}.");
    Ok(())
}
