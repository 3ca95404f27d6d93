//! MCP server over stdio.

use std::sync::Arc;

use anyhow::Result;
use rmcp::ServiceExt;

use crate::tools::MemoryTools;
use longmem::config::LongmemConfig;
use longmem::memory::MemoryStore;

/// Open the store and serve the memory tools until the client disconnects.
/// Queued inserts are drained before returning.
pub async fn serve_stdio(config: LongmemConfig) -> Result<()> {
    tracing::info!("starting longmem MCP server on stdio");

    let store = Arc::new(MemoryStore::open(&config)?);
    let config = Arc::new(config);

    let tools = MemoryTools::new(Arc::clone(&store), config);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP client disconnected; flushing pending inserts");

    store.flush().await;
    let failed = store.failed_inserts();
    if !failed.is_empty() {
        tracing::warn!(failed = failed.len(), "some events were not stored");
    }
    tracing::info!("MCP server shut down");

    Ok(())
}
