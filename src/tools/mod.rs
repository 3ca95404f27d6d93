pub mod add_event;
pub mod search_memory;

use add_event::AddEventParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use search_memory::SearchMemoryParams;
use std::sync::Arc;

use longmem::config::LongmemConfig;
use longmem::memory::MemoryStore;

/// MCP tool handler over a shared [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryTools {
    tool_router: ToolRouter<Self>,
    store: Arc<MemoryStore>,
    config: Arc<LongmemConfig>,
}

#[tool_router]
impl MemoryTools {
    pub fn new(store: Arc<MemoryStore>, config: Arc<LongmemConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            store,
            config,
        }
    }

    /// Queue an event for storage in long-term memory.
    #[tool(description = "Add an agent event (a JSON object with an 'action' or 'observation' key) to long-term memory. Returns its sequence index; storage happens in the background.")]
    async fn add_event(
        &self,
        Parameters(params): Parameters<AddEventParams>,
    ) -> Result<String, String> {
        if !params.event.is_object() {
            return Err("event must be a JSON object".into());
        }

        let seq = self.store.add_event(&params.event);
        tracing::info!(seq, "add_event called");

        Ok(serde_json::json!({ "seq": seq, "queued": true }).to_string())
    }

    /// Retrieve the stored events most similar to a query.
    #[tool(description = "Search long-term memory for the events most similar to a natural language query, most similar first.")]
    async fn search_memory(
        &self,
        Parameters(params): Parameters<SearchMemoryParams>,
    ) -> Result<String, String> {
        let k = params.k.unwrap_or(self.config.memory.default_k);
        tracing::info!(query = %params.query, k, "search_memory called");

        // Embedding and KNN both block.
        let store = Arc::clone(&self.store);
        let query = params.query;
        let hits = tokio::task::spawn_blocking(move || store.search_hits(&query, k))
            .await
            .map_err(|e| format!("search task failed: {e}"))?
            .map_err(|e| format!("search failed: {e}"))?;

        serde_json::to_string(&hits).map_err(|e| format!("serialization failed: {e}"))
    }
}

#[tool_handler]
impl ServerHandler for MemoryTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "longmem is a long-term event memory. Use add_event to record actions and \
                 observations, and search_memory to recall similar past events."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
