use std::sync::Arc;

use loghive_ingest::SourceManager;
use loghive_mcp::McpDispatcher;
use loghive_store::LogStore;

use crate::sse::SseRegistry;

pub struct AppState {
    pub store: Arc<LogStore>,
    pub sources: Arc<SourceManager>,
    pub dispatcher: McpDispatcher,
    pub sse: SseRegistry,
}

impl AppState {
    pub fn new(store: Arc<LogStore>, sources: Arc<SourceManager>) -> Arc<Self> {
        let dispatcher = McpDispatcher::new(store.clone(), sources.clone());
        Arc::new(Self {
            store,
            sources,
            dispatcher,
            sse: SseRegistry::new(),
        })
    }
}
