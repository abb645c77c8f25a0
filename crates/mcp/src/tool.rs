//! The tool extension point: every RPC tool implements [`Tool`] and is
//! dispatched through the registry by name.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use loghive_ingest::SourceManager;
use loghive_store::{LogStore, StoreError};

use crate::types::ToolDefinition;

/// Shared handles passed to tool execution.
pub struct ToolContext {
    pub store: Arc<LogStore>,
    pub sources: Arc<SourceManager>,
}

/// A callable tool exposed over `tools/call`.
///
/// Tools are object-safe, Send + Sync, and async.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's name, description, and input JSON Schema.
    fn definition(&self) -> ToolDefinition;

    /// Execute with the given JSON arguments.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Failed(String),
}
