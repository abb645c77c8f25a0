//! JSON-RPC request routing for the MCP surface.
//!
//! The dispatcher owns the tool registry and the shared context. The
//! transport hands it each decoded message; requests produce a response
//! envelope, notifications produce nothing (the transport forwards
//! nothing in that case).

use std::sync::Arc;

use serde_json::{json, Value};

use loghive_core::diag;
use loghive_ingest::SourceManager;
use loghive_store::LogStore;

use crate::registry::ToolRegistry;
use crate::resources;
use crate::tool::{ToolContext, ToolError};
use crate::tools::{
    AddFileSourceTool, ClearLogsTool, GetCategoriesTool, GetSessionsTool, GetStatsTool,
    ListSourcesTool, QueryLogsTool, RemoveSourceTool, SearchLogsTool, TailLogsTool,
};
use crate::types::{
    error_codes, CallToolResult, InitializeResult, JsonRpcRequest, JsonRpcResponse,
    ListResourcesResult, ListToolsResult, ReadResourceResult, ResourceContents,
    ResourcesCapability, RpcId, ServerCapabilities, ServerInfo, ToolContent, ToolsCapability,
    PROTOCOL_VERSION,
};

pub struct McpDispatcher {
    registry: ToolRegistry,
    context: ToolContext,
    server_name: String,
    server_version: String,
}

impl McpDispatcher {
    /// Build the dispatcher with the full tool set registered.
    pub fn new(store: Arc<LogStore>, sources: Arc<SourceManager>) -> Self {
        let mut registry = ToolRegistry::new();
        registry.register(QueryLogsTool);
        registry.register(SearchLogsTool);
        registry.register(TailLogsTool);
        registry.register(GetStatsTool);
        registry.register(GetCategoriesTool);
        registry.register(GetSessionsTool);
        registry.register(ClearLogsTool);
        registry.register(AddFileSourceTool);
        registry.register(RemoveSourceTool);
        registry.register(ListSourcesTool);

        Self {
            registry,
            context: ToolContext { store, sources },
            server_name: "loghive".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Handle one decoded message. Returns `None` for notifications
    /// (messages without an `id`), which expect no response.
    pub async fn handle_message(&self, raw: Value, session_id: &str) -> Option<JsonRpcResponse> {
        if raw.get("id").is_none() {
            let method = raw
                .get("method")
                .and_then(Value::as_str)
                .unwrap_or_default();
            diag::log("MCP", &format!("{method} (notification, session: {session_id})"));
            return None;
        }

        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    RpcId::Number(0),
                    error_codes::INVALID_REQUEST,
                    e.to_string(),
                ));
            }
        };

        diag::log(
            "MCP",
            &format!("{} (session: {session_id})", request.method),
        );
        Some(self.handle_request(&request).await)
    }

    async fn handle_request(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        let params = request.params.clone().unwrap_or_else(|| json!({}));

        match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, json!(self.initialize_result())),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                json!(ListToolsResult {
                    tools: self.registry.definitions(),
                }),
            ),
            "tools/call" => JsonRpcResponse::success(id, self.handle_tools_call(&params).await),
            "resources/list" => JsonRpcResponse::success(
                id,
                json!(ListResourcesResult {
                    resources: resources::catalog(),
                }),
            ),
            "resources/read" => {
                let uri = params.get("uri").and_then(Value::as_str).unwrap_or_default();
                match resources::read(uri, &self.context) {
                    Ok(value) => {
                        let result = ReadResourceResult {
                            contents: vec![ResourceContents {
                                uri: uri.to_string(),
                                mime_type: "application/json".to_string(),
                                text: pretty(&value),
                            }],
                        };
                        JsonRpcResponse::success(id, json!(result))
                    }
                    // Unknown URIs and other bad input are the caller's
                    // fault; -32603 stays reserved for internal failures.
                    Err(e @ ToolError::InvalidInput(_)) => {
                        JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, e.to_string())
                    }
                    Err(e) => {
                        JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string())
                    }
                }
            }
            method => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            ),
        }
    }

    /// Tool failures are reported inside the result envelope, not as RPC
    /// errors, so the caller always gets content to read.
    async fn handle_tools_call(&self, params: &Value) -> Value {
        let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
        let args = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        let (text, is_error) = match self.registry.get(name) {
            Some(tool) => match tool.execute(args, &self.context).await {
                Ok(result) => (pretty(&result), false),
                Err(e) => (format!("Error: {e}"), true),
            },
            None => (format!("Unknown tool: {name}"), true),
        };

        json!(CallToolResult {
            content: vec![ToolContent::Text { text }],
            is_error,
        })
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {},
                resources: ResourcesCapability { subscribe: false },
            },
            server_info: ServerInfo {
                name: self.server_name.clone(),
                version: self.server_version.clone(),
            },
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loghive_core::LogRecord;

    fn dispatcher() -> (tempfile::TempDir, McpDispatcher) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LogStore::open(dir.path().join("logs.db")).unwrap());
        let sources = Arc::new(SourceManager::new(store.clone()));
        (dir, McpDispatcher::new(store, sources))
    }

    fn insert(dispatcher: &McpDispatcher, message: &str, session: &str) {
        let record = LogRecord {
            source: "client".to_string(),
            message: message.to_string(),
            session_id: session.to_string(),
            instance_id: "i1".to_string(),
            timestamp: 1.0,
            ..LogRecord::default()
        };
        dispatcher.context.store.insert(&record).unwrap();
    }

    async fn call(dispatcher: &McpDispatcher, body: Value) -> Option<JsonRpcResponse> {
        dispatcher.handle_message(body, "session_test").await
    }

    fn tool_text(response: &JsonRpcResponse) -> (String, bool) {
        let result = response.result.as_ref().unwrap();
        (
            result["content"][0]["text"].as_str().unwrap().to_string(),
            result["isError"].as_bool().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_initialize_then_tools_list() {
        let (_dir, dispatcher) = dispatcher();

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}),
        )
        .await
        .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "loghive");
        assert_eq!(result["capabilities"]["resources"]["subscribe"], false);

        // Initialized notification produces no response.
        let none = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","method":"notifications/initialized"}),
        )
        .await;
        assert!(none.is_none());

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":2,"method":"tools/list"}),
        )
        .await
        .unwrap();
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 10);
        assert_eq!(tools[0]["name"], "query_logs");
        assert!(tools[0]["inputSchema"]["properties"].is_object());
    }

    #[tokio::test]
    async fn test_ping() {
        let (_dir, dispatcher) = dispatcher();
        let resp = call(&dispatcher, json!({"jsonrpc":"2.0","id":7,"method":"ping"}))
            .await
            .unwrap();
        assert_eq!(resp.result.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (_dir, dispatcher) = dispatcher();
        let resp = call(&dispatcher, json!({"jsonrpc":"2.0","id":3,"method":"bogus"}))
            .await
            .unwrap();
        let error = resp.error.unwrap();
        assert_eq!(error.code, error_codes::METHOD_NOT_FOUND);
        assert_eq!(error.message, "Method not found: bogus");
    }

    #[tokio::test]
    async fn test_tools_call_get_stats() {
        let (_dir, dispatcher) = dispatcher();
        insert(&dispatcher, "hello", "s1");

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":1,"method":"tools/call",
                   "params":{"name":"get_stats","arguments":{}}}),
        )
        .await
        .unwrap();
        let (text, is_error) = tool_text(&resp);
        assert!(!is_error);
        let stats: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(stats["total"], 1);
        assert_eq!(stats["by_source"]["client"], 1);
    }

    #[tokio::test]
    async fn test_tools_call_query_scoped_to_latest_session() {
        let (_dir, dispatcher) = dispatcher();
        insert(&dispatcher, "old log", "old");
        insert(&dispatcher, "new log", "new");

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":1,"method":"tools/call",
                   "params":{"name":"query_logs","arguments":{}}}),
        )
        .await
        .unwrap();
        let (text, _) = tool_text(&resp);
        let result: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(result["count"], 1);
        assert_eq!(result["logs"][0]["session_id"], "new");

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":2,"method":"tools/call",
                   "params":{"name":"query_logs","arguments":{"all_sessions":true}}}),
        )
        .await
        .unwrap();
        let (text, _) = tool_text(&resp);
        let result: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(result["count"], 2);
    }

    #[tokio::test]
    async fn test_tools_call_search_requires_query() {
        let (_dir, dispatcher) = dispatcher();
        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":1,"method":"tools/call",
                   "params":{"name":"search_logs","arguments":{}}}),
        )
        .await
        .unwrap();
        let (text, is_error) = tool_text(&resp);
        assert!(is_error);
        assert!(text.contains("query parameter is required"));
    }

    #[tokio::test]
    async fn test_tools_call_search_finds_message() {
        let (_dir, dispatcher) = dispatcher();
        insert(&dispatcher, "Player spawned at location", "s1");
        insert(&dispatcher, "Enemy destroyed", "s1");

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":1,"method":"tools/call",
                   "params":{"name":"search_logs","arguments":{"query":"Player"}}}),
        )
        .await
        .unwrap();
        let (text, is_error) = tool_text(&resp);
        assert!(!is_error);
        let result: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(result["count"], 1);
        assert_eq!(result["query"], "Player");
    }

    #[tokio::test]
    async fn test_tools_call_tail_logs_count() {
        let (_dir, dispatcher) = dispatcher();
        for i in 0..5 {
            insert(&dispatcher, &format!("msg {i}"), "s1");
        }

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":1,"method":"tools/call",
                   "params":{"name":"tail_logs","arguments":{"count":2}}}),
        )
        .await
        .unwrap();
        let (text, _) = tool_text(&resp);
        let result: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(result["count"], 2);
    }

    #[tokio::test]
    async fn test_tools_call_clear_logs() {
        let (_dir, dispatcher) = dispatcher();
        insert(&dispatcher, "gone soon", "s1");

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":1,"method":"tools/call",
                   "params":{"name":"clear_logs","arguments":{}}}),
        )
        .await
        .unwrap();
        let (text, is_error) = tool_text(&resp);
        assert!(!is_error);
        let result: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(result["deleted"], 1);
        assert_eq!(result["message"], "1 log entries deleted");
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let (_dir, dispatcher) = dispatcher();
        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":1,"method":"tools/call",
                   "params":{"name":"nope","arguments":{}}}),
        )
        .await
        .unwrap();
        let (text, is_error) = tool_text(&resp);
        assert!(is_error);
        assert_eq!(text, "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_source_tools() {
        let (_dir, dispatcher) = dispatcher();
        let files = tempfile::tempdir().unwrap();
        let path = files.path().join("tailed.log");
        std::fs::write(&path, "").unwrap();

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":1,"method":"tools/call",
                   "params":{"name":"add_file_source",
                             "arguments":{"path": path.to_str().unwrap()}}}),
        )
        .await
        .unwrap();
        let (text, is_error) = tool_text(&resp);
        assert!(!is_error);
        let result: Value = serde_json::from_str(&text).unwrap();
        let id = result["id"].as_str().unwrap().to_string();
        assert_eq!(id, "file-1");

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":2,"method":"tools/call",
                   "params":{"name":"list_sources","arguments":{}}}),
        )
        .await
        .unwrap();
        let (text, _) = tool_text(&resp);
        let result: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(result["count"], 1);
        assert_eq!(result["sources"][0]["kind"], "file-tailer");
        assert_eq!(result["sources"][0]["running"], true);

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":3,"method":"tools/call",
                   "params":{"name":"remove_source","arguments":{"id": id}}}),
        )
        .await
        .unwrap();
        let (text, _) = tool_text(&resp);
        let result: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(result["removed"], true);
    }

    #[tokio::test]
    async fn test_add_file_source_missing_file_is_error() {
        let (_dir, dispatcher) = dispatcher();
        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":1,"method":"tools/call",
                   "params":{"name":"add_file_source",
                             "arguments":{"path":"/nonexistent/never.log"}}}),
        )
        .await
        .unwrap();
        let (text, is_error) = tool_text(&resp);
        assert!(is_error);
        assert!(text.contains("failed to start tailing"));
    }

    #[tokio::test]
    async fn test_resources_list_and_read() {
        let (_dir, dispatcher) = dispatcher();
        insert(&dispatcher, "recent entry", "s1");

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":1,"method":"resources/list"}),
        )
        .await
        .unwrap();
        let resources = resp.result.unwrap()["resources"].as_array().unwrap().clone();
        assert_eq!(resources.len(), 4);
        assert!(resources.iter().all(|r| r["mimeType"] == "application/json"));

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":2,"method":"resources/read",
                   "params":{"uri":"logs://current-session"}}),
        )
        .await
        .unwrap();
        let contents = resp.result.unwrap()["contents"].clone();
        assert_eq!(contents[0]["uri"], "logs://current-session");
        let body: Value = serde_json::from_str(contents[0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(body["session_id"], "s1");
        assert_eq!(body["count"], 1);
    }

    #[tokio::test]
    async fn test_resources_read_errors_scoped_to_severity() {
        let (_dir, dispatcher) = dispatcher();
        let mut record = LogRecord {
            source: "client".to_string(),
            message: "bad thing".to_string(),
            session_id: "s1".to_string(),
            timestamp: 1.0,
            ..LogRecord::default()
        };
        record.verbosity = loghive_core::Severity::Error;
        dispatcher.context.store.insert(&record).unwrap();
        record.verbosity = loghive_core::Severity::Log;
        record.message = "fine thing".to_string();
        dispatcher.context.store.insert(&record).unwrap();

        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":1,"method":"resources/read",
                   "params":{"uri":"logs://errors"}}),
        )
        .await
        .unwrap();
        let contents = resp.result.unwrap()["contents"].clone();
        let body: Value = serde_json::from_str(contents[0]["text"].as_str().unwrap()).unwrap();
        let logs = body.as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["message"], "bad thing");
    }

    #[tokio::test]
    async fn test_resources_read_unknown_uri_is_invalid_params() {
        let (_dir, dispatcher) = dispatcher();
        let resp = call(
            &dispatcher,
            json!({"jsonrpc":"2.0","id":1,"method":"resources/read",
                   "params":{"uri":"logs://nope"}}),
        )
        .await
        .unwrap();
        let error = resp.error.unwrap();
        assert_eq!(error.code, error_codes::INVALID_PARAMS);
        assert!(error.message.contains("Unknown resource"));
    }
}
