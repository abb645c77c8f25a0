//! Tool registry: name lookup plus a catalog in registration order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::tool::Tool;
use crate::types::ToolDefinition;

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Duplicate names are a programming error.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.definition().name;
        assert!(
            !self.by_name.contains_key(&name),
            "tool '{name}' registered twice"
        );
        self.by_name.insert(name, self.tools.len());
        self.tools.push(Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.by_name.get(name).map(|&i| self.tools[i].clone())
    }

    /// Catalog of every registered tool, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
