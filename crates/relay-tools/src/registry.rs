//! Tool registry — central index of all registered tools.
//!
//! The [`ToolRegistry`] maps tool names to their [`RelayTool`]
//! implementations. The runtime registers tools at startup and queries the
//! registry to dispatch tool calls and to generate each agent's tool
//! schema. The registry is read-only after startup, so dispatch needs no
//! locking.

use std::collections::HashMap;
use std::sync::Arc;

use relay_core::tools::Tool;
use tracing::debug;

use crate::traits::RelayTool;

/// Central registry mapping tool names to their implementations.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn RelayTool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Overwrites any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn RelayTool>) {
        debug!(tool_name = tool.name(), "tool registered");
        let _ = self.tools.insert(tool.name().to_owned(), tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn RelayTool>> {
        self.tools.get(name).cloned()
    }

    /// Return all tool schemas.
    pub fn definitions(&self) -> Vec<Tool> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Return the schemas for the named tools, skipping unknown names.
    ///
    /// Used to build per-agent tool lists from an agent's configured
    /// `tool_names`.
    pub fn definitions_for(&self, names: &[String]) -> Vec<Tool> {
        names
            .iter()
            .filter_map(|n| self.tools.get(n).map(|t| t.definition()))
            .collect()
    }

    /// Return all tool names, sorted alphabetically.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Whether a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
