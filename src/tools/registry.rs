use std::sync::Arc;

use serde_json::Value;

use super::handler::{ToolDef, ToolHandler};
use crate::error::AgentError;

/// Catalog of available tools. Names are unique; lookups are exact.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool taking one string argument named `parameter`.
    /// Fails if a tool with the same name is already registered.
    pub fn add(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameter: impl Into<String>,
        handler: impl ToolHandler + 'static,
    ) -> Result<Self, AgentError> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(AgentError::DuplicateTool(name));
        }
        self.tools.push(ToolDef {
            name,
            description: description.into(),
            parameter: parameter.into(),
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    /// All tool schemas for the LLM API request.
    pub fn schemas(&self) -> Vec<Value> {
        self.tools.iter().map(ToolDef::schema).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDef> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
