use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::registry::ToolRegistry;
use crate::error::AgentError;
use crate::types::ToolCall;

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of running one tool call. Failures are folded into `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub output: String,
    pub is_error: bool,
}

impl ToolOutcome {
    fn failed(tool: &str, reason: impl std::fmt::Display) -> Self {
        Self {
            output: format!("I apologize, but I encountered an issue while using {tool}: {reason}"),
            is_error: true,
        }
    }
}

/// Runs tools on behalf of the agent loop.
///
/// An unknown tool name is fatal. Everything that goes wrong *inside* a
/// tool (an error return, a panic, a timeout) becomes an apologetic result
/// string flagged `is_error`, and the loop carries on.
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Upper bound on a single tool invocation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutcome, AgentError> {
        let tool = self
            .registry
            .get(&call.name)
            .ok_or_else(|| AgentError::UnknownTool(call.name.clone()))?;

        let argument = tool.argument(&call.arguments);
        debug!(tool = %tool.name, %argument, "executing tool");

        let handler = Arc::clone(&tool.handler);
        let mut task = tokio::spawn(async move { handler.call(&argument).await });
        // Dropping this future (timeout, cancellation) also stops the tool.
        let _guard = AbortOnDrop(task.abort_handle());

        let outcome = match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(Ok(Ok(output))) => ToolOutcome {
                output,
                is_error: false,
            },
            Ok(Ok(Err(e))) => {
                warn!(tool = %tool.name, error = %e, "tool failed");
                ToolOutcome::failed(&tool.name, e)
            }
            Ok(Err(e)) => {
                warn!(tool = %tool.name, error = %e, "tool task aborted");
                ToolOutcome::failed(&tool.name, "the tool stopped unexpectedly")
            }
            Err(_) => {
                warn!(tool = %tool.name, timeout = ?self.timeout, "tool timed out");
                ToolOutcome::failed(
                    &tool.name,
                    format!("no answer within {} seconds", self.timeout.as_secs()),
                )
            }
        };

        Ok(outcome)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.get(name).is_some()
    }

    /// Delegate to the registry for schemas.
    pub fn schemas(&self) -> Vec<Value> {
        self.registry.schemas()
    }

    /// All tool names in the registry.
    pub fn tool_names(&self) -> Vec<&str> {
        self.registry.tool_names()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Access the underlying registry.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::tools::ToolHandler;
    use async_trait::async_trait;

    struct Upper;

    #[async_trait]
    impl ToolHandler for Upper {
        async fn call(&self, argument: &str) -> Result<String, ToolError> {
            Ok(argument.to_uppercase())
        }
    }

    struct Failing;

    #[async_trait]
    impl ToolHandler for Failing {
        async fn call(&self, _argument: &str) -> Result<String, ToolError> {
            Err(ToolError::Failed("search backend offline".into()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl ToolHandler for Panicking {
        async fn call(&self, _argument: &str) -> Result<String, ToolError> {
            panic!("boom")
        }
    }

    struct Slow;

    #[async_trait]
    impl ToolHandler for Slow {
        async fn call(&self, _argument: &str) -> Result<String, ToolError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("late".into())
        }
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "c1".into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    fn executor() -> ToolExecutor {
        let registry = ToolRegistry::new()
            .add("upper", "Uppercase", "text", Upper)
            .unwrap()
            .add("failing", "Fails", "text", Failing)
            .unwrap()
            .add("panicking", "Panics", "text", Panicking)
            .unwrap()
            .add("slow", "Sleeps", "text", Slow)
            .unwrap();
        ToolExecutor::new(registry).with_timeout(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn success_passes_output_through() {
        let out = executor()
            .execute(&call("upper", r#"{"text": "ada"}"#))
            .await
            .unwrap();
        assert_eq!(out.output, "ADA");
        assert!(!out.is_error);
    }

    #[tokio::test]
    async fn tool_error_becomes_apology() {
        let out = executor().execute(&call("failing", "{}")).await.unwrap();
        assert!(out.is_error);
        assert!(out.output.starts_with("I apologize"));
        assert!(out.output.contains("search backend offline"));
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let out = executor().execute(&call("panicking", "{}")).await.unwrap();
        assert!(out.is_error);
        assert!(out.output.contains("panicking"));
    }

    #[tokio::test]
    async fn timeout_is_contained() {
        let out = executor().execute(&call("slow", "{}")).await.unwrap();
        assert!(out.is_error);
        assert!(out.output.contains("slow"));
    }

    #[tokio::test]
    async fn unknown_tool_is_fatal() {
        let err = executor().execute(&call("teleport", "{}")).await.unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool(ref n) if n == "teleport"));
    }
}
