/// Events emitted during an agent run, for UI streaming.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    TurnStart { turn: usize },
    Text { content: String },
    ToolCall { name: String, argument: String },
    ToolResult { name: String, output: String, is_error: bool },
    Finished { turns: usize },
}
