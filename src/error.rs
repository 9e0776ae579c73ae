#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("inference error: {0}")]
    Inference(#[from] InferenceError),
    #[error("model requested unknown tool: {0}")]
    UnknownTool(String),
    #[error("tool loop exceeded {max_rounds} rounds")]
    ToolLoopExceeded { max_rounds: usize },
    #[error("tool already registered: {0}")]
    DuplicateTool(String),
    #[error("invalid transcript: {0}")]
    InvalidTranscript(String),
    #[error("agent cancelled")]
    Cancelled,
    #[error("session error: {0}")]
    Session(String),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("API returned {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// Failure inside a tool body. Recovered by the executor, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    Failed(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Startup-time misconfiguration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingCredential(&'static str),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
