pub mod butler;
pub mod config;
pub mod error;
pub mod events;
pub mod inference;
pub mod prompt;
pub mod session;
pub mod tools;
pub mod types;
pub mod weather;

use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use butler::{butler_tools, Butler};
pub use config::{AgentConfig, Settings};
pub use error::{AgentError, ConfigError, InferenceError, ToolError};
pub use events::AgentEvent;
pub use inference::{InferenceProvider, OpenAiProvider};
pub use session::{FileTranscriptStore, NoTranscriptStore, TranscriptStore};
pub use tools::{ToolExecutor, ToolHandler, ToolOutcome, ToolRegistry};
pub use types::{
    InferenceRequest, InferenceResponse, Message, Role, ToolCall, Transcript, Usage,
};
pub use weather::{advise, Advice, Observation, WeatherClient};

/// Result of an agent run.
#[derive(Debug)]
pub struct AgentResult {
    /// The model's final plain-text answer.
    pub text: String,
    /// Tool calls executed during the run.
    pub tool_rounds: usize,
    pub usage: Usage,
}

/// The dialogue controller. Wire up a provider and tools, then hand it
/// transcripts to answer.
///
/// The agent holds no conversation state: each run appends to the
/// caller's transcript and returns.
pub struct Agent {
    provider: Box<dyn InferenceProvider>,
    tools: ToolExecutor,
    config: AgentConfig,
}

impl Agent {
    pub fn new(
        provider: impl InferenceProvider + 'static,
        tools: ToolExecutor,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider: Box::new(provider),
            tools,
            config,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolExecutor {
        &self.tools
    }

    /// Simple invocation. Runs until the model answers without a tool call.
    ///
    /// On error the transcript may end with an assistant tool call that has
    /// no tool result, which chat APIs reject on the next request. Clone the
    /// transcript before the run and restore it on failure.
    pub async fn run(&self, transcript: &mut Transcript) -> Result<AgentResult, AgentError> {
        self.run_with(transcript, None, None).await
    }

    /// Invocation with cancellation support.
    pub async fn run_with_cancel(
        &self,
        transcript: &mut Transcript,
        cancel: CancellationToken,
    ) -> Result<AgentResult, AgentError> {
        self.run_with(transcript, Some(cancel), None).await
    }

    /// Invocation with streaming events.
    pub async fn run_streaming(
        &self,
        transcript: &mut Transcript,
        tx: mpsc::Sender<AgentEvent>,
    ) -> Result<AgentResult, AgentError> {
        self.run_with(transcript, None, Some(tx)).await
    }

    /// The loop: ask the model, run the tool it asks for, feed the result
    /// back, repeat until it answers in plain text.
    ///
    /// The transcript must end with a user message. Fails with
    /// `UnknownTool` if the model names a tool that isn't registered, and
    /// with `ToolLoopExceeded` once `max_tool_rounds` tool calls have run
    /// and the model still wants another.
    ///
    /// Messages appended before a failure are left in place. After
    /// `UnknownTool`, `ToolLoopExceeded` or `Cancelled` the last message can
    /// be an unanswered tool call, so callers should roll back to a copy
    /// taken before the run.
    pub async fn run_with(
        &self,
        transcript: &mut Transcript,
        cancel: Option<CancellationToken>,
        tx: Option<mpsc::Sender<AgentEvent>>,
    ) -> Result<AgentResult, AgentError> {
        match transcript.last() {
            None => return Err(AgentError::InvalidTranscript("transcript is empty".into())),
            Some(m) if m.role() != Role::User => {
                return Err(AgentError::InvalidTranscript(
                    "transcript must end with a user message".into(),
                ))
            }
            Some(_) => {}
        }

        let emit = |event: AgentEvent| {
            let tx = tx.clone();
            async move {
                if let Some(tx) = tx {
                    let _ = tx.send(event).await;
                }
            }
        };

        let mut usage = Usage::default();
        let mut tool_rounds = 0;
        let schemas = self.tools.schemas();
        let mut turn = 0;

        loop {
            if let Some(ref cancel) = cancel {
                if cancel.is_cancelled() {
                    info!(turn, "agent cancelled");
                    return Err(AgentError::Cancelled);
                }
            }

            emit(AgentEvent::TurnStart { turn }).await;
            info!(turn, "agent turn");

            let request = InferenceRequest {
                model: self.config.model.clone(),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                tools: schemas.clone(),
                messages: transcript.messages().to_vec(),
            };
            let response = cancellable(cancel.as_ref(), self.provider.infer(request)).await??;
            usage.accumulate(&response.usage);

            let text = response.text.clone();
            let call = response.tool_call.clone();
            transcript.push(response.into_message());

            if !text.is_empty() {
                emit(AgentEvent::Text {
                    content: text.clone(),
                })
                .await;
            }

            let Some(call) = call else {
                emit(AgentEvent::Finished { turns: turn + 1 }).await;
                info!(turns = turn + 1, tool_rounds, "agent finished");
                return Ok(AgentResult {
                    text,
                    tool_rounds,
                    usage,
                });
            };

            if tool_rounds >= self.config.max_tool_rounds {
                warn!(
                    max_tool_rounds = self.config.max_tool_rounds,
                    tool = %call.name,
                    "agent hit tool round limit"
                );
                return Err(AgentError::ToolLoopExceeded {
                    max_rounds: self.config.max_tool_rounds,
                });
            }
            if !self.tools.contains(&call.name) {
                warn!(tool = %call.name, "model requested unknown tool");
                return Err(AgentError::UnknownTool(call.name));
            }

            emit(AgentEvent::ToolCall {
                name: call.name.clone(),
                argument: call.arguments.clone(),
            })
            .await;

            let outcome = cancellable(cancel.as_ref(), self.tools.execute(&call)).await??;
            tool_rounds += 1;

            emit(AgentEvent::ToolResult {
                name: call.name.clone(),
                output: outcome.output.clone(),
                is_error: outcome.is_error,
            })
            .await;

            transcript.push(Message::ToolResult {
                call_id: call.id,
                name: call.name,
                content: outcome.output,
                is_error: outcome.is_error,
            });
            turn += 1;
        }
    }
}

/// Race `fut` against cancellation, if a token was given.
async fn cancellable<F: Future>(
    cancel: Option<&CancellationToken>,
    fut: F,
) -> Result<F::Output, AgentError> {
    match cancel {
        Some(token) => tokio::select! {
            out = fut => Ok(out),
            _ = token.cancelled() => {
                info!("agent cancelled mid-step");
                Err(AgentError::Cancelled)
            }
        },
        None => Ok(fut.await),
    }
}
