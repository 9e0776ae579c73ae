//! Alfred, the gala butler, in a terminal.
//!
//! Usage:
//!   GROQ_API_KEY=gsk-... alfred
//!   GROQ_API_KEY=gsk-... WEATHER_API_KEY=... alfred --once "Should we have fireworks in Paris tonight?"
//!   alfred --history-dir ~/.alfred --conversation gala
//!
//! Type "/clear" to start over, "exit" / "quit" to leave. Ctrl-C interrupts
//! the current answer, or leaves when pressed at the prompt.

use std::future::Future;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use alfred_agent::{
    AgentError, AgentEvent, Butler, FileTranscriptStore, NoTranscriptStore, Role, Settings,
    Transcript, TranscriptStore,
};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "alfred", about = "Chat with Alfred, your gala butler")]
struct Cli {
    /// Model to use
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible API base URL (defaults to Groq)
    #[arg(long)]
    base_url: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Max tool calls per answer
    #[arg(long)]
    max_tool_rounds: Option<usize>,

    /// Seconds before a tool call is abandoned
    #[arg(long)]
    tool_timeout_secs: Option<u64>,

    /// Guest list JSON file (defaults to the bundled list)
    #[arg(long)]
    guests: Option<PathBuf>,

    /// Directory to keep conversation history in
    #[arg(long)]
    history_dir: Option<PathBuf>,

    /// Conversation name within the history directory
    #[arg(long, default_value = "default")]
    conversation: String,

    /// Ask a single question and exit
    #[arg(long)]
    once: Option<String>,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(ref model) = self.model {
            settings.agent.model = model.clone();
        }
        if let Some(ref url) = self.base_url {
            settings.base_url = url.clone();
        }
        if let Some(t) = self.temperature {
            settings.agent.temperature = t;
        }
        if let Some(n) = self.max_tool_rounds {
            settings.agent.max_tool_rounds = n;
        }
        if let Some(secs) = self.tool_timeout_secs {
            settings.agent.tool_timeout = Duration::from_secs(secs);
        }
        if self.guests.is_some() {
            settings.guests_path = self.guests.clone();
        }
    }
}

fn spawn_printer(mut rx: tokio::sync::mpsc::Receiver<AgentEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                AgentEvent::ToolCall { name, argument } => {
                    eprintln!("\x1b[33m  [tool: {name}]\x1b[0m {argument}");
                }
                AgentEvent::ToolResult {
                    name,
                    output,
                    is_error,
                } => {
                    let tag = if is_error { "error" } else { "result" };
                    let truncated: String = if output.chars().count() > 200 {
                        format!("{}...", output.chars().take(200).collect::<String>())
                    } else {
                        output
                    };
                    eprintln!("\x1b[33m  [{tag}: {name}]\x1b[0m {truncated}");
                }
                AgentEvent::Finished { turns } => {
                    if turns > 1 {
                        eprintln!("\x1b[2m  ({turns} turns)\x1b[0m");
                    }
                }
                _ => {}
            }
        }
    })
}

/// Resolves on Ctrl-C. Never resolves if the signal handler can't be installed.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

enum Input {
    Line(String),
    Interrupted,
    Closed,
}

/// Next line at the prompt, unless `interrupt` fires first.
async fn next_input<R: AsyncBufRead + Unpin>(
    lines: &mut Lines<R>,
    interrupt: impl Future<Output = ()>,
) -> Input {
    tokio::select! {
        line = lines.next_line() => match line {
            Ok(Some(line)) => Input::Line(line),
            _ => Input::Closed,
        },
        _ = interrupt => Input::Interrupted,
    }
}

/// Drive `run` to completion. If `interrupt` fires first, cancel the token
/// and let `run` wind down.
async fn cancel_on<F: Future>(
    run: F,
    cancel: &CancellationToken,
    interrupt: impl Future<Output = ()>,
) -> F::Output {
    tokio::pin!(run);
    tokio::select! {
        out = &mut run => out,
        _ = interrupt => {
            cancel.cancel();
            run.await
        }
    }
}

/// One question, one answer. On failure the transcript is rolled back to
/// where it was before the question.
async fn ask(
    butler: &Butler,
    transcript: &mut Transcript,
    question: &str,
) -> Result<String, AgentError> {
    let checkpoint = transcript.clone();
    transcript.push_user(question);

    let (tx, rx) = tokio::sync::mpsc::channel::<AgentEvent>(64);
    let printer = spawn_printer(rx);

    let cancel = CancellationToken::new();
    let result = cancel_on(
        butler
            .agent()
            .run_with(transcript, Some(cancel.clone()), Some(tx)),
        &cancel,
        ctrl_c(),
    )
    .await;
    printer.await.ok();

    match result {
        Ok(result) => {
            eprintln!(
                "\x1b[2m  [{}in / {}out tokens]\x1b[0m",
                result.usage.input_tokens, result.usage.output_tokens
            );
            Ok(result.text)
        }
        Err(e) => {
            *transcript = checkpoint;
            Err(e)
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    cli.apply(&mut settings);

    let butler = match Butler::from_settings(&settings).await {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: failed to initialize Alfred: {e}");
            std::process::exit(1);
        }
    };

    let store: Box<dyn TranscriptStore> = match cli.history_dir {
        Some(ref dir) => Box::new(FileTranscriptStore::new(dir.clone())),
        None => Box::new(NoTranscriptStore),
    };
    let mut transcript = match store.load(&cli.conversation).await {
        Ok(Some(t)) if !t.is_empty() => t,
        Ok(_) => butler.new_transcript(),
        Err(e) => {
            eprintln!("warning: could not load history: {e}");
            butler.new_transcript()
        }
    };

    if let Some(ref question) = cli.once {
        match ask(&butler, &mut transcript, question).await {
            Ok(answer) => println!("{answer}"),
            Err(e) => {
                eprintln!("error: Alfred encountered an issue: {e}");
                std::process::exit(1);
            }
        }
        if let Err(e) = store.save(&cli.conversation, &transcript).await {
            eprintln!("warning: could not save history: {e}");
        }
        return;
    }

    // Header
    eprintln!("Alfred - your gala butler");
    eprintln!("model: {}", settings.agent.model);
    eprintln!("try: \"Tell me about Ada Lovelace\", \"What's the weather in London?\"");
    eprintln!("---");
    for msg in transcript.conversation() {
        let who = if msg.role() == Role::User { "you" } else { "alfred" };
        eprintln!("\x1b[2m{who}> {}\x1b[0m", msg.content());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("\x1b[1;36myou>\x1b[0m ");
        io::stderr().flush().ok();

        let line = match next_input(&mut lines, ctrl_c()).await {
            Input::Line(line) => line,
            Input::Interrupted => {
                eprintln!();
                break;
            }
            Input::Closed => break,
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed, "exit" | "quit" | "/q") {
            break;
        }
        if trimmed == "/clear" {
            transcript.reset();
            if let Err(e) = store.clear(&cli.conversation).await {
                eprintln!("warning: could not clear history: {e}");
            }
            eprintln!("\x1b[2m  (conversation cleared)\x1b[0m");
            continue;
        }

        match ask(&butler, &mut transcript, trimmed).await {
            Ok(answer) => {
                eprint!("\x1b[1;32malfred>\x1b[0m ");
                println!("{answer}");
                if let Err(e) = store.save(&cli.conversation, &transcript).await {
                    eprintln!("warning: could not save history: {e}");
                }
            }
            Err(e) => {
                eprintln!("\x1b[1;31merror:\x1b[0m Alfred encountered an issue: {e}");
            }
        }
    }

    eprintln!("Good evening.");
    // The stdin reader thread can't be cancelled; don't wait on it.
    std::process::exit(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prompt_returns_lines_then_closes() {
        let mut lines = BufReader::new(&b"hello\n"[..]).lines();
        assert!(matches!(
            next_input(&mut lines, std::future::pending()).await,
            Input::Line(l) if l == "hello"
        ));
        assert!(matches!(
            next_input(&mut lines, std::future::pending()).await,
            Input::Closed
        ));
    }

    #[tokio::test]
    async fn interrupt_at_prompt_ends_input() {
        let (_writer, reader) = tokio::io::duplex(64);
        let mut lines = BufReader::new(reader).lines();
        assert!(matches!(
            next_input(&mut lines, async {}).await,
            Input::Interrupted
        ));
    }

    #[tokio::test]
    async fn interrupts_keep_working_across_questions() {
        let (_writer, reader) = tokio::io::duplex(64);
        let mut lines = BufReader::new(reader).lines();

        for _ in 0..3 {
            let cancel = CancellationToken::new();
            let token = cancel.clone();
            let out = cancel_on(
                async move {
                    token.cancelled().await;
                    "stopped"
                },
                &cancel,
                async {},
            )
            .await;
            assert_eq!(out, "stopped");

            assert!(matches!(
                next_input(&mut lines, async {}).await,
                Input::Interrupted
            ));
        }
    }

    #[tokio::test]
    async fn answer_finishes_without_interrupt() {
        let cancel = CancellationToken::new();
        let out = cancel_on(async { 42 }, &cancel, std::future::pending()).await;
        assert_eq!(out, 42);
        assert!(!cancel.is_cancelled());
    }
}
