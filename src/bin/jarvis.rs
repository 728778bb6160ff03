//! jarvis - Ask a model one question and watch the answer stream in.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use jarvis::{
    CancellationToken, ChatError, ChatSession, InferenceConfig, OpenAiClient, SyntectHighlighter,
    TerminalSize,
};

/// Send a prompt and print the streamed reply, with code blocks as panels.
#[derive(Parser, Debug)]
#[command(name = "jarvis")]
#[command(about = "Ask a language model and stream the answer")]
#[command(version)]
struct Cli {
    /// Prompt text; multiple words are joined with spaces
    #[arg(required = true, num_args = 1..)]
    prompt: Vec<String>,

    /// Model to ask (overrides JARVIS_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Print the reply as streamed, without repainting code blocks
    #[arg(long)]
    plain: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    jarvis::init_logging();
    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    cancel.cancel_on_ctrl_c();

    match run(cli, &cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_cancelled(&e) => {
            eprintln!("\nCancelled.");
            ExitCode::from(jarvis::EXIT_CANCELLED)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, cancel: &CancellationToken) -> Result<()> {
    let config = InferenceConfig::from_env(cli.model.as_deref())?;
    let client = OpenAiClient::new(&config);
    let highlighter = SyntectHighlighter::new();
    let prompt = cli.prompt.join(" ");

    let mut session = ChatSession::new(&client, &config.system_prompt, &highlighter);
    // Cursor movement only makes sense on a terminal.
    if cli.plain || !io::stdout().is_terminal() {
        session = session.plain();
    }

    let mut out = io::stdout();
    session
        .run(&prompt, &mut out, TerminalSize::current(), cancel)
        .await?;
    Ok(())
}

fn is_cancelled(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<ChatError>(), Some(ChatError::Cancelled))
}
