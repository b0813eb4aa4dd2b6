//! Terminal chat with the Q&A assistant.
//!
//! Reads one question per line, streams the answer, and keeps a bounded
//! conversation memory. Type `clear` to forget the conversation and `exit`
//! to leave.
//!
//! Required environment (or `.env`):
//! - `MISTRAL_API_KEY`
//!
//! Optional:
//! - `WEATHER_API_KEY` - enables live weather lookups
//! - `ALPHA_VANTAGE_API_KEY` - enables live stock quotes

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agent_tools::{default_registry, StockConfig, WeatherConfig};
use assistant_core::LanguageModel;
use clap::Parser;
use mistral_brain::MistralBrain;
use query_router::{async_trait, ResponseSink, Router, RouterConfig, Session, SessionControl};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "qa-assistant")]
#[command(about = "Ask questions; live weather and stock data are fetched when needed")]
struct Args {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Log level
    #[arg(
        long,
        env = "LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        ignore_case = true
    )]
    log_level: String,

    /// Number of turns kept in memory (default: ASSISTANT_MAX_TURNS or 10)
    #[arg(long)]
    max_turns: Option<usize>,

    /// Also write logs to a file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn level(&self) -> String {
        if self.debug {
            "debug".to_string()
        } else {
            self.log_level.to_lowercase()
        }
    }
}

/// Writes the conversation to the terminal.
struct TerminalSink;

impl TerminalSink {
    fn write(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

#[async_trait]
impl ResponseSink for TerminalSink {
    async fn status(&self, text: &str) {
        self.write(text);
    }

    async fn fragment(&self, text: &str) {
        self.write(text);
    }

    async fn error(&self, text: &str) {
        self.write(text);
    }
}

fn log_file_name() -> String {
    format!(
        "qa_assistant_{}.log",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

/// Set up stderr logging, plus a log file when `log_dir` is given.
///
/// `--debug` wins over everything; otherwise `RUST_LOG` wins over `--log-level`.
fn init_logging(args: &Args) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.level()))
    };

    let (file_layer, guard) = match args.log_dir.as_deref() {
        Some(dir) => {
            let (writer, guard) = file_writer(dir)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

fn file_writer(
    dir: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), std::io::Error> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, log_file_name());
    Ok(tracing_appender::non_blocking(appender))
}

fn report_missing_keys(weather: &WeatherConfig, stock: &StockConfig) {
    if weather.api_key.is_none() {
        warn!("WEATHER_API_KEY not set; weather lookups will fail");
    }
    if stock.api_key.is_none() {
        warn!("ALPHA_VANTAGE_API_KEY not set; stock lookups will fail");
    }
}

fn print_banner() {
    println!("Q&A Assistant");
    println!("Ask anything. Live weather and stock prices are looked up when needed.");
    println!("Commands: 'clear' or 'reset' forgets the conversation, 'exit' quits.\n");
}

/// Shown when Ctrl-C interrupts the prompt or a turn.
const INTERRUPTED_NOTE: &str = "Interrupted. Type 'exit' to quit or continue with a new query.";

/// What the prompt produced.
#[derive(Debug, PartialEq, Eq)]
enum PromptInput {
    Line(String),
    Interrupted,
    Eof,
}

/// Wait for the next input line or for `interrupt`, whichever comes first.
async fn next_input<R, F>(lines: &mut Lines<R>, interrupt: F) -> std::io::Result<PromptInput>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        line = lines.next_line() => Ok(match line? {
            Some(line) => PromptInput::Line(line),
            None => PromptInput::Eof,
        }),
        _ = interrupt => Ok(PromptInput::Interrupted),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let _log_guard = init_logging(&args)?;

    let model: Arc<dyn LanguageModel> = match MistralBrain::from_env() {
        Ok(brain) => Arc::new(brain),
        Err(e) => {
            error!(error = %e, "Cannot start without a language model");
            eprintln!("Error: {}. Set MISTRAL_API_KEY in the environment or .env.", e);
            return Err(e.into());
        }
    };

    let weather = WeatherConfig::from_env();
    let stock = StockConfig::from_env();
    report_missing_keys(&weather, &stock);
    let registry = Arc::new(default_registry(weather, stock));

    let mut config = RouterConfig::from_env();
    if let Some(max_turns) = args.max_turns {
        config = config.with_max_turns(max_turns);
    }
    info!(
        max_turns = config.max_turns,
        call_timeout = ?config.call_timeout,
        tool_timeout = ?config.tool_timeout,
        "Starting assistant"
    );

    let mut session = Session::new(Router::new(model, registry, config));
    let sink = TerminalSink;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_banner();

    loop {
        print!("You: ");
        let _ = std::io::stdout().flush();

        let line = match next_input(&mut lines, tokio::signal::ctrl_c()).await? {
            PromptInput::Line(line) => line,
            PromptInput::Interrupted => {
                println!("\n{}\n", INTERRUPTED_NOTE);
                continue;
            }
            PromptInput::Eof => {
                println!();
                break;
            }
        };

        print!("Assistant: ");
        let _ = std::io::stdout().flush();

        tokio::select! {
            control = session.handle(&line, &sink) => {
                println!("\n");
                if control == SessionControl::Exit {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Turn interrupted by user");
                println!("\n{}\n", INTERRUPTED_NOTE);
            }
        }
    }

    println!("Goodbye!");
    info!("Session ended after {} turns in memory", session.memory().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["qa-assistant"]).unwrap();
        assert!(!args.debug);
        assert!(args.max_turns.is_none());
        assert!(args.log_dir.is_none());
    }

    #[test]
    fn test_args_flags() {
        let args = Args::try_parse_from([
            "qa-assistant",
            "--log-level",
            "WARN",
            "--max-turns",
            "4",
            "--log-dir",
            "logs",
        ])
        .unwrap();
        assert_eq!(args.level(), "warn");
        assert_eq!(args.max_turns, Some(4));
        assert_eq!(args.log_dir, Some(PathBuf::from("logs")));

        let args = Args::try_parse_from(["qa-assistant", "--debug", "--log-level", "error"]).unwrap();
        assert_eq!(args.level(), "debug");

        assert!(Args::try_parse_from(["qa-assistant", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_log_file_name() {
        let name = log_file_name();
        assert!(name.starts_with("qa_assistant_"));
        assert!(name.ends_with(".log"));
    }

    #[tokio::test]
    async fn test_next_input_reads_lines_then_eof() {
        let mut lines = BufReader::new(&b"weather in Delhi\nexit\n"[..]).lines();

        let first = next_input(&mut lines, std::future::pending()).await.unwrap();
        assert_eq!(first, PromptInput::Line("weather in Delhi".to_string()));
        let second = next_input(&mut lines, std::future::pending()).await.unwrap();
        assert_eq!(second, PromptInput::Line("exit".to_string()));
        let end = next_input(&mut lines, std::future::pending()).await.unwrap();
        assert_eq!(end, PromptInput::Eof);
    }

    #[tokio::test]
    async fn test_interrupt_at_prompt_keeps_reading() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut lines = BufReader::new(reader).lines();

        let input = next_input(&mut lines, async { Ok(()) }).await.unwrap();
        assert_eq!(input, PromptInput::Interrupted);

        writer.write_all(b"clear\n").await.unwrap();
        let input = next_input(&mut lines, std::future::pending()).await.unwrap();
        assert_eq!(input, PromptInput::Line("clear".to_string()));
    }
}
