//! CLI binary for pdf-ai-client.
//!
//! A thin shim over the library crate: maps CLI flags to `ClientConfig`,
//! uploads the document, then streams summaries and answers to the terminal.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_ai_client::{
    BackendClient, ChatOutcome, ClientConfig, PageSelection, PdfAiError, PublicationSink, Session,
    SummaryOutcome, DEFAULT_BASE_URL,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

fn spinner(prefix: &str, message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS),
    );
    bar.set_prefix(prefix.to_string());
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

// ── Terminal sink ────────────────────────────────────────────────────────────

/// Streams publications to stdout.
///
/// Each publication is the whole content so far, so only the part past what
/// was already printed is written. A publication that does not extend the
/// printed text (a failure replacing a partial reply) starts a new line.
struct TerminalSink {
    printed: Mutex<String>,
}

impl TerminalSink {
    fn new() -> Self {
        Self {
            printed: Mutex::new(String::new()),
        }
    }

    /// End the streamed block with a newline if anything was printed.
    fn finish(&self) {
        let printed = self.printed.lock().unwrap_or_else(PoisonError::into_inner);
        if !printed.is_empty() && !printed.ends_with('\n') {
            println!();
        }
    }
}

impl PublicationSink for TerminalSink {
    fn publish(&self, content: &str) {
        let mut printed = self.printed.lock().unwrap_or_else(PoisonError::into_inner);
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        match content.strip_prefix(printed.as_str()) {
            Some(suffix) => {
                handle.write_all(suffix.as_bytes()).ok();
            }
            None => {
                handle.write_all(b"\n").ok();
                handle.write_all(content.as_bytes()).ok();
            }
        }
        handle.flush().ok();
        *printed = content.to_string();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Upload and print the extracted text
  pdfai --show-text report.pdf

  # Summarize pages 1 to 3
  pdfai --summarize 1-3 report.pdf

  # Ask questions about the whole document
  pdfai --ask "What is the conclusion?" --ask "Who are the authors?" report.pdf

  # Interactive session
  pdfai -i report.pdf

  # Everything as JSON
  pdfai --summarize all --json report.pdf > report.json

  # Local backend
  pdfai --base-url http://localhost:8000 -i report.pdf

INTERACTIVE COMMANDS:
  :next, :prev       move to the next / previous page
  :page N            jump to page N
  :text              print the current page's text
  :summary           summarize the current page
  :help              show this list
  :quit              leave (Ctrl-D works too)
  anything else      asked as a question about the document

ENVIRONMENT VARIABLES:
  PDFAI_BASE_URL     Backend root URL
  RUST_LOG           Override log filter (e.g. pdf_ai_client=debug)
"#;

const REPL_HELP: &str = ":next  :prev  :page N  :text  :summary  :help  :quit  (anything else is a question)";

/// Upload a PDF to the assistant backend, then summarize pages and ask questions.
#[derive(Parser, Debug)]
#[command(
    name = "pdfai",
    version,
    about = "Summarize and question PDF documents through a PDF assistant backend",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file to upload.
    input: PathBuf,

    /// Backend root URL.
    #[arg(long, env = "PDFAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Pages to summarize: all, 5, 2-4, or 1,3,5.
    #[arg(short, long, env = "PDFAI_SUMMARIZE")]
    summarize: Option<String>,

    /// Question about the document (repeatable).
    #[arg(short, long, env = "PDFAI_ASK")]
    ask: Vec<String>,

    /// Start an interactive session after the other actions.
    #[arg(short, long, env = "PDFAI_INTERACTIVE")]
    interactive: bool,

    /// Print the text the backend extracted from every page.
    #[arg(long, env = "PDFAI_SHOW_TEXT")]
    show_text: bool,

    /// Print a JSON report (summaries and conversation) instead of text.
    #[arg(long, env = "PDFAI_JSON")]
    json: bool,

    /// Number of page summaries requested at once.
    #[arg(short, long, env = "PDFAI_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Connect timeout in seconds.
    #[arg(long, env = "PDFAI_CONNECT_TIMEOUT", default_value_t = 10)]
    connect_timeout: u64,

    /// Upload timeout in seconds.
    #[arg(long, env = "PDFAI_UPLOAD_TIMEOUT", default_value_t = 120)]
    upload_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFAI_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "PDFAI_QUIET")]
    quiet: bool,

    /// Disable spinners and progress bars.
    #[arg(long, env = "PDFAI_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Upload ───────────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let client = BackendClient::new(config).context("Failed to create HTTP client")?;

    let bar = show_progress.then(|| spinner("Uploading", &cli.input.display().to_string()));
    let uploaded = Session::upload(client, &cli.input).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let mut session = uploaded.with_context(|| format!("Upload of {:?} failed", cli.input))?;

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(&cli.input.display().to_string()),
            dim(&format!("{} pages", session.document().page_count())),
        );
    }

    if cli.show_text && !cli.json {
        print_text(&session);
    }

    // ── Summaries ────────────────────────────────────────────────────────
    if let Some(ref pages) = cli.summarize {
        let selection: PageSelection = pages.parse().context("Invalid --summarize value")?;
        summarize(&session, &selection, &cli, show_progress).await;
    }

    // ── Questions ────────────────────────────────────────────────────────
    for question in &cli.ask {
        ask(&session, question, cli.json).await;
    }

    if cli.interactive {
        repl(&mut session).await?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&session.report())
            .context("Failed to serialise report")?;
        println!("{json}");
    }

    Ok(())
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    ClientConfig::builder()
        .base_url(cli.base_url.clone())
        .concurrency(cli.concurrency)
        .connect_timeout_secs(cli.connect_timeout)
        .upload_timeout_secs(cli.upload_timeout)
        .build()
        .context("Invalid configuration")
}

fn print_text(session: &Session) {
    let doc = session.document();
    for page in 1..=doc.page_count() {
        println!("{}", cyan(&format!("── Page {page} ──")));
        match doc.page_text(page) {
            Some(text) if !text.is_empty() => println!("{text}"),
            _ => println!("{}", dim("(no text)")),
        }
        println!();
    }
}

async fn summarize(session: &Session, selection: &PageSelection, cli: &Cli, show_progress: bool) {
    let bar = show_progress.then(|| spinner("Summarizing", "waiting for the first reply…"));
    let observer = |page: u32, content: &str| {
        if let Some(ref bar) = bar {
            bar.set_message(format!("page {page}: {} chars", content.len()));
        }
    };

    let results = session
        .summarize_pages(selection, &observer)
        .await;
    if let Some(ref bar) = bar {
        bar.finish_and_clear();
    }
    if cli.json {
        return;
    }

    for (page, result) in results {
        match result {
            Ok(SummaryOutcome::Generated { content, .. }) => {
                println!("{} {}", green("✓"), bold(&format!("Page {page}")));
                println!("{content}\n");
            }
            Ok(SummaryOutcome::Failed { content, error, .. }) => {
                println!("{} {}  {}", red("✗"), bold(&format!("Page {page}")), dim(&error));
                println!("{content}\n");
            }
            Ok(SummaryOutcome::AlreadyAvailable { .. } | SummaryOutcome::InProgress { .. }) => {}
            Err(e) => println!("{} {}", red("✗"), e),
        }
    }
}

async fn ask(session: &Session, question: &str, json: bool) {
    if json {
        session.ask(question, &pdf_ai_client::NoopSink).await;
        return;
    }
    println!("{} {}", cyan(">"), bold(question));
    let sink = TerminalSink::new();
    let outcome = session.ask(question, &sink).await;
    sink.finish();
    match outcome {
        ChatOutcome::Failed { error, .. } => eprintln!("{}", dim(&error)),
        ChatOutcome::Busy => eprintln!("{}", dim("still answering the previous question")),
        ChatOutcome::Answered { .. } | ChatOutcome::Ignored => {}
    }
    println!();
}

async fn repl(session: &mut Session) -> Result<()> {
    eprintln!("{}", dim(REPL_HELP));
    let greeting = session.conversation().messages().first().map(|m| m.content.clone());
    if let Some(greeting) = greeting {
        println!("{greeting}\n");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!(
            "{} ",
            cyan(&format!(
                "pdfai[{}/{}]>",
                session.cursor().current(),
                session.cursor().total()
            ))
        );
        io::stderr().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "" => {}
            ":quit" | ":q" | ":exit" => break,
            ":help" => eprintln!("{}", dim(REPL_HELP)),
            ":next" => {
                session.cursor_mut().next();
            }
            ":prev" => {
                session.cursor_mut().prev();
            }
            ":page" => match arg.trim().parse::<u32>() {
                Ok(page) if session.cursor_mut().goto(page) => {}
                _ => eprintln!(
                    "{}",
                    red(&format!("pages are 1 to {}", session.cursor().total()))
                ),
            },
            ":text" => {
                let page = session.cursor().current();
                match session.document().page_text(page) {
                    Some(text) if !text.is_empty() => println!("{text}\n"),
                    _ => println!("{}\n", dim("(no text)")),
                }
            }
            ":summary" => {
                let page = session.cursor().current();
                show_summary(session, page).await;
            }
            _ if command.starts_with(':') => {
                eprintln!("{} {}", red("unknown command"), dim(REPL_HELP));
            }
            _ => ask(session, line, false).await,
        }
    }
    Ok(())
}

async fn show_summary(session: &Session, page: u32) {
    if let Some(existing) = session.summaries().get(page).filter(|s| !s.is_empty()) {
        println!("{existing}\n");
        return;
    }
    let sink = TerminalSink::new();
    match session.generate_summary(page, &sink).await {
        Ok(SummaryOutcome::Failed { error, .. }) => {
            sink.finish();
            eprintln!("{}", dim(&error));
        }
        Ok(_) => sink.finish(),
        Err(PdfAiError::PageNotFound { .. }) => println!("{}", dim("(no text on this page)")),
        Err(e) => eprintln!("{} {}", red("✗"), e),
    }
    println!();
}
