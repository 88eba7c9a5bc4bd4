//! `docchat`: ingest documents and ask questions about them.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use docchat_core::config::{Config, Credentials, Settings};
use docchat_core::extract::load_documents;
use docchat_core::traits::Generator;
use docchat_core::types::AnswerStatus;
use docchat_core::ProviderError;
use docchat_embed::get_default_embedder;
use docchat_rag::{GeminiGenerator, Orchestrator};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "Chat with your PDF and text documents")]
#[command(version)]
struct Cli {
    /// Extra TOML file merged over config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline progress (overridden by DOCCHAT_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from files or directories, replacing any previous one
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Ask one question
    Ask { question: String },

    /// Ask questions interactively until EOF or `exit`
    Chat,

    /// Show the index location and contents
    Status,
}

/// Stand-in for sessions that never generate (ingest, status), so those
/// commands work without an API key when embeddings are local.
struct NoGenerator;

impl Generator for NoGenerator {
    fn model_id(&self) -> &str { "none" }
    fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Fatal("no generator configured".into()))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DOCCHAT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(io::stderr).init();
}

fn describe(e: &anyhow::Error) -> String {
    match e.downcast_ref::<docchat_core::Error>() {
        Some(err) => err.user_message(),
        None => format!("{e:#}"),
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Config::load_with(cli.config.as_deref())?.settings()?;
    match cli.command {
        Commands::Ingest { paths } => ingest(&settings, &paths),
        Commands::Ask { question } => {
            let mut session = open_session(&settings, true)?;
            ask(&mut session, &question)
        }
        Commands::Chat => chat(&settings),
        Commands::Status => status(&settings),
    }
}

fn open_session(settings: &Settings, needs_generator: bool) -> Result<Orchestrator> {
    let credentials = if needs_generator { Some(Credentials::from_env()?) } else { Credentials::from_env().ok() };
    let embedder = get_default_embedder(&settings.embedding, credentials.as_ref())?;
    let generator: Box<dyn Generator> = match (&credentials, needs_generator) {
        (Some(credentials), true) => Box::new(
            GeminiGenerator::new(&settings.generation, credentials).map_err(docchat_core::Error::Generation)?,
        ),
        _ => Box::new(NoGenerator),
    };
    Ok(Orchestrator::open(settings, embedder, generator)?)
}

fn ingest(settings: &Settings, paths: &[PathBuf]) -> Result<()> {
    let documents = load_documents(paths)?;
    println!("Processing {} file(s)...", documents.len());
    let mut session = open_session(settings, false)?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks embedded")?
            .progress_chars("#>-"),
    );
    let result = session.ingest_with_progress(documents, &mut |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    });
    pb.finish_and_clear();
    let report = result?;

    println!(
        "Processing complete: {} document(s), {} chunk(s), {} character(s).",
        report.documents, report.chunks, report.characters
    );
    if report.skipped > 0 {
        println!("Skipped {} unsupported or unreadable file(s).", report.skipped);
    }
    println!("Index saved to {}", session.location().display());
    Ok(())
}

fn ask(session: &mut Orchestrator, question: &str) -> Result<()> {
    let answer = session.ask(question)?;
    println!("Reply: {}", answer.text);
    if answer.status == AnswerStatus::Declined {
        tracing::info!("model found no answer in the retrieved context");
    }
    Ok(())
}

fn chat(settings: &Settings) -> Result<()> {
    let mut session = open_session(settings, true)?;
    println!("Ask a question about your documents (`exit` to quit).");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }
        match session.ask(question) {
            Ok(answer) => println!("Reply: {}", answer.text),
            Err(e) => println!("Error: {}", e.user_message()),
        }
    }
    Ok(())
}

fn status(settings: &Settings) -> Result<()> {
    let session = open_session(settings, false)?;
    println!("State:    {:?}", session.state());
    println!("Index:    {}", session.location().display());
    println!("Embedder: {}", session.embedder_id());
    match session.index() {
        Some(index) => {
            println!("Chunks:   {}", index.len());
            println!("Dim:      {}", index.dim());
        }
        None => println!("No index available. Ingest documents first."),
    }
    Ok(())
}
