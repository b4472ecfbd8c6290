mod config;
mod jobs;

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use worker_engine::JobExecutorFactory;
use worker_logging::{worker_debug, worker_info};

use crate::config::WorkerConfig;

#[derive(Parser)]
#[command(name = "anysub-worker", version, about = "Extracts and reports content from HTML and JSON sources")]
struct Cli {
    /// RON config file; `worker.ron` is used when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print result documents
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a job (or a list of jobs) and print one result per job
    Run {
        /// Work JSON file; read from stdin when omitted
        #[arg(long)]
        work: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = WorkerConfig::load(cli.config.as_deref())?;
    worker_logging::initialize(config.log_destination(), config.level_filter()?);
    worker_debug!("effective config: {:?}", config);

    match cli.command {
        Command::Run { work } => run(&config, work, cli.pretty).await,
    }
}

async fn run(config: &WorkerConfig, work: Option<PathBuf>, pretty: bool) -> Result<ExitCode> {
    let input = match &work {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading work from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading work from stdin")?;
            buffer
        }
    };

    let submissions = jobs::parse_submissions(&input)?;
    worker_info!("executing {} job(s)", submissions.len());

    let factory = JobExecutorFactory::new(config.fetch.to_settings());
    let outcomes = jobs::execute_all(&factory, submissions).await;

    let mut stdout = io::stdout().lock();
    for outcome in &outcomes {
        writeln!(stdout, "{}", jobs::render_outcome(outcome, pretty)?)?;
    }

    let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
    worker_info!("{} succeeded, {} failed", outcomes.len() - failed, failed);
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
