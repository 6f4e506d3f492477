// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! deespec - durable execution coordination for LLM-agent task pipelines

mod agent_process;
mod config;
mod prompt_file;

use agent_process::ProcessAgent;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use deespec_core::clock::{Clock, SystemClock};
use deespec_engine::{FileExecutionRepository, RunCoordinator, SharedExecutionRepository};
use deespec_locks::LockStore;
use deespec_storage::{JournalWriter, JournalWriterConfig};
use prompt_file::FilePromptBuilder;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "deespec",
    version,
    about = "Durable execution coordination for LLM-agent task pipelines"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coordinator loop: acquire the run lock and drive active
    /// executions until interrupted.
    Run,
    /// Start a fresh execution for an item and exit once it finishes
    /// advancing one step.
    Start {
        /// Item identifier to start an execution for.
        item_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;
    std::fs::create_dir_all(&config.state_dir).context("creating state directory")?;

    match cli.command {
        Commands::Run => run_coordinator(config).await,
        Commands::Start { item_id } => start_execution(config, item_id),
    }
}

async fn run_coordinator(config: Config) -> Result<()> {
    let locks = Arc::new(LockStore::open(&config.lock_db_path).context("opening lock store")?);
    let repository: SharedExecutionRepository =
        Arc::new(FileExecutionRepository::new(&config.executions_dir).context("opening execution store")?);
    let journal = Arc::new(JournalWriter::new(
        config.journal_path.clone(),
        JournalWriterConfig::default(),
    ));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let agent = Arc::new(ProcessAgent::new(config.agent_command.clone(), config.agent_args.clone()));
    let prompts = Arc::new(FilePromptBuilder::new(config.prompts_dir.clone()));

    let hostname = hostname()?;
    let coordinator = RunCoordinator::new(
        locks,
        repository,
        journal,
        config.item_states_dir.clone(),
        clock,
        agent,
        prompts,
        Duration::from_secs(config.agent_timeout_secs),
        hostname,
    );

    info!("starting coordinator");
    coordinator
        .run(Duration::from_secs(config.poll_interval_secs))
        .await
        .context("coordinator loop exited")
}

fn start_execution(config: Config, item_id: String) -> Result<()> {
    let repository: SharedExecutionRepository =
        Arc::new(FileExecutionRepository::new(&config.executions_dir).context("opening execution store")?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let service = deespec_engine::ExecutionService::new(repository, clock);
    let execution = service
        .start_execution(&item_id)
        .context("starting execution")?;
    println!("started execution {}", execution.id.as_str());
    Ok(())
}

fn hostname() -> Result<String> {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("HOST"))
        .or_else(|_| {
            std::fs::read_to_string("/etc/hostname").map(|s| s.trim().to_string())
        })
        .context("determining local hostname")
}
