//! Coedit CLI

use anyhow::Context;
use clap::Parser;
use coedit::{Command, execute};
use coedit_core::{CallerIdentity, ConfigProfile, EngineConfig, Role};
use coedit_engine::CollabEngine;
use coedit_store::FileRepository;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Coedit - versioned documents with advisory edit locks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the document records
    #[arg(short, long, env = "COEDIT_STORE")]
    store: PathBuf,

    /// YAML engine configuration (overrides --profile)
    #[arg(short, long, env = "COEDIT_CONFIG")]
    config: Option<PathBuf>,

    /// Configuration profile (development, production, testing)
    #[arg(short, long, default_value = "development")]
    profile: ConfigProfile,

    /// Log output format (human, json)
    #[arg(long, default_value = "human")]
    log_format: String,

    /// Caller id
    #[arg(short, long, env = "COEDIT_USER", default_value = "anonymous")]
    user: String,

    /// Caller display name (defaults to the id)
    #[arg(long, env = "COEDIT_NAME")]
    name: Option<String>,

    /// Caller role (member, admin)
    #[arg(long, default_value = "member")]
    role: Role,

    #[command(subcommand)]
    command: Command,
}

fn init_logging(format: &str, level: &str) -> anyhow::Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_ascii_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        "json" => builder.json().init(),
        "human" | "text" => builder.init(),
        other => anyhow::bail!("Unknown log format '{}'. Valid options: human, json", other),
    }
    Ok(())
}

async fn load_config(args: &Args) -> anyhow::Result<EngineConfig> {
    match &args.config {
        Some(path) => EngineConfig::load(path)
            .await
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(args.profile.create_config()),
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args).await?;
    init_logging(&args.log_format, &config.log_level)?;

    log::info!("Coedit v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Store: {} | Profile: {}", args.store.display(), args.profile.name());

    let repository = FileRepository::open(&args.store).await?;
    let engine = CollabEngine::new(Arc::new(repository), config)?;

    let caller = CallerIdentity::new(
        args.user.clone(),
        args.name.clone().unwrap_or_else(|| args.user.clone()),
        args.role,
    );

    let output = execute(&engine, &caller, args.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
