mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cortex::config::CortexConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cortex", version, about = "Long-term memory for coding agents")]
struct Cli {
    /// Config file (default: ~/.cortex/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a memory, or evolve the one holding --topic-key
    Store(cli::store::StoreArgs),
    /// Find memories related to a query
    Recall(cli::recall::RecallArgs),
    /// List memories, newest first
    List(cli::list::ListArgs),
    /// Show one memory and its relations
    Show {
        id: String,
    },
    /// Link two memories
    Relate(cli::relate::RelateArgs),
    /// Change a memory's trust level (default: validated)
    Validate {
        id: String,
        #[arg(long)]
        trust: Option<cortex::memory::types::TrustLevel>,
    },
    /// Permanently delete a memory and its relations
    Delete {
        id: String,
    },
    /// Show store statistics
    Stats,
    /// Rebuild missing vector-index entries
    Reindex {
        /// Re-embed every memory, not only those missing an embedding
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CortexConfig::load_from(path)?,
        None => CortexConfig::load()?,
    };

    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    cortex::with_engine(&config, |engine| match cli.command {
        Command::Store(args) => cli::store::store(engine, args, json),
        Command::Recall(args) => cli::recall::recall(engine, args, json),
        Command::List(args) => cli::list::list(engine, args, json),
        Command::Show { id } => cli::show::show(engine, &id, json),
        Command::Relate(args) => cli::relate::relate(engine, args, json),
        Command::Validate { id, trust } => cli::validate::validate(engine, &id, trust, json),
        Command::Delete { id } => cli::delete::delete(engine, &id, json),
        Command::Stats => cli::stats::stats(engine, json),
        Command::Reindex { force } => cli::reindex::reindex(engine, force, json),
    })
    .context("command failed")?;

    Ok(())
}
