//! Breakthrough CLI - Command-line interface
//!
//! Commands:
//! - play: answer moves over the line-based turn protocol
//! - arena: play a series of games between two agents
//! - dump-tree: write the MCTS graph after every move of a game

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use breakthrough_cli::arena::{self, ArenaArgs};
use breakthrough_cli::dump_tree::{self, DumpTreeArgs};
use breakthrough_cli::play::{self, PlayArgs};
use breakthrough_cli::EngineConfig;

#[derive(Parser)]
#[command(name = "breakthrough")]
#[command(about = "Breakthrough game engine with MCTS")]
#[command(version)]
struct Cli {
    /// JSON engine configuration
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer moves read from stdin
    Play(PlayArgs),
    /// Play games between two agents
    Arena(ArenaArgs),
    /// Dump the MCTS graph after every move of a game against a random player
    DumpTree(DumpTreeArgs),
}

fn main() -> anyhow::Result<()> {
    // stdout carries the turn protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::load_or_default(cli.config.as_deref())?;
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    match cli.command {
        Commands::Play(args) => play::run(args, config),
        Commands::Arena(args) => arena::run(args, config),
        Commands::DumpTree(args) => dump_tree::run(args, config),
    }
}
