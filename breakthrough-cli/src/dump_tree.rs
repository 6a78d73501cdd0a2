//! Dump-tree command - MCTS (white) against a random player (black),
//! writing the search graph after every MCTS move.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use breakthrough_core::{Color, Position, RandomAgent};
use breakthrough_mcts::Mcts;

use crate::config::EngineConfig;
use crate::player::create_rng;

#[derive(Args)]
pub struct DumpTreeArgs {
    /// Output directory (overrides the config)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Node limit per file (overrides the config)
    #[arg(long)]
    pub max_nodes: Option<usize>,
}

pub fn run(args: DumpTreeArgs, mut config: EngineConfig) -> Result<()> {
    if let Some(dir) = args.dir {
        config.tree_dir = dir;
    }
    if let Some(max_nodes) = args.max_nodes {
        config.max_nodes = max_nodes;
    }
    let files = dump_game(&config)?;
    tracing::info!("Wrote {} trees to {}", files.len(), config.tree_dir.display());
    Ok(())
}

/// Play one game and return the files written
pub fn dump_game(config: &EngineConfig) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&config.tree_dir)
        .with_context(|| format!("Failed to create {}", config.tree_dir.display()))?;

    let mut mcts = Mcts::with_config(config.mcts());
    let mut random = RandomAgent::new(create_rng(config.seed.map(|s| s.wrapping_add(1))));
    let mut position = Position::new();
    let mut files = Vec::new();

    while !position.is_lost() {
        let action = if position.player_to_move() == Color::White {
            let action = mcts.best_action(&mut position)?;
            files.push(write_tree(&mcts, &mut position, config)?);
            action
        } else {
            random.best_action(&position)?
        };
        position.apply(action)?;
    }

    tracing::info!(
        "Game over after {} plies, {} wins",
        position.ply(),
        position.player_to_move().opponent()
    );
    Ok(files)
}

/// Write the graph searched from `position` to the config's tree path for
/// the current ply
pub fn write_tree(mcts: &Mcts, position: &mut Position, config: &EngineConfig) -> Result<PathBuf> {
    let path = config.tree_path(position.ply());
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    mcts.write_json(position, config.max_nodes, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(path)
}
