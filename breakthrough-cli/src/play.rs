//! Play command - answer moves over a line-based turn protocol
//!
//! Each turn the referee sends:
//! - the opponent's last action (`e7e6`), or `None` when we move first
//! - the number of legal actions for us, then one action per line
//!
//! and we answer with one action on stdout. Logging goes to stderr.
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: run_session() - turn loop
//! - Level 3: read_turn(), check_legal_list()

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::Args;

use breakthrough_core::{Action, Position};

use crate::config::EngineConfig;
use crate::dump_tree::write_tree;
use crate::player::{Player, PlayerType};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// Agent answering the referee
    #[arg(long, value_enum, default_value_t = PlayerType::Mcts)]
    pub agent: PlayerType,

    /// MCTS iterations per move (overrides the config)
    #[arg(long)]
    pub iterations: Option<u32>,
}

/// What the referee sent for one turn
#[derive(Clone, Debug, PartialEq)]
pub struct TurnInput {
    pub opponent_action: Option<Action>,
    pub legal_actions: Vec<Action>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: PlayArgs, mut config: EngineConfig) -> Result<()> {
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    tracing::info!("Playing as {} agent", args.agent);

    let mut player = Player::new(args.agent, &config, None);
    let mut position = Position::new();
    let stdin = io::stdin();
    let stdout = io::stdout();

    if config.dump_tree {
        std::fs::create_dir_all(&config.tree_dir)
            .with_context(|| format!("Failed to create {}", config.tree_dir.display()))?;
    }

    let moves = run_session(&mut player, &mut position, &config, stdin.lock(), stdout.lock())?;
    tracing::info!("Session ended after {} moves", moves);
    Ok(())
}

// ============================================================================
// LEVEL 2 - TURN LOOP
// ============================================================================

/// Serve turns until the input ends or the game is over. Returns the number
/// of actions we played.
///
/// With `config.dump_tree` set, an MCTS player's graph is written after
/// each of its moves.
pub fn run_session<R: BufRead, W: Write>(
    player: &mut Player,
    position: &mut Position,
    config: &EngineConfig,
    mut input: R,
    mut output: W,
) -> Result<usize> {
    let mut moves = 0;

    while let Some(turn) = read_turn(&mut input)? {
        if let Some(action) = turn.opponent_action {
            if !position.is_legal(action) {
                bail!("Opponent action {} is not legal at ply {}", action, position.ply());
            }
            position.apply(action)?;
        }

        if position.is_lost() {
            tracing::info!("Game over: {} has lost", position.player_to_move());
            break;
        }

        check_legal_list(position, &turn.legal_actions);

        let action = player.best_action(position)?;
        if let (true, Some(mcts)) = (config.dump_tree, player.as_mcts()) {
            write_tree(mcts, position, config)?;
        }
        writeln!(output, "{}", action).context("Failed to write action")?;
        output.flush().context("Failed to flush output")?;
        position.apply(action)?;
        moves += 1;

        tracing::debug!("ply {}: played {}", position.ply(), action);
    }

    Ok(moves)
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Read one turn; `None` on end of input
pub fn read_turn<R: BufRead>(input: &mut R) -> Result<Option<TurnInput>> {
    let Some(first) = read_line(input)? else {
        return Ok(None);
    };
    let opponent_action = match first.as_str() {
        "None" => None,
        text => Some(
            text.parse::<Action>()
                .with_context(|| format!("Bad opponent action: {:?}", text))?,
        ),
    };

    let count_line = read_line(input)?.context("Input ended before the legal action count")?;
    let count: usize = count_line
        .parse()
        .with_context(|| format!("Bad legal action count: {:?}", count_line))?;

    let mut legal_actions = Vec::with_capacity(count);
    for _ in 0..count {
        let line = read_line(input)?.context("Input ended inside the legal action list")?;
        let action = line
            .parse::<Action>()
            .with_context(|| format!("Bad legal action: {:?}", line))?;
        legal_actions.push(action);
    }

    Ok(Some(TurnInput {
        opponent_action,
        legal_actions,
    }))
}

/// Next non-empty line, trimmed
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut buf = String::new();
    loop {
        buf.clear();
        if input.read_line(&mut buf).context("Failed to read input")? == 0 {
            return Ok(None);
        }
        let line = buf.trim();
        if !line.is_empty() {
            return Ok(Some(line.to_string()));
        }
    }
}

/// Warn when the referee's legal list disagrees with our move generation
fn check_legal_list(position: &Position, provided: &[Action]) {
    let mut ours = position.compute_valid_actions();
    let mut theirs = provided.to_vec();
    ours.sort_by_key(|a| a.raw());
    theirs.sort_by_key(|a| a.raw());
    if ours != theirs {
        tracing::warn!(
            "Legal action mismatch at ply {}: referee sent {}, generated {}",
            position.ply(),
            theirs.len(),
            ours.len()
        );
    }
}
