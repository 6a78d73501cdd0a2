//! Arena command - play a series of games between two agents
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_arena(), report_results()
//! - Level 3: play_single_game(), compute_statistics()
//! - Level 4: formatting utilities

use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Args;
use rayon::prelude::*;
use serde::Serialize;

use breakthrough_core::{Color, Position};

use crate::config::EngineConfig;
use crate::player::{Player, PlayerType};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args, Clone)]
pub struct ArenaArgs {
    /// Agent under test
    #[arg(long, value_enum, default_value_t = PlayerType::Mcts)]
    pub challenger: PlayerType,

    /// Reference agent
    #[arg(long, value_enum, default_value_t = PlayerType::Random)]
    pub opponent: PlayerType,

    /// Number of games to play (will alternate colors)
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Play games concurrently, one thread per game
    #[arg(long)]
    pub parallel: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug, Serialize)]
pub struct GameRecord {
    pub game_number: usize,
    pub challenger_color: Color,
    pub winner: Color,
    pub plies: u32,
    #[serde(skip)]
    pub challenger_time: Duration,
    pub challenger_moves: u32,
    #[serde(skip)]
    pub opponent_time: Duration,
    pub opponent_moves: u32,
}

impl GameRecord {
    pub fn challenger_won(&self) -> bool {
        self.winner == self.challenger_color
    }
}

/// Aggregated arena results
#[derive(Clone, Debug)]
pub struct ArenaResults {
    pub challenger: PlayerType,
    pub opponent: PlayerType,
    pub games: Vec<GameRecord>,
    pub challenger_wins: usize,
    pub white_wins: usize,
    pub black_wins: usize,
    pub avg_plies: f32,
    pub challenger_ms_per_move: f64,
    pub opponent_ms_per_move: f64,
}

impl ArenaResults {
    pub fn win_rate(&self) -> f32 {
        if self.games.is_empty() {
            0.0
        } else {
            self.challenger_wins as f32 / self.games.len() as f32
        }
    }
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run arena command
pub fn run(args: ArenaArgs, config: EngineConfig) -> Result<()> {
    tracing::info!(
        "Starting arena: {} vs {} ({} games{})",
        args.challenger,
        args.opponent,
        args.games,
        if args.parallel { ", parallel" } else { "" }
    );

    let results = play_arena(&args, &config)?;

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Play all games; each game owns its agents and their search graphs.
pub fn play_arena(args: &ArenaArgs, config: &EngineConfig) -> Result<ArenaResults> {
    let play = |game_number: usize| -> Result<GameRecord> {
        let record = play_single_game(args, config, game_number)?;
        tracing::info!(
            "Game {}: {} wins in {} plies (challenger {})",
            record.game_number,
            record.winner,
            record.plies,
            if record.challenger_won() { "won" } else { "lost" }
        );
        Ok(record)
    };

    let games = if args.parallel {
        (1..=args.games).into_par_iter().map(play).collect::<Result<Vec<_>>>()?
    } else {
        (1..=args.games).map(play).collect::<Result<Vec<_>>>()?
    };

    Ok(compute_statistics(args, games))
}

/// Report arena results
fn report_results(results: &ArenaResults, args: &ArenaArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one game, the challenger taking white in odd-numbered games
pub fn play_single_game(
    args: &ArenaArgs,
    config: &EngineConfig,
    game_number: usize,
) -> Result<GameRecord> {
    let challenger_color = if game_number % 2 == 1 {
        Color::White
    } else {
        Color::Black
    };

    let seed = config.seed.map(|s| s.wrapping_add(2 * game_number as u64));
    let mut challenger = Player::new(args.challenger, config, seed);
    let mut opponent = Player::new(args.opponent, config, seed.map(|s| s.wrapping_add(1)));

    let mut position = Position::new();
    let mut challenger_time = Duration::ZERO;
    let mut opponent_time = Duration::ZERO;
    let mut challenger_moves = 0;
    let mut opponent_moves = 0;

    while !position.is_lost() {
        let challenger_to_move = position.player_to_move() == challenger_color;
        let start = Instant::now();
        let action = if challenger_to_move {
            challenger.best_action(&mut position)?
        } else {
            opponent.best_action(&mut position)?
        };
        let elapsed = start.elapsed();

        if challenger_to_move {
            challenger_time += elapsed;
            challenger_moves += 1;
        } else {
            opponent_time += elapsed;
            opponent_moves += 1;
        }
        position.apply(action)?;
    }

    Ok(GameRecord {
        game_number,
        challenger_color,
        winner: position.player_to_move().opponent(),
        plies: position.ply(),
        challenger_time,
        challenger_moves,
        opponent_time,
        opponent_moves,
    })
}

/// Compute aggregate statistics from game records
pub fn compute_statistics(args: &ArenaArgs, games: Vec<GameRecord>) -> ArenaResults {
    let challenger_wins = games.iter().filter(|g| g.challenger_won()).count();
    let white_wins = games.iter().filter(|g| g.winner == Color::White).count();
    let black_wins = games.len() - white_wins;

    let total_plies: u32 = games.iter().map(|g| g.plies).sum();
    let avg_plies = if games.is_empty() {
        0.0
    } else {
        total_plies as f32 / games.len() as f32
    };

    let challenger_ms_per_move = ms_per_move(
        games.iter().map(|g| g.challenger_time).sum(),
        games.iter().map(|g| g.challenger_moves).sum(),
    );
    let opponent_ms_per_move = ms_per_move(
        games.iter().map(|g| g.opponent_time).sum(),
        games.iter().map(|g| g.opponent_moves).sum(),
    );

    ArenaResults {
        challenger: args.challenger,
        opponent: args.opponent,
        games,
        challenger_wins,
        white_wins,
        black_wins,
        avg_plies,
        challenger_ms_per_move,
        opponent_ms_per_move,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn ms_per_move(total: Duration, moves: u32) -> f64 {
    if moves == 0 {
        0.0
    } else {
        total.as_secs_f64() * 1000.0 / f64::from(moves)
    }
}

fn percent(count: usize, total: usize) -> f32 {
    if total > 0 {
        count as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

/// Print results as JSON
fn print_json_results(results: &ArenaResults) {
    #[derive(Serialize)]
    struct JsonOutput<'a> {
        challenger: String,
        opponent: String,
        total_games: usize,
        challenger_wins: usize,
        white_wins: usize,
        black_wins: usize,
        win_rate: f32,
        avg_plies: f32,
        challenger_ms_per_move: f64,
        opponent_ms_per_move: f64,
        games: &'a [GameRecord],
    }

    let output = JsonOutput {
        challenger: results.challenger.to_string(),
        opponent: results.opponent.to_string(),
        total_games: results.games.len(),
        challenger_wins: results.challenger_wins,
        white_wins: results.white_wins,
        black_wins: results.black_wins,
        win_rate: results.win_rate(),
        avg_plies: results.avg_plies,
        challenger_ms_per_move: results.challenger_ms_per_move,
        opponent_ms_per_move: results.opponent_ms_per_move,
        games: &results.games,
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::warn!("Failed to serialize results: {}", e),
    }
}

/// Print results as text
fn print_text_results(results: &ArenaResults) {
    let total = results.games.len();

    println!("\n=== Arena Results ===");
    println!("{} vs {}", results.challenger, results.opponent);
    println!("Total games: {}", total);
    println!(
        "Challenger wins: {} ({:.1}%)",
        results.challenger_wins,
        percent(results.challenger_wins, total)
    );
    println!(
        "White wins:      {} ({:.1}%)",
        results.white_wins,
        percent(results.white_wins, total)
    );
    println!(
        "Black wins:      {} ({:.1}%)",
        results.black_wins,
        percent(results.black_wins, total)
    );
    println!("Average plies:   {:.1}", results.avg_plies);
    println!(
        "Think time:      challenger {:.2} ms/move, opponent {:.2} ms/move",
        results.challenger_ms_per_move, results.opponent_ms_per_move
    );
}
