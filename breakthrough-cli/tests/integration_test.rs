//! Integration tests for the Breakthrough engine
//!
//! Tests the full stack: board model, apply/undo protocol, MCTS search over
//! the transposition graph, agents and the turn protocol.

use std::io::Cursor;

use breakthrough_cli::arena::{play_arena, ArenaArgs};
use breakthrough_cli::play::run_session;
use breakthrough_cli::{EngineConfig, Player, PlayerType};
use breakthrough_core::{Action, Color, Position};
use breakthrough_mcts::{Mcts, MctsConfig, SearchGraph};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn act(s: &str) -> Action {
    s.parse().unwrap()
}

fn quick_config() -> EngineConfig {
    EngineConfig {
        iterations: 40,
        greedy_iterations: 100,
        seed: Some(17),
        ..Default::default()
    }
}

// ============================================================================
// BOARD AND SEARCH
// ============================================================================

#[test]
fn test_initial_position_has_22_actions() {
    let pos = Position::new();
    let actions = pos.compute_valid_actions();
    assert_eq!(actions.len(), 22);
    // edge pawns have one forward and one diagonal action
    assert_eq!(
        actions.iter().filter(|a| a.from_square().column() == 0).count(),
        2
    );
}

#[test]
fn test_one_iteration_search_returns_legal_action() {
    let mut mcts = Mcts::with_config(MctsConfig::default().with_iterations(1).with_seed(1));
    let mut pos = Position::new();
    let legal = pos.compute_valid_actions();
    let action = mcts.best_action(&mut pos).unwrap();
    assert!(legal.contains(&action));
}

#[test]
fn test_search_restores_position_through_a_game() {
    let mut mcts = Mcts::new(MctsConfig::default().with_iterations(60).with_seed(2), SearchGraph::new());
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut pos = Position::new();

    while !pos.is_lost() {
        let hash = pos.position_hash();
        let board = *pos.board();
        let action = if pos.player_to_move() == Color::White {
            mcts.best_action(&mut pos).unwrap()
        } else {
            *pos.compute_valid_actions().choose(&mut rng).unwrap()
        };
        assert_eq!(pos.position_hash(), hash);
        assert_eq!(*pos.board(), board);
        assert_eq!(pos.position_hash(), pos.compute_hash());
        pos.apply(action).unwrap();
    }
}

#[test]
fn test_transposed_paths_share_statistics() {
    let mut mcts = Mcts::with_config(MctsConfig::default().with_iterations(50).with_seed(3));

    // a2a3 h7h6 b2b3 and b2b3 h7h6 a2a3 reach the same position
    let mut first = Position::new();
    for s in ["a2a3", "h7h6", "b2b3"] {
        first.apply(act(s)).unwrap();
    }
    mcts.best_action(&mut first).unwrap();
    let key = first.position_hash();
    let visits = mcts.graph().node(mcts.graph().find(key).unwrap()).visits;

    let mut second = Position::new();
    for s in ["b2b3", "h7h6", "a2a3"] {
        second.apply(act(s)).unwrap();
    }
    assert_eq!(second.position_hash(), key);
    mcts.best_action(&mut second).unwrap();

    let node = mcts.graph().node(mcts.graph().find(key).unwrap());
    assert_eq!(node.visits, visits + 50);
}

// ============================================================================
// AGENTS AND PROTOCOL
// ============================================================================

#[test]
fn test_play_session_answers_each_turn() {
    let config = quick_config();
    let mut player = Player::new(PlayerType::Mcts, &config, None);
    let mut position = Position::new();

    // we are black: white opens with e2e3
    let legal: Vec<String> = {
        let mut p = Position::new();
        p.apply(act("e2e3")).unwrap();
        p.compute_valid_actions().iter().map(|a| a.to_string()).collect()
    };
    let input = format!("e2e3\n{}\n{}\n", legal.len(), legal.join("\n"));
    let mut output = Vec::new();

    let moves = run_session(&mut player, &mut position, &config, Cursor::new(input), &mut output).unwrap();
    assert_eq!(moves, 1);

    let reply = String::from_utf8(output).unwrap();
    let reply: Action = reply.trim().parse().unwrap();
    assert_eq!(position.ply(), 2);
    assert_eq!(position.last_action(), reply);
    assert!(reply.from_square().row() >= 6);
}

#[test]
fn test_play_session_moving_first() {
    let config = quick_config();
    let mut player = Player::new(PlayerType::Random, &config, None);
    let mut position = Position::new();
    let mut output = Vec::new();

    let moves = run_session(&mut player, &mut position, &config, Cursor::new("None\n0\n"), &mut output).unwrap();
    assert_eq!(moves, 1);
    assert_eq!(position.player_to_move(), Color::Black);
}

#[test]
fn test_arena_game_completes() {
    let args = ArenaArgs {
        challenger: PlayerType::Greedy,
        opponent: PlayerType::Random,
        games: 2,
        parallel: false,
        json: true,
    };
    let results = play_arena(&args, &quick_config()).unwrap();
    assert_eq!(results.games.len(), 2);
    for game in &results.games {
        assert!(game.plies > 0);
        assert!(game.challenger_moves > 0);
    }
}

#[test]
fn test_dump_game_writes_one_tree_per_mcts_move() {
    let dir = std::env::temp_dir().join(format!("breakthrough-trees-{}", std::process::id()));
    let config = EngineConfig {
        iterations: 20,
        max_nodes: 50,
        tree_dir: dir.clone(),
        ..quick_config()
    };

    let files = breakthrough_cli::dump_tree::dump_game(&config).unwrap();
    assert!(!files.is_empty());
    // white moves on even plies
    assert_eq!(files[0], config.tree_path(0));
    for file in &files {
        let text = std::fs::read_to_string(file).unwrap();
        let dump: serde_json::Value = serde_json::from_str(&text).unwrap();
        let nodes = dump["nodes"].as_array().unwrap();
        assert!(!nodes.is_empty() && nodes.len() <= 50);
    }

    std::fs::remove_dir_all(&dir).unwrap();
}
