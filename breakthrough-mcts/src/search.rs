//! MCTS Search Loop
//!
//! Each iteration walks the live position down the graph and back:
//! 1. Selection - follow the UCB1 edge, applying its action, until a node
//!    that is unvisited or terminal
//! 2. Expansion - one edge per legal action, seeded by random playouts
//! 3. Evaluation - terminal reward, or the best seeded child of the new node
//! 4. Backpropagation - credit each edge on the path and undo its action
//!
//! ## Architecture
//! - Level 2: Search loop coordination
//! - Level 3: Individual MCTS phases
//! - Level 4: Statistics

use breakthrough_core::{Action, Position, MAX_PLY};
use serde::Serialize;

use crate::error::{MctsError, Result};
use crate::graph::{Edge, NodeId, SearchGraph};
use crate::rollout::RolloutEngine;
use crate::MctsConfig;

// ============================================================================
// STATISTICS
// ============================================================================

/// Counters accumulated over searches until [`Mcts::reset`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub searches: u64,
    pub iterations: u64,
    pub selections: u64,
    pub expansions: u64,
    pub terminal_hits: u64,
    pub rollouts: u64,
}

/// Statistics for a single action at the root
#[derive(Clone, Debug, Serialize)]
pub struct RootStatistics {
    pub action: Action,
    pub visits: u32,
    pub average: f64,
}

/// One step of the selection path: the node left and the edge taken
#[derive(Clone, Copy, Debug)]
struct PathStep {
    node: NodeId,
    edge: usize,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Search engine bound to a graph it owns for the length of a game.
///
/// The graph persists between calls to `best_action`, so statistics gathered
/// while thinking about one move are reused for the next.
pub struct Mcts {
    config: MctsConfig,
    graph: SearchGraph,
    rollout: RolloutEngine,
    path: Vec<PathStep>,
    actions: Vec<Action>,
    stats: SearchStats,
}

impl Mcts {
    pub fn new(config: MctsConfig, graph: SearchGraph) -> Self {
        let rollout = RolloutEngine::from_seed(config.seed);
        Self {
            config,
            graph,
            rollout,
            path: Vec::with_capacity(MAX_PLY),
            actions: Vec::new(),
            stats: SearchStats::default(),
        }
    }

    /// Engine with a fresh, empty graph
    pub fn with_config(config: MctsConfig) -> Self {
        Self::new(config, SearchGraph::new())
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut MctsConfig {
        &mut self.config
    }

    pub fn graph(&self) -> &SearchGraph {
        &self.graph
    }

    pub fn into_graph(self) -> SearchGraph {
        self.graph
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Clear the graph and counters (new game)
    pub fn reset(&mut self) {
        self.graph.clear();
        self.path.clear();
        self.stats = SearchStats::default();
        self.rollout.reset_counter();
    }

    // ========================================================================
    // Level 2: Search Loop
    // ========================================================================

    /// Run the configured number of iterations from `position` and return
    /// the most visited root action.
    ///
    /// `position` is mutated during the search and restored before this
    /// returns, also when an error is returned.
    pub fn best_action(&mut self, position: &mut Position) -> Result<Action> {
        if position.is_lost() {
            return Err(MctsError::RootIsTerminal {
                loser: position.player_to_move(),
            });
        }

        let root = self.setup_root(position)?;
        let root_key = position.position_hash();

        for _ in 0..self.config.iterations {
            if let Err(err) = self.iterate(position, root) {
                self.abandon_path(position);
                return Err(err);
            }
            debug_assert_eq!(position.position_hash(), root_key);
        }

        self.stats.searches += 1;
        self.stats.rollouts = self.rollout.rollouts();
        tracing::debug!(
            "search: {} iterations, {} nodes, stats {:?}",
            self.config.iterations,
            self.graph.len(),
            self.stats
        );

        let node = self.graph.node(root);
        let best = node
            .most_visited()
            .ok_or(MctsError::NotSearched(root_key))?;
        Ok(node.children[best].action)
    }

    /// Root node for the live position, expanded if it has not been yet
    fn setup_root(&mut self, position: &mut Position) -> Result<NodeId> {
        self.path.clear();
        let root = self.graph.get_node(position.position_hash());
        if !self.graph.node(root).is_visited() {
            self.expand(position, root)?;
        }
        Ok(root)
    }

    /// One selection/expansion/backpropagation cycle
    fn iterate(&mut self, position: &mut Position, root: NodeId) -> Result<()> {
        let leaf = self.select(position, root)?;

        let reward = if self.graph.node(leaf).is_visited() {
            self.stats.terminal_hits += 1;
            self.graph.node_mut(leaf).visits += 1;
            terminal_reward(position)
        } else {
            self.expand(position, leaf)?;
            let node = self.graph.node(leaf);
            match node.children.first() {
                Some(best) => 1.0 - best.average(),
                None => terminal_reward(position),
            }
        };

        self.stats.iterations += 1;
        self.backpropagate(position, reward)
    }

    // ========================================================================
    // Level 3: MCTS Phases
    // ========================================================================

    /// Descend by UCB1 until an unvisited or terminal node, applying each
    /// chosen action to `position`.
    fn select(&mut self, position: &mut Position, root: NodeId) -> Result<NodeId> {
        let exploration = self.config.exploration;
        let mut current = root;

        loop {
            let node = self.graph.node_mut(current);
            if !node.is_visited() || node.is_terminal() {
                break;
            }
            node.visits += 1;
            let edge = select_ucb(&node.children, node.visits, exploration);
            let action = node.children[edge].action;

            position.apply(action)?;
            self.path.push(PathStep {
                node: current,
                edge,
            });
            current = self.graph.get_node(position.position_hash());
        }

        self.stats.selections += 1;
        Ok(current)
    }

    /// Give `id` one edge per legal action, best seeded edge first, and mark
    /// it visited. A lost position becomes a terminal node.
    fn expand(&mut self, position: &mut Position, id: NodeId) -> Result<()> {
        let mut children = Vec::new();
        if !position.is_lost() {
            position.fill_valid_actions(&mut self.actions);
            children.reserve(self.actions.len());
            for &action in &self.actions {
                let seed = self
                    .rollout
                    .sample(position, action, self.config.initial_samples)?;
                children.push(Edge::new(action, seed));
            }
            // stable: equal seeds keep move generation order
            children.sort_by(|a, b| b.total.total_cmp(&a.total));
        }

        let node = self.graph.node_mut(id);
        node.children = children;
        node.visits = 1;
        self.stats.expansions += 1;
        Ok(())
    }

    /// Credit every edge on the path, flipping the reward at each ply, and
    /// undo its action.
    fn backpropagate(&mut self, position: &mut Position, mut reward: f64) -> Result<()> {
        while let Some(step) = self.path.pop() {
            let edge = &mut self.graph.node_mut(step.node).children[step.edge];
            edge.total += reward;
            edge.visits += 1;
            reward = 1.0 - reward;
            position.undo(edge.action)?;
        }
        Ok(())
    }

    /// Undo whatever is left of the path after a failed iteration
    fn abandon_path(&mut self, position: &mut Position) {
        while let Some(step) = self.path.pop() {
            let action = self.graph.node(step.node).children[step.edge].action;
            if let Err(err) = position.undo(action) {
                tracing::warn!("could not unwind search path: {}", err);
                self.path.clear();
                break;
            }
        }
    }

    // ========================================================================
    // Level 4: Statistics
    // ========================================================================

    /// Per-action statistics of the node for `position`, in edge order
    pub fn root_statistics(&self, position: &Position) -> Result<Vec<RootStatistics>> {
        let key = position.position_hash();
        let id = self
            .graph
            .find(key)
            .filter(|&id| self.graph.node(id).is_visited())
            .ok_or(MctsError::NotSearched(key))?;
        Ok(self
            .graph
            .node(id)
            .children
            .iter()
            .map(|e| RootStatistics {
                action: e.action,
                visits: e.visits,
                average: e.average(),
            })
            .collect())
    }
}

/// Index of the edge with the highest UCB1 score, first one on ties
fn select_ucb(children: &[Edge], parent_visits: u32, exploration: f64) -> usize {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, edge) in children.iter().enumerate() {
        let score = edge.ucb(parent_visits, exploration);
        if score > best_score {
            best = i;
            best_score = score;
        }
    }
    best
}

/// Reward of a leaf for the side that moved into it: 1.0 when that move
/// left the opponent lost.
fn terminal_reward(position: &Position) -> f64 {
    if position.is_lost() {
        1.0
    } else {
        0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use breakthrough_core::Color;

    fn engine(iterations: u32, seed: u64) -> Mcts {
        Mcts::with_config(
            MctsConfig::default()
                .with_iterations(iterations)
                .with_seed(seed),
        )
    }

    #[test]
    fn test_single_iteration_returns_legal_action() {
        let mut mcts = engine(1, 1);
        let mut pos = Position::new();
        let action = mcts.best_action(&mut pos).unwrap();
        assert!(pos.compute_valid_actions().contains(&action));
    }

    #[test]
    fn test_zero_iterations_still_answers() {
        let mut mcts = engine(0, 1);
        let mut pos = Position::new();
        let action = mcts.best_action(&mut pos).unwrap();
        assert!(pos.is_legal(action));
    }

    #[test]
    fn test_position_restored_after_search() {
        let mut mcts = engine(200, 2);
        let mut pos = Position::new();
        pos.apply("e2e3".parse().unwrap()).unwrap();
        let hash = pos.position_hash();
        let board = *pos.board();
        let depth = pos.history_depth();

        mcts.best_action(&mut pos).unwrap();
        assert_eq!(pos.position_hash(), hash);
        assert_eq!(*pos.board(), board);
        assert_eq!(pos.history_depth(), depth);
        assert_eq!(pos.player_to_move(), Color::Black);
    }

    #[test]
    fn test_root_visits_account_for_iterations() {
        let mut mcts = engine(50, 3);
        let mut pos = Position::new();
        mcts.best_action(&mut pos).unwrap();

        let root = mcts.graph().find(pos.position_hash()).unwrap();
        let node = mcts.graph().node(root);
        // one visit from expansion, one per pass through the root
        assert_eq!(node.visits, 51);
        let edge_visits: u32 = node.children.iter().map(|e| e.visits).sum();
        assert_eq!(edge_visits, 50);
        assert_eq!(mcts.stats().iterations, 50);
    }

    #[test]
    fn test_root_children_cover_legal_actions() {
        let mut mcts = engine(10, 4);
        let mut pos = Position::new();
        mcts.best_action(&mut pos).unwrap();

        let stats = mcts.root_statistics(&pos).unwrap();
        let mut searched: Vec<Action> = stats.iter().map(|s| s.action).collect();
        let mut legal = pos.compute_valid_actions();
        searched.sort_by_key(|a| a.raw());
        legal.sort_by_key(|a| a.raw());
        assert_eq!(searched, legal);
    }

    #[test]
    fn test_finds_winning_move() {
        let mut mcts = engine(300, 5);
        let mut pos = Position::from_diagram(
            "
            . . . . . . . .
            . . W . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            W . . . B B . .
            . . . . . . . .
            ",
            Color::White,
        )
        .unwrap();
        let action = mcts.best_action(&mut pos).unwrap();
        assert_eq!(action.to_square().row(), 7);
    }

    #[test]
    fn test_blocks_forced_loss() {
        // black threatens to reach row 1 next move; only capturing c2 helps
        let mut mcts = engine(2000, 6);
        let mut pos = Position::from_diagram(
            "
            . . . . . . . .
            . . . . . . B .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . B . . . . .
            . W . . . . . W
            ",
            Color::White,
        )
        .unwrap();
        let action = mcts.best_action(&mut pos).unwrap();
        assert_eq!(action, "b1c2".parse().unwrap());
    }

    #[test]
    fn test_terminal_root_rejected() {
        let mut mcts = engine(10, 1);
        let mut pos = Position::from_diagram(
            "
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . B . . . W
            ",
            Color::White,
        )
        .unwrap();
        assert!(matches!(
            mcts.best_action(&mut pos),
            Err(MctsError::RootIsTerminal { loser: Color::White })
        ));
    }

    #[test]
    fn test_graph_persists_between_moves() {
        let mut mcts = engine(100, 7);
        let mut pos = Position::new();
        let first = mcts.best_action(&mut pos).unwrap();
        let nodes = mcts.graph().len();
        pos.apply(first).unwrap();
        let reply = mcts.best_action(&mut pos).unwrap();
        assert!(pos.is_legal(reply));
        assert!(mcts.graph().len() >= nodes);
    }

    #[test]
    fn test_reset_clears_graph() {
        let mut mcts = engine(20, 8);
        let mut pos = Position::new();
        mcts.best_action(&mut pos).unwrap();
        assert!(!mcts.graph().is_empty());
        mcts.reset();
        assert!(mcts.graph().is_empty());
        assert_eq!(mcts.stats(), &SearchStats::default());
        assert!(matches!(
            mcts.root_statistics(&pos),
            Err(MctsError::NotSearched(_))
        ));
    }

    #[test]
    fn test_transpositions_share_nodes() {
        let mut mcts = engine(400, 9);
        let mut pos = Position::new();
        mcts.best_action(&mut pos).unwrap();

        let mut a = Position::new();
        for s in ["a2a3", "h7h6", "b2b3"] {
            a.apply(s.parse().unwrap()).unwrap();
        }
        let mut b = Position::new();
        for s in ["b2b3", "h7h6", "a2a3"] {
            b.apply(s.parse().unwrap()).unwrap();
        }
        assert_eq!(a.position_hash(), b.position_hash());

        let mut graph = mcts.into_graph();
        let before = graph.len();
        let id_a = graph.get_node(a.position_hash());
        let id_b = graph.get_node(b.position_hash());
        assert_eq!(id_a, id_b);
        assert!(graph.len() <= before + 1);
    }

    #[test]
    fn test_select_ucb_prefers_first_on_ties() {
        let children = [
            Edge::new("a2a3".parse().unwrap(), 0.5),
            Edge::new("b2b3".parse().unwrap(), 0.5),
        ];
        assert_eq!(select_ucb(&children, 4, 1.4), 0);
    }

    #[test]
    fn test_same_seed_same_choice() {
        let mut pos = Position::new();
        let a = engine(100, 11).best_action(&mut pos).unwrap();
        let b = engine(100, 11).best_action(&mut pos).unwrap();
        assert_eq!(a, b);
    }
}
