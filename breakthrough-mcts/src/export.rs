//! Read-only export of the searched graph for offline inspection

use std::io::Write;

use breakthrough_core::{Action, Position};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::SearchGraph;
use crate::search::Mcts;

/// One outgoing edge of an exported node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub action: Action,
    pub visits: u32,
    pub total_reward: f64,
}

/// A visited node, hash rendered as 16 hex digits
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub hash: String,
    pub visit_count: u32,
    pub children: Vec<EdgeRecord>,
}

/// Everything written by [`write_json`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeDump {
    pub ply: u32,
    pub root: String,
    pub nodes: Vec<NodeRecord>,
}

pub fn format_hash(key: u64) -> String {
    format!("{:016x}", key)
}

/// Collect up to `max_nodes` visited nodes reachable from `position`, depth
/// first in edge order. Each node appears once even when reached through
/// several move orders.
///
/// Navigation applies and undoes edge actions on `position`; it is back at
/// its starting state when this returns.
pub fn export_graph(
    graph: &SearchGraph,
    position: &mut Position,
    max_nodes: usize,
) -> Result<Vec<NodeRecord>> {
    let mut records = Vec::new();
    let mut seen = FxHashSet::default();
    visit(graph, position, max_nodes, &mut seen, &mut records)?;
    Ok(records)
}

fn visit(
    graph: &SearchGraph,
    position: &mut Position,
    max_nodes: usize,
    seen: &mut FxHashSet<u64>,
    records: &mut Vec<NodeRecord>,
) -> Result<()> {
    let key = position.position_hash();
    if records.len() >= max_nodes || !seen.insert(key) {
        return Ok(());
    }
    let node = match graph.find(key) {
        Some(id) if graph.node(id).is_visited() => graph.node(id),
        _ => return Ok(()),
    };

    records.push(NodeRecord {
        hash: format_hash(key),
        visit_count: node.visits,
        children: node
            .children
            .iter()
            .map(|e| EdgeRecord {
                action: e.action,
                visits: e.visits,
                total_reward: e.total,
            })
            .collect(),
    });

    for edge in node.children.iter().filter(|e| e.visits > 0) {
        position.apply(edge.action)?;
        let result = visit(graph, position, max_nodes, seen, records);
        position.undo(edge.action)?;
        result?;
    }
    Ok(())
}

/// Serialize the exported graph as a [`TreeDump`] JSON document
pub fn write_json<W: Write>(
    graph: &SearchGraph,
    position: &mut Position,
    max_nodes: usize,
    writer: W,
) -> Result<()> {
    let dump = TreeDump {
        ply: position.ply(),
        root: format_hash(position.position_hash()),
        nodes: export_graph(graph, position, max_nodes)?,
    };
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

impl Mcts {
    pub fn export_graph(&self, position: &mut Position, max_nodes: usize) -> Result<Vec<NodeRecord>> {
        export_graph(self.graph(), position, max_nodes)
    }

    pub fn write_json<W: Write>(&self, position: &mut Position, max_nodes: usize, writer: W) -> Result<()> {
        write_json(self.graph(), position, max_nodes, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MctsConfig;

    fn searched(iterations: u32) -> (Mcts, Position) {
        let mut mcts = Mcts::with_config(
            MctsConfig::default()
                .with_iterations(iterations)
                .with_seed(21),
        );
        let mut pos = Position::new();
        mcts.best_action(&mut pos).unwrap();
        (mcts, pos)
    }

    #[test]
    fn test_export_starts_at_root() {
        let (mcts, mut pos) = searched(100);
        let records = mcts.export_graph(&mut pos, 1000).unwrap();
        assert_eq!(records[0].hash, format_hash(pos.position_hash()));
        assert_eq!(records[0].visit_count, 101);
        assert_eq!(records[0].children.len(), 22);
        assert_eq!(pos.history_depth(), 0);
    }

    #[test]
    fn test_export_respects_limit_and_uniqueness() {
        let (mcts, mut pos) = searched(300);
        let records = mcts.export_graph(&mut pos, 10).unwrap();
        assert_eq!(records.len(), 10);

        let all = mcts.export_graph(&mut pos, usize::MAX).unwrap();
        let unique: std::collections::HashSet<_> = all.iter().map(|r| r.hash.clone()).collect();
        assert_eq!(unique.len(), all.len());
        assert!(all.iter().all(|r| r.visit_count > 0));
    }

    #[test]
    fn test_write_json() {
        let (mcts, mut pos) = searched(50);
        let mut out = Vec::new();
        mcts.write_json(&mut pos, 5, &mut out).unwrap();

        let dump: TreeDump = serde_json::from_slice(&out).unwrap();
        assert_eq!(dump.ply, 0);
        assert_eq!(dump.root.len(), 16);
        assert_eq!(dump.nodes.len(), 5);
        assert_eq!(dump.nodes[0].hash, dump.root);
    }

    #[test]
    fn test_unsearched_position_exports_nothing() {
        let graph = SearchGraph::new();
        let mut pos = Position::new();
        assert!(export_graph(&graph, &mut pos, 10).unwrap().is_empty());
    }
}
