//! Search graph: nodes shared across transpositions
//!
//! Nodes live in an arena and are found by position hash, so every move
//! order reaching the same position updates the same statistics.
//!
//! ## Architecture
//! - Level 2: Graph operations (lookup-or-insert, clear)
//! - Level 3: Node and edge accessors

use breakthrough_core::Action;
use rustc_hash::FxHashMap;

// ============================================================================
// TYPES
// ============================================================================

/// Node identifier (index into arena)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// One legal action out of a node with its accumulated statistics.
///
/// `total` is credited from the point of view of the side that plays
/// `action`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub action: Action,
    pub visits: u32,
    pub total: f64,
}

impl Edge {
    pub fn new(action: Action, total: f64) -> Self {
        Self {
            action,
            visits: 0,
            total,
        }
    }

    /// Smoothed average reward, `total / (visits + 1)`
    #[inline]
    pub fn average(&self) -> f64 {
        self.total / (f64::from(self.visits) + 1.0)
    }

    /// UCB1 score given the visit count of the parent node
    #[inline]
    pub fn ucb(&self, parent_visits: u32, exploration: f64) -> f64 {
        let n = f64::from(self.visits) + 1.0;
        self.average() + exploration * (f64::from(parent_visits).ln() / n).sqrt()
    }
}

/// A searched position
#[derive(Clone, Debug, Default)]
pub struct Node {
    /// Position hash
    pub key: u64,
    /// Times the node was expanded or passed through
    pub visits: u32,
    /// Filled once, on the first visit
    pub children: Vec<Edge>,
}

impl Node {
    fn new(key: u64) -> Self {
        Self {
            key,
            visits: 0,
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn is_visited(&self) -> bool {
        self.visits > 0
    }

    /// Expanded without any legal action: the side to move has lost
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.visits > 0 && self.children.is_empty()
    }

    /// Index of the child with the most visits, first one on ties
    pub fn most_visited(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, edge) in self.children.iter().enumerate() {
            if best.map_or(true, |b| edge.visits > self.children[b].visits) {
                best = Some(i);
            }
        }
        best
    }
}

// ============================================================================
// SEARCH GRAPH (Level 2 - Graph Operations)
// ============================================================================

/// Arena of nodes indexed by position hash.
///
/// Hash collisions are not detected: two positions with the same 64-bit key
/// share a node.
#[derive(Debug, Default)]
pub struct SearchGraph {
    nodes: Vec<Node>,
    index: FxHashMap<u64, NodeId>,
}

impl SearchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Node for `key`, created unvisited if absent
    pub fn get_node(&mut self, key: u64) -> NodeId {
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(key));
        self.index.insert(key, id);
        id
    }

    /// Node for `key` if one exists
    pub fn find(&self, key: u64) -> Option<NodeId> {
        self.index.get(&key).copied()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node (new game)
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }
}

// ============================================================================
// TESTS
// ============================================================================
