use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;

use super::EdgeId;

/// A vertex of the [`FlowGraph`](super::FlowGraph).
///
/// The adjacency lists can only be changed by the graph (through [`Edge`](super::Edge)
/// registration), which keeps them in agreement with the edge set. Disabling a node keeps its
/// adjacency intact so that it can be re-enabled in constant time.
#[derive(Clone, Debug)]
pub struct Node<Identity> {
    identity: Identity,
    enabled: bool,
    /// The traversal pass in which this node was last visited; `0` means never.
    visit: u32,
    /// Outgoing edges in insertion order
    out_edges: Vec<EdgeId>,
    /// Incoming edges in insertion order
    in_edges: Vec<EdgeId>,
}

impl<Identity> Node<Identity> {
    pub(super) fn new(identity: Identity) -> Self {
        Node {
            identity,
            enabled: true,
            visit: 0,
            out_edges: Vec::new(),
            in_edges: Vec::new(),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The outgoing edges; the order determines tie-breaking during augmenting path search.
    pub fn out_edges(&self) -> &[EdgeId] {
        &self.out_edges
    }

    pub fn in_edges(&self) -> &[EdgeId] {
        &self.in_edges
    }

    /// The stamp of the last traversal pass which visited this node.
    ///
    /// Only meaningful when compared against the pass currently running; see
    /// [`FlowGraph::begin_pass`](super::FlowGraph::begin_pass).
    pub fn visit(&self) -> u32 {
        self.visit
    }

    pub(super) fn set_visit(&mut self, visit: u32) {
        self.visit = visit;
    }

    pub(super) fn set_enabled(&mut self) {
        self.enabled = true;
    }

    pub(super) fn set_disabled(&mut self) {
        self.enabled = false;
    }

    pub(super) fn add_out_edge(&mut self, edge: EdgeId) {
        self.out_edges.push(edge);
    }

    pub(super) fn add_in_edge(&mut self, edge: EdgeId) {
        self.in_edges.push(edge);
    }

    /// Removes `edge` while preserving the order of the remaining edges.
    pub(super) fn remove_out_edge(&mut self, edge: EdgeId) -> bool {
        remove_preserving_order(&mut self.out_edges, edge)
    }

    pub(super) fn remove_in_edge(&mut self, edge: EdgeId) -> bool {
        remove_preserving_order(&mut self.in_edges, edge)
    }
}

fn remove_preserving_order(edges: &mut Vec<EdgeId>, edge: EdgeId) -> bool {
    match edges.iter().position(|&other| other == edge) {
        Some(position) => {
            let _ = edges.remove(position);
            true
        }
        None => false,
    }
}

impl<Identity: Debug> Display for Node<Identity> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} [{}] out: {:?} in: {:?}",
            self.identity,
            if self.enabled { "enabled" } else { "disabled" },
            self.out_edges,
            self.in_edges
        )
    }
}
