use std::fmt::Display;
use std::fmt::Formatter;

use super::node::Node;
use super::EdgeId;
use super::NodeId;
use crate::basic_types::Capacity;
use crate::containers::KeyedVec;

/// A directed, capacitated connection between two nodes of a [`FlowGraph`](super::FlowGraph).
///
/// The flow is written by the [`MaxFlowSolver`](crate::max_flow::MaxFlowSolver) only; between two
/// solves it holds the flow of the last solve (or zero after the capacity changed).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    source: NodeId,
    target: NodeId,
    capacity: Capacity,
    flow: Capacity,
    enabled: bool,
}

impl Edge {
    pub(super) fn new(source: NodeId, target: NodeId, capacity: Capacity) -> Self {
        Edge {
            source,
            target,
            capacity,
            flow: 0.0,
            enabled: true,
        }
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn flow(&self) -> Capacity {
        self.flow
    }

    /// The capacity which is left in the forward direction.
    pub fn residual_capacity(&self) -> Capacity {
        self.capacity - self.flow
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_flow(&mut self, flow: Capacity) {
        self.flow = flow;
    }

    pub(super) fn set_capacity(&mut self, capacity: Capacity) {
        self.capacity = capacity;
        self.flow = 0.0;
    }

    pub(super) fn set_enabled(&mut self) {
        self.enabled = true;
    }

    pub(super) fn set_disabled(&mut self) {
        self.enabled = false;
    }

    /// Registers the edge with handle `id` in the adjacency lists of both of its endpoints.
    ///
    /// The caller guarantees that both endpoints are live nodes.
    pub(super) fn connect<Identity>(
        &self,
        id: EdgeId,
        nodes: &mut KeyedVec<NodeId, Option<Node<Identity>>>,
    ) {
        if let Some(source) = nodes[self.source].as_mut() {
            source.add_out_edge(id);
        }
        if let Some(target) = nodes[self.target].as_mut() {
            target.add_in_edge(id);
        }
    }

    /// Removes the edge with handle `id` from the adjacency lists of both of its endpoints.
    pub(super) fn disconnect<Identity>(
        &self,
        id: EdgeId,
        nodes: &mut KeyedVec<NodeId, Option<Node<Identity>>>,
    ) {
        if let Some(source) = nodes[self.source].as_mut() {
            let _ = source.remove_out_edge(id);
        }
        if let Some(target) = nodes[self.target].as_mut() {
            let _ = target.remove_in_edge(id);
        }
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} [{}/{}]{}",
            self.source,
            self.target,
            self.flow,
            self.capacity,
            if self.enabled { "" } else { " (disabled)" }
        )
    }
}
