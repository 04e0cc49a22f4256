use std::fmt::Debug;
use std::hash::Hash;

use crate::basic_types::Capacity;
use crate::graph::EdgeId;
use crate::graph::FlowGraph;
use crate::graph::NodeId;

/// The result of [`MaxFlowSolver::solve`](super::MaxFlowSolver::solve).
///
/// The per-edge flow assignment is stored in the edges of the solved graph; this structure keeps
/// the value and the nodes which are reachable from the source in the final residual graph, from
/// which the minimum cut is derived.
#[derive(Clone, Debug, PartialEq)]
pub struct MaxFlow {
    pub(crate) value: Capacity,
    pub(crate) augmentations: usize,
    pub(crate) source: NodeId,
    pub(crate) sink: NodeId,
    /// Sorted by id
    pub(crate) source_side: Vec<NodeId>,
}

/// A set of usable edges whose removal disconnects the sink from the source.
#[derive(Clone, Debug, PartialEq)]
pub struct MinimumCut {
    /// The edges crossing from the source side to the sink side, in creation order
    pub edges: Vec<EdgeId>,
    /// The sum of the capacities of [`MinimumCut::edges`]
    pub capacity: Capacity,
}

impl MaxFlow {
    pub fn value(&self) -> Capacity {
        self.value
    }

    /// The number of augmenting paths which were used.
    pub fn augmentations(&self) -> usize {
        self.augmentations
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }

    /// The nodes reachable from the source in the final residual graph, including the source.
    pub fn source_side(&self) -> &[NodeId] {
        &self.source_side
    }

    pub fn is_on_source_side(&self, node: NodeId) -> bool {
        self.source_side.binary_search(&node).is_ok()
    }

    /// The usable edges leading from the source side to the sink side.
    ///
    /// By max-flow/min-cut duality their capacities sum to [`MaxFlow::value`]. The graph must be
    /// the one which was solved, without mutations in between.
    pub fn minimum_cut<Identity: Clone + Eq + Hash + Debug>(
        &self,
        graph: &FlowGraph<Identity>,
    ) -> MinimumCut {
        let edges = graph
            .edges()
            .filter(|(id, edge)| {
                graph.is_usable(*id)
                    && self.is_on_source_side(edge.source())
                    && !self.is_on_source_side(edge.target())
            })
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        let capacity = edges
            .iter()
            .filter_map(|&id| graph.edge(id))
            .map(|edge| edge.capacity())
            .sum();
        MinimumCut { edges, capacity }
    }
}
