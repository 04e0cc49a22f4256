use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;

use log::debug;
use log::trace;

use super::MaxFlow;
use crate::basic_types::approximately_equal;
use crate::basic_types::is_positive;
use crate::basic_types::Capacity;
use crate::basic_types::ConstructionError;
use crate::basic_types::FlowError;
use crate::basic_types::InconsistencyError;
use crate::containers::KeyedVec;
use crate::create_statistics_struct;
use crate::flow_asserts::flow_assert_advanced;
use crate::flow_asserts::flow_assert_moderate;
use crate::flow_asserts::flow_assert_simple;
use crate::graph::EdgeId;
use crate::graph::FlowGraph;
use crate::graph::NodeId;

/// The direction in which an edge is traversed in the residual graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    /// Along the edge, using the capacity which is left
    Forward,
    /// Against the edge, cancelling flow
    Backward,
}

/// How a node was reached during the breadth-first search.
#[derive(Clone, Copy, Debug)]
struct ResidualStep {
    edge: EdgeId,
    direction: Direction,
}

create_statistics_struct!(
    /// Statistics of the maximum flow computations
    MaxFlowStatistics {
        /// The number of completed solves
        num_solves: u64,
        /// The number of augmenting paths over all solves
        num_augmentations: u64,
        /// The number of nodes expanded by the breadth-first searches
        num_expanded_nodes: u64,
});

/// Computes maximum flows with the Edmonds–Karp algorithm.
///
/// Only usable edges (see [`FlowGraph::is_usable`]) take part in the computation. The solver keeps
/// its scratch buffers between solves, so one instance should be reused for repeated queries.
///
/// # Example
/// ```
/// # use flow_profile_core::graph::FlowGraph;
/// # use flow_profile_core::max_flow::MaxFlowSolver;
/// let mut graph = FlowGraph::default();
/// let s = graph.add_node("S").unwrap();
/// let a = graph.add_node("A").unwrap();
/// let b = graph.add_node("B").unwrap();
/// let t = graph.add_node("T").unwrap();
/// let _ = graph.add_edge(s, a, 3.0).unwrap();
/// let _ = graph.add_edge(s, b, 2.0).unwrap();
/// let _ = graph.add_edge(a, t, 2.0).unwrap();
/// let _ = graph.add_edge(b, t, 3.0).unwrap();
/// let _ = graph.add_edge(a, b, 1.0).unwrap();
///
/// let mut solver = MaxFlowSolver::default();
/// let max_flow = solver.solve(&mut graph, s, t).unwrap();
///
/// assert_eq!(max_flow.value(), 5.0);
/// assert_eq!(max_flow.minimum_cut(&graph).capacity, 5.0);
/// ```
#[derive(Debug, Default)]
pub struct MaxFlowSolver {
    /// The residual step through which each node visited in the current pass was reached
    predecessor: KeyedVec<NodeId, Option<ResidualStep>>,
    queue: VecDeque<NodeId>,
    /// Copy of the adjacency list which is being explored
    adjacent: Vec<EdgeId>,
    /// The augmenting path, from the sink back to the source
    path: Vec<ResidualStep>,
    /// Caps the number of augmentations below the Edmonds–Karp bound
    augmentation_limit: Option<usize>,
    statistics: MaxFlowStatistics,
}

impl MaxFlowSolver {
    /// A solver which gives up with [`InconsistencyError::IterationLimitExceeded`] after `limit`
    /// augmentations, or after the Edmonds–Karp bound of `|V| * |E| + 1` if that is smaller.
    pub fn with_augmentation_limit(limit: usize) -> Self {
        MaxFlowSolver {
            augmentation_limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn statistics(&self) -> &MaxFlowStatistics {
        &self.statistics
    }

    /// Computes a maximum flow from `source` to `sink`.
    ///
    /// All flows are reset to zero first, so solving an already solved graph gives the same
    /// result. Afterwards every edge holds its flow in the computed assignment.
    ///
    /// Fails if `source` and `sink` are the same node or not part of the graph, or if the flow is
    /// unbounded. A sink which cannot be reached is not an error; the flow is then zero.
    pub fn solve<Identity: Clone + Eq + Hash + Debug>(
        &mut self,
        graph: &mut FlowGraph<Identity>,
        source: NodeId,
        sink: NodeId,
    ) -> Result<MaxFlow, FlowError> {
        graph.ensure_not_poisoned()?;
        let _ = graph.live_node(source)?;
        let _ = graph.live_node(sink)?;
        if source == sink {
            return Err(ConstructionError::SourceIsSink(source).into());
        }

        graph.reset_flows();
        if let Some(last) = graph.nodes().last().map(|(id, _)| id) {
            self.predecessor.accomodate(last, None);
        }

        let bound = graph
            .num_nodes()
            .saturating_mul(graph.num_edges())
            .saturating_add(1)
            .min(self.augmentation_limit.unwrap_or(usize::MAX));
        let mut value = 0.0;
        let mut augmentations = 0;

        let result = loop {
            let pass = self.search(graph, source, sink);
            if !graph.is_visited(sink, pass) {
                let source_side = graph
                    .nodes()
                    .filter(|(_, node)| node.visit() == pass)
                    .map(|(id, _)| id)
                    .collect::<Vec<_>>();
                break MaxFlow {
                    value,
                    augmentations,
                    source,
                    sink,
                    source_side,
                };
            }

            if augmentations >= bound {
                let error = InconsistencyError::IterationLimitExceeded { bound };
                graph.poison(error);
                return Err(error.into());
            }

            let bottleneck = self.augment(graph, source, sink)?;
            trace!("augmented {bottleneck} along a path of {} edges", self.path.len());
            value += bottleneck;
            augmentations += 1;
        };

        self.statistics.num_solves += 1;
        self.statistics.num_augmentations += augmentations as u64;
        debug!(
            "max flow {} from {source} to {sink} after {augmentations} augmentations",
            result.value
        );

        flow_assert_moderate!(
            respects_capacities(graph),
            "The flow exceeds the capacity of an edge"
        );
        flow_assert_moderate!(
            conserves_flow(graph, source, sink),
            "The flow is not conserved at an internal node"
        );
        flow_assert_advanced!(
            approximately_equal(result.minimum_cut(graph).capacity, result.value),
            "The capacity of the minimum cut differs from the maximum flow"
        );

        Ok(result)
    }

    /// Breadth-first search from `source` over the residual graph; returns the stamp of the pass,
    /// in which the reached nodes are marked. The search stops as soon as `sink` is reached.
    fn search<Identity: Clone + Eq + Hash + Debug>(
        &mut self,
        graph: &mut FlowGraph<Identity>,
        source: NodeId,
        sink: NodeId,
    ) -> u32 {
        let pass = graph.begin_pass();
        let _ = graph.mark_visited(source, pass);
        self.queue.clear();
        if !graph.is_node_enabled(source) {
            return pass;
        }

        self.queue.push_back(source);
        while let Some(current) = self.queue.pop_front() {
            self.statistics.num_expanded_nodes += 1;
            for direction in [Direction::Forward, Direction::Backward] {
                if self.explore(graph, current, direction, pass, sink) {
                    return pass;
                }
            }
        }
        pass
    }

    /// Visits the residual neighbours of `current` in the given direction; returns `true` if the
    /// sink was reached.
    fn explore<Identity: Clone + Eq + Hash + Debug>(
        &mut self,
        graph: &mut FlowGraph<Identity>,
        current: NodeId,
        direction: Direction,
        pass: u32,
        sink: NodeId,
    ) -> bool {
        self.adjacent.clear();
        if let Some(node) = graph.node(current) {
            let edges = match direction {
                Direction::Forward => node.out_edges(),
                Direction::Backward => node.in_edges(),
            };
            self.adjacent.extend_from_slice(edges);
        }

        for &id in self.adjacent.iter() {
            let Some(&edge) = graph.edge(id) else {
                continue;
            };
            let (residual, next) = match direction {
                Direction::Forward => (edge.residual_capacity(), edge.target()),
                Direction::Backward => (edge.flow(), edge.source()),
            };
            if !edge.is_enabled() || !is_positive(residual) || !graph.is_node_enabled(next) {
                continue;
            }

            if graph.mark_visited(next, pass) {
                self.predecessor.accomodate(next, None);
                self.predecessor[next] = Some(ResidualStep {
                    edge: id,
                    direction,
                });
                if next == sink {
                    return true;
                }
                self.queue.push_back(next);
            }
        }
        false
    }

    /// Pushes the bottleneck capacity along the path found by the last search and returns it.
    fn augment<Identity: Clone + Eq + Hash + Debug>(
        &mut self,
        graph: &mut FlowGraph<Identity>,
        source: NodeId,
        sink: NodeId,
    ) -> Result<Capacity, FlowError> {
        self.path.clear();
        let mut bottleneck = Capacity::INFINITY;
        let mut current = sink;
        while current != source {
            let step = self.predecessor.get(current).copied().flatten();
            flow_assert_simple!(
                step.is_some(),
                "A node on the augmenting path has no predecessor"
            );
            let Some(step) = step else {
                break;
            };
            let Some(&edge) = graph.edge(step.edge) else {
                break;
            };

            let (residual, previous) = match step.direction {
                Direction::Forward => (edge.residual_capacity(), edge.source()),
                Direction::Backward => (edge.flow(), edge.target()),
            };
            bottleneck = bottleneck.min(residual);
            self.path.push(step);
            current = previous;
        }

        if bottleneck.is_infinite() {
            return Err(ConstructionError::UnboundedFlow {
                from: source,
                to: sink,
            }
            .into());
        }

        for step in self.path.iter() {
            if let Some(edge) = graph.edge_mut(step.edge) {
                let flow = match step.direction {
                    Direction::Forward => (edge.flow() + bottleneck).min(edge.capacity()),
                    Direction::Backward => (edge.flow() - bottleneck).max(0.0),
                };
                edge.set_flow(flow);
            }
        }
        Ok(bottleneck)
    }
}

fn respects_capacities<Identity: Clone + Eq + Hash + Debug>(graph: &FlowGraph<Identity>) -> bool {
    graph
        .edges()
        .all(|(_, edge)| edge.flow() >= 0.0 && edge.flow() <= edge.capacity())
}

fn conserves_flow<Identity: Clone + Eq + Hash + Debug>(
    graph: &FlowGraph<Identity>,
    source: NodeId,
    sink: NodeId,
) -> bool {
    graph
        .nodes()
        .map(|(id, _)| id)
        .filter(|&id| id != source && id != sink)
        .all(|id| approximately_equal(graph.flow_imbalance(id), 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::FLOW_TOLERANCE;

    /// The graph {S, A, B, T} with S->A (3), S->B (2), A->T (2), B->T (3), A->B (1).
    fn scenario() -> (FlowGraph<&'static str>, [NodeId; 4], [EdgeId; 5]) {
        let mut graph = FlowGraph::default();
        let s = graph.add_node("S").unwrap();
        let a = graph.add_node("A").unwrap();
        let b = graph.add_node("B").unwrap();
        let t = graph.add_node("T").unwrap();
        let sa = graph.add_edge(s, a, 3.0).unwrap();
        let sb = graph.add_edge(s, b, 2.0).unwrap();
        let at = graph.add_edge(a, t, 2.0).unwrap();
        let bt = graph.add_edge(b, t, 3.0).unwrap();
        let ab = graph.add_edge(a, b, 1.0).unwrap();
        (graph, [s, a, b, t], [sa, sb, at, bt, ab])
    }

    fn flow_of(graph: &FlowGraph<&'static str>, edge: EdgeId) -> Capacity {
        graph.edge(edge).unwrap().flow()
    }

    #[test]
    fn scenario_saturates_the_source() {
        let (mut graph, [s, _, _, t], [sa, sb, at, bt, ab]) = scenario();
        let mut solver = MaxFlowSolver::default();

        let max_flow = solver.solve(&mut graph, s, t).unwrap();

        // S->A->T and S->B->T, then S->A->B->T over the remaining capacity.
        assert_eq!(max_flow.value(), 5.0);
        assert_eq!(max_flow.augmentations(), 3);
        assert_eq!(flow_of(&graph, sa), 3.0);
        assert_eq!(flow_of(&graph, sb), 2.0);
        assert_eq!(flow_of(&graph, at), 2.0);
        assert_eq!(flow_of(&graph, bt), 3.0);
        assert_eq!(flow_of(&graph, ab), 1.0);
    }

    #[test]
    fn scenario_minimum_cut_matches_flow() {
        let (mut graph, [s, _, _, t], [sa, sb, _, _, _]) = scenario();
        let mut solver = MaxFlowSolver::default();

        let max_flow = solver.solve(&mut graph, s, t).unwrap();
        let cut = max_flow.minimum_cut(&graph);

        assert_eq!(max_flow.source_side(), &[s]);
        assert_eq!(cut.edges, vec![sa, sb]);
        assert_eq!(cut.capacity, max_flow.value());
    }

    #[test]
    fn disabling_an_edge_after_a_solve_lowers_the_flow() {
        let (mut graph, [s, a, _, t], [_, sb, at, _, ab]) = scenario();
        let mut solver = MaxFlowSolver::default();
        let _ = solver.solve(&mut graph, s, t).unwrap();

        graph.disable_edge(at).unwrap();
        let max_flow = solver.solve(&mut graph, s, t).unwrap();

        // A can only reach T through B, which has room for a single extra unit.
        assert_eq!(max_flow.value(), 3.0);
        assert_eq!(flow_of(&graph, at), 0.0);
        assert_eq!(max_flow.source_side(), &[s, a]);

        let cut = max_flow.minimum_cut(&graph);
        assert_eq!(cut.edges, vec![sb, ab]);
        assert_eq!(cut.capacity, 3.0);
    }

    #[test]
    fn solving_twice_gives_the_same_assignment() {
        let (mut graph, [s, _, _, t], edges) = scenario();
        let mut solver = MaxFlowSolver::default();

        let first = solver.solve(&mut graph, s, t).unwrap();
        let first_flows = edges.map(|edge| flow_of(&graph, edge));
        let second = solver.solve(&mut graph, s, t).unwrap();
        let second_flows = edges.map(|edge| flow_of(&graph, edge));

        assert_eq!(first, second);
        assert_eq!(first_flows, second_flows);
    }

    #[test]
    fn disconnected_source_and_sink_give_zero_flow() {
        let mut graph = FlowGraph::default();
        let s = graph.add_node(0).unwrap();
        let a = graph.add_node(1).unwrap();
        let t = graph.add_node(2).unwrap();
        let _ = graph.add_edge(s, a, 5.0).unwrap();
        let mut solver = MaxFlowSolver::default();

        let max_flow = solver.solve(&mut graph, s, t).unwrap();

        assert_eq!(max_flow.value(), 0.0);
        assert_eq!(max_flow.augmentations(), 0);
        assert!(max_flow.minimum_cut(&graph).edges.is_empty());
    }

    #[test]
    fn source_equal_to_sink_is_rejected() {
        let (mut graph, [s, _, _, _], _) = scenario();
        let mut solver = MaxFlowSolver::default();

        assert_eq!(
            solver.solve(&mut graph, s, s),
            Err(ConstructionError::SourceIsSink(s).into())
        );
    }

    #[test]
    fn unknown_sink_is_rejected() {
        let (mut graph, [s, _, _, t], _) = scenario();
        graph.remove_node(t).unwrap();
        let mut solver = MaxFlowSolver::default();

        assert_eq!(
            solver.solve(&mut graph, s, t),
            Err(ConstructionError::UnknownNode(t).into())
        );
    }

    #[test]
    fn path_of_unbounded_edges_is_rejected() {
        let mut graph = FlowGraph::default();
        let s = graph.add_node(0).unwrap();
        let t = graph.add_node(1).unwrap();
        let _ = graph.add_edge(s, t, Capacity::INFINITY).unwrap();
        let mut solver = MaxFlowSolver::default();

        assert_eq!(
            solver.solve(&mut graph, s, t),
            Err(ConstructionError::UnboundedFlow { from: s, to: t }.into())
        );
    }

    #[test]
    fn unbounded_edges_are_limited_by_finite_ones() {
        let mut graph = FlowGraph::default();
        let s = graph.add_node(0).unwrap();
        let a = graph.add_node(1).unwrap();
        let t = graph.add_node(2).unwrap();
        let _ = graph.add_edge(s, a, Capacity::INFINITY).unwrap();
        let _ = graph.add_edge(a, t, 7.5).unwrap();
        let mut solver = MaxFlowSolver::default();

        let max_flow = solver.solve(&mut graph, s, t).unwrap();

        assert_eq!(max_flow.value(), 7.5);
        assert_eq!(max_flow.minimum_cut(&graph).capacity, 7.5);
    }

    #[test]
    fn crossing_edge_is_left_unused() {
        // The two shortest paths avoid A->B entirely.
        let mut graph = FlowGraph::default();
        let s = graph.add_node('s').unwrap();
        let a = graph.add_node('a').unwrap();
        let b = graph.add_node('b').unwrap();
        let t = graph.add_node('t').unwrap();
        let _ = graph.add_edge(s, a, 1.0).unwrap();
        let ab = graph.add_edge(a, b, 1.0).unwrap();
        let _ = graph.add_edge(b, t, 1.0).unwrap();
        let _ = graph.add_edge(s, b, 1.0).unwrap();
        let _ = graph.add_edge(a, t, 1.0).unwrap();
        let mut solver = MaxFlowSolver::default();

        let max_flow = solver.solve(&mut graph, s, t).unwrap();

        assert_eq!(max_flow.value(), 2.0);
        assert!(graph.edge(ab).unwrap().flow() < FLOW_TOLERANCE);
    }

    #[test]
    fn disabled_source_gives_zero_flow() {
        let (mut graph, [s, _, _, t], _) = scenario();
        graph.disable_node(s).unwrap();
        let mut solver = MaxFlowSolver::default();

        let max_flow = solver.solve(&mut graph, s, t).unwrap();

        assert_eq!(max_flow.value(), 0.0);
        assert_eq!(max_flow.source_side(), &[s]);
    }

    #[test]
    fn poisoned_graph_is_refused() {
        let (mut graph, [s, _, _, t], _) = scenario();
        graph.poison(InconsistencyError::IterationLimitExceeded { bound: 1 });
        let mut solver = MaxFlowSolver::default();

        assert!(matches!(
            solver.solve(&mut graph, s, t),
            Err(FlowError::Inconsistency(InconsistencyError::Poisoned(_)))
        ));
    }

    #[test]
    fn exceeding_the_augmentation_limit_poisons_the_graph() {
        let (mut graph, [s, _, _, t], _) = scenario();
        let mut solver = MaxFlowSolver::with_augmentation_limit(2);

        assert_eq!(
            solver.solve(&mut graph, s, t),
            Err(InconsistencyError::IterationLimitExceeded { bound: 2 }.into())
        );
        assert!(graph.is_poisoned());
        assert!(solver.solve(&mut graph, s, t).unwrap_err().is_fatal());
    }

    #[test]
    fn augmentation_limit_above_the_needed_count_is_harmless() {
        let (mut graph, [s, _, _, t], _) = scenario();
        let mut solver = MaxFlowSolver::with_augmentation_limit(3);

        assert_eq!(solver.solve(&mut graph, s, t).unwrap().value(), 5.0);
    }

    #[test]
    fn statistics_are_accumulated() {
        let (mut graph, [s, _, _, t], _) = scenario();
        let mut solver = MaxFlowSolver::default();

        let first = solver.solve(&mut graph, s, t).unwrap();
        let second = solver.solve(&mut graph, s, t).unwrap();

        assert_eq!(solver.statistics().num_solves, 2);
        assert_eq!(
            solver.statistics().num_augmentations,
            (first.augmentations() + second.augmentations()) as u64
        );
        assert_eq!(solver.statistics().num_augmentations, 6);
    }
}
