//! Maximum flow and minimum cut computation over the enabled part of a
//! [`FlowGraph`](crate::graph::FlowGraph).
//!
//! The solver follows Edmonds–Karp: augmenting paths are found by breadth-first search over the
//! residual graph, which bounds the number of augmentations by `O(|V| * |E|)` and, together with
//! the insertion-ordered adjacency lists, makes the resulting flow deterministic.
mod max_flow_solver;
mod minimum_cut;

pub use max_flow_solver::MaxFlowSolver;
pub use max_flow_solver::MaxFlowStatistics;
pub use minimum_cut::MaxFlow;
pub use minimum_cut::MinimumCut;
