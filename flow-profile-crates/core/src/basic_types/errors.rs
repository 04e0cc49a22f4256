use crate::graph::EdgeId;
use crate::graph::NodeId;
use crate::profile::TransactionId;

/// An invalid request to build, mutate or solve a flow graph.
///
/// These are surfaced to the caller immediately and are never corrected silently.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum ConstructionError {
    /// A flow query was posed with the same node as source and sink.
    #[error("the source and the sink of a flow query are the same node ({0})")]
    SourceIsSink(NodeId),
    /// A capacity was negative or not a number.
    #[error("capacity {capacity} is not a non-negative number")]
    InvalidCapacity { capacity: f64 },
    /// The node does not belong to the graph, or it was removed.
    #[error("node {0} is not part of the graph")]
    UnknownNode(NodeId),
    /// The edge does not belong to the graph, or it was removed.
    #[error("edge {0} is not part of the graph")]
    UnknownEdge(EdgeId),
    /// A node with the same identity is already part of the graph.
    #[error("a node with the same identity already exists ({0})")]
    DuplicateIdentity(NodeId),
    /// An augmenting path consists of unbounded edges only, so the maximum flow is infinite.
    #[error("the maximum flow is unbounded; every edge on a path {from} -> {to} is unbounded")]
    UnboundedFlow { from: NodeId, to: NodeId },
    /// A transaction was supplied whose earliest time lies after its latest time.
    #[error("transaction {id} has earliest time {earliest} after latest time {latest}")]
    InvalidTimeBounds { id: TransactionId, earliest: i64, latest: i64 },
    /// A transaction was supplied with empty or negative quantity bounds.
    #[error("transaction {id} has invalid quantity bounds [{lower}, {upper}]")]
    InvalidQuantityBounds { id: TransactionId, lower: f64, upper: f64 },
    /// The same transaction was supplied twice in one profile request.
    #[error("transaction {0} was supplied more than once")]
    DuplicateTransaction(TransactionId),
}

/// A violated internal invariant of the flow graph.
///
/// This indicates a logic fault; the graph which reported it is poisoned and must be discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InconsistencyError {
    /// An edge of the edge set is not registered in the adjacency list of one of its endpoints.
    #[error("edge {edge} is missing from the adjacency of node {node}")]
    MissingAdjacencyEntry { edge: EdgeId, node: NodeId },
    /// An edge is registered more than once in the adjacency list of a node.
    #[error("edge {edge} appears more than once in the adjacency of node {node}")]
    DuplicateAdjacencyEntry { edge: EdgeId, node: NodeId },
    /// An adjacency list refers to an edge which is not in the edge set or has other endpoints.
    #[error("node {node} refers to edge {edge} which does not connect to it")]
    DanglingAdjacencyEntry { edge: EdgeId, node: NodeId },
    /// The number of augmentations exceeded the worst-case bound of the algorithm.
    #[error("the solver exceeded its bound of {bound} augmentations")]
    IterationLimitExceeded { bound: usize },
    /// The graph previously reported an inconsistency and refuses further use.
    #[error("the graph is poisoned by an earlier inconsistency: {0}")]
    Poisoned(PoisonCause),
}

/// The inconsistency which poisoned a graph; kept separate to avoid a recursive type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoisonCause(pub(crate) &'static str);

impl std::fmt::Display for PoisonCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl InconsistencyError {
    pub(crate) fn cause(&self) -> PoisonCause {
        match self {
            InconsistencyError::MissingAdjacencyEntry { .. } => {
                PoisonCause("missing adjacency entry")
            }
            InconsistencyError::DuplicateAdjacencyEntry { .. } => {
                PoisonCause("duplicate adjacency entry")
            }
            InconsistencyError::DanglingAdjacencyEntry { .. } => {
                PoisonCause("dangling adjacency entry")
            }
            InconsistencyError::IterationLimitExceeded { .. } => {
                PoisonCause("iteration limit exceeded")
            }
            InconsistencyError::Poisoned(cause) => *cause,
        }
    }
}

/// Any failure of the flow engine.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    #[error(transparent)]
    Inconsistency(#[from] InconsistencyError),
}

impl FlowError {
    /// Whether the error means the graph it came from must be thrown away.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FlowError::Inconsistency(_))
    }
}
