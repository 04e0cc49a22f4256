use std::fmt::Display;
use std::fmt::Formatter;

use itertools::Itertools;
use log::trace;

use super::ResourceLimits;
use super::TemporalOrdering;
use super::Transaction;
use super::TransactionId;
use super::TransactionKind;
use crate::basic_types::Capacity;
use crate::basic_types::FlowError;
use crate::containers::HashMap;
use crate::graph::EdgeId;
use crate::graph::FlowGraph;
use crate::graph::NodeId;
use crate::max_flow::MaxFlowSolver;

/// Which extreme of the resource level a flow graph computes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Envelope {
    Lower,
    Upper,
}

impl Envelope {
    /// The transactions which hang off the source of the graph; their occurrence pushes the level
    /// towards this extreme.
    pub(crate) fn source_kind(self) -> TransactionKind {
        match self {
            Envelope::Lower => TransactionKind::Consumption,
            Envelope::Upper => TransactionKind::Production,
        }
    }

    /// The direction in which the slack of the graph moves the level.
    pub(crate) fn sign(self) -> Capacity {
        match self {
            Envelope::Lower => -1.0,
            Envelope::Upper => 1.0,
        }
    }

    /// The capacity of the edge which connects `transaction` to the source or the sink.
    ///
    /// Source-side transactions contribute as much as possible, sink-side transactions as little
    /// as possible.
    pub(crate) fn quantity_capacity(
        self,
        transaction: &Transaction,
        limits: &ResourceLimits,
    ) -> Capacity {
        let quantity = limits.effective_quantity(transaction);
        if transaction.kind == self.source_kind() {
            quantity.upper
        } else {
            quantity.lower
        }
    }

    /// The contribution of a transaction which has happened in every schedule.
    pub(crate) fn closed_contribution(
        self,
        transaction: &Transaction,
        limits: &ResourceLimits,
    ) -> Capacity {
        let quantity = limits.effective_quantity(transaction);
        match (self, transaction.kind) {
            (Envelope::Lower, TransactionKind::Production) => quantity.lower,
            (Envelope::Lower, TransactionKind::Consumption) => -quantity.upper,
            (Envelope::Upper, TransactionKind::Production) => quantity.upper,
            (Envelope::Upper, TransactionKind::Consumption) => -quantity.lower,
        }
    }
}

/// What a node of an envelope graph stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum FlowNodeIdentity {
    Source,
    Sink,
    Transaction(TransactionId),
}

impl FlowNodeIdentity {
    fn transaction(self) -> Option<TransactionId> {
        match self {
            FlowNodeIdentity::Transaction(id) => Some(id),
            FlowNodeIdentity::Source | FlowNodeIdentity::Sink => None,
        }
    }
}

impl Display for FlowNodeIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowNodeIdentity::Source => write!(f, "source"),
            FlowNodeIdentity::Sink => write!(f, "sink"),
            FlowNodeIdentity::Transaction(id) => write!(f, "{id}"),
        }
    }
}

/// The handles of a transaction inside an [`EnvelopeGraph`].
#[derive(Clone, Copy, Debug)]
struct TransactionNode {
    node: NodeId,
    /// Connects the node to the source or to the sink
    quantity_edge: EdgeId,
}

/// The extreme level contribution of the pending transactions at one instant.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PendingExtreme {
    /// The capacity of the pending source-side transactions which the flow could not route to the
    /// sink; the level moves by this amount towards the extreme
    pub(crate) slack: Capacity,
    /// The pending transactions which are assumed to have happened for the extreme level
    pub(crate) occurred: Vec<TransactionId>,
    /// The transactions whose quantity edges form the minimum cut
    pub(crate) bottleneck: Vec<TransactionId>,
}

/// A persistent flow graph for one [`Envelope`].
///
/// Every transaction is a node with a quantity edge to the source or the sink; a precedence edge
/// with unbounded capacity leads from a transaction to every transaction which necessarily
/// happens before it. The minimum cut then selects the set of pending transactions, closed under
/// precedence, which moves the level furthest towards the extreme.
#[derive(Debug)]
pub(crate) struct EnvelopeGraph {
    envelope: Envelope,
    graph: FlowGraph<FlowNodeIdentity>,
    source: NodeId,
    sink: NodeId,
    transactions: HashMap<TransactionId, TransactionNode>,
    /// Keyed by (later, earlier); disabled while the pair is not ordered
    precedences: HashMap<(TransactionId, TransactionId), EdgeId>,
}

impl EnvelopeGraph {
    pub(crate) fn new(envelope: Envelope) -> Result<Self, FlowError> {
        let mut graph = FlowGraph::default();
        let source = graph.add_node(FlowNodeIdentity::Source)?;
        let sink = graph.add_node(FlowNodeIdentity::Sink)?;
        Ok(EnvelopeGraph {
            envelope,
            graph,
            source,
            sink,
            transactions: HashMap::default(),
            precedences: HashMap::default(),
        })
    }

    pub(crate) fn envelope(&self) -> Envelope {
        self.envelope
    }

    pub(crate) fn graph(&self) -> &FlowGraph<FlowNodeIdentity> {
        &self.graph
    }

    pub(crate) fn contains(&self, id: TransactionId) -> bool {
        self.transactions.contains_key(&id)
    }

    /// The number of precedence edges which are currently enabled.
    pub(crate) fn num_active_precedences(&self) -> usize {
        self.precedences
            .values()
            .filter(|&&edge| self.graph.edge(edge).is_some_and(|edge| edge.is_enabled()))
            .count()
    }

    /// Adds a node and a quantity edge for `transaction`; the node starts disabled.
    pub(crate) fn insert(
        &mut self,
        transaction: &Transaction,
        limits: &ResourceLimits,
    ) -> Result<(), FlowError> {
        let node = self
            .graph
            .add_node(FlowNodeIdentity::Transaction(transaction.id))?;
        let capacity = self.envelope.quantity_capacity(transaction, limits);
        let quantity_edge = if transaction.kind == self.envelope.source_kind() {
            self.graph.add_edge(self.source, node, capacity)?
        } else {
            self.graph.add_edge(node, self.sink, capacity)?
        };
        self.graph.disable_node(node)?;

        let _ = self.transactions.insert(
            transaction.id,
            TransactionNode {
                node,
                quantity_edge,
            },
        );
        Ok(())
    }

    /// Refreshes the capacity of the quantity edge of a transaction of unchanged kind.
    pub(crate) fn update_quantity(
        &mut self,
        transaction: &Transaction,
        limits: &ResourceLimits,
    ) -> Result<(), FlowError> {
        if let Some(entry) = self.transactions.get(&transaction.id) {
            let capacity = self.envelope.quantity_capacity(transaction, limits);
            self.graph.set_capacity(entry.quantity_edge, capacity)?;
        }
        Ok(())
    }

    /// Removes the node of a transaction together with all of its edges.
    pub(crate) fn remove(&mut self, id: TransactionId) -> Result<(), FlowError> {
        if let Some(entry) = self.transactions.remove(&id) {
            self.graph.remove_node(entry.node)?;
            self.precedences
                .retain(|&(later, earlier), _| later != id && earlier != id);
        }
        Ok(())
    }

    /// Makes the precedence edge `later -> earlier` present exactly when `ordered` holds.
    ///
    /// The edge is created the first time the pair is ordered, and afterwards only enabled or
    /// disabled.
    pub(crate) fn set_precedence(
        &mut self,
        later: TransactionId,
        earlier: TransactionId,
        ordered: bool,
    ) -> Result<(), FlowError> {
        match self.precedences.get(&(later, earlier)) {
            Some(&edge) if ordered => self.graph.enable_edge(edge),
            Some(&edge) => self.graph.disable_edge(edge),
            None if ordered => {
                let (Some(from), Some(to)) = (
                    self.transactions.get(&later),
                    self.transactions.get(&earlier),
                ) else {
                    return Ok(());
                };
                let edge = self.graph.add_edge(from.node, to.node, Capacity::INFINITY)?;
                let _ = self.precedences.insert((later, earlier), edge);
                trace!("{:?} envelope: {later} requires {earlier}", self.envelope);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Disables every precedence edge.
    pub(crate) fn clear_precedences(&mut self) -> Result<(), FlowError> {
        for &edge in self.precedences.values() {
            self.graph.disable_edge(edge)?;
        }
        Ok(())
    }

    /// Enables exactly the nodes of the transactions for which `pending` holds.
    pub(crate) fn set_pending(
        &mut self,
        mut pending: impl FnMut(TransactionId) -> bool,
    ) -> Result<(), FlowError> {
        for (&id, entry) in self.transactions.iter() {
            if pending(id) {
                self.graph.enable_node(entry.node)?;
            } else {
                self.graph.disable_node(entry.node)?;
            }
        }
        Ok(())
    }

    /// Computes the contribution of the pending (enabled) transactions towards the extreme.
    ///
    /// When the sink cannot be reached at all the solver is skipped, and `None` is returned for
    /// the number of augmentations.
    pub(crate) fn solve(
        &mut self,
        solver: &mut MaxFlowSolver,
        explain: bool,
    ) -> Result<(PendingExtreme, Option<usize>), FlowError> {
        let pending_capacity: Capacity = self
            .graph
            .out_edges_of(self.source)
            .filter(|(id, _)| self.graph.is_usable(*id))
            .map(|(_, edge)| edge.capacity())
            .sum();

        if !self.graph.has_enabled_path(self.source, self.sink)? {
            let occurred = if explain {
                self.pending_source_side()
            } else {
                vec![]
            };
            let extreme = PendingExtreme {
                slack: pending_capacity,
                occurred,
                bottleneck: vec![],
            };
            return Ok((extreme, None));
        }

        let max_flow = solver.solve(&mut self.graph, self.source, self.sink)?;
        let slack = (pending_capacity - max_flow.value()).max(0.0);

        let mut extreme = PendingExtreme {
            slack,
            ..Default::default()
        };
        if explain {
            extreme.occurred = max_flow
                .source_side()
                .iter()
                .filter_map(|&node| self.transaction_of(node))
                .sorted()
                .dedup()
                .collect();
            extreme.bottleneck = max_flow
                .minimum_cut(&self.graph)
                .edges
                .iter()
                .filter_map(|&edge| self.graph.edge(edge))
                .filter_map(|edge| {
                    self.transaction_of(edge.source())
                        .or_else(|| self.transaction_of(edge.target()))
                })
                .sorted()
                .dedup()
                .collect();
        }
        Ok((extreme, Some(max_flow.augmentations())))
    }

    /// The enabled transactions hanging off the source.
    fn pending_source_side(&self) -> Vec<TransactionId> {
        self.graph
            .out_edges_of(self.source)
            .filter(|(id, _)| self.graph.is_usable(*id))
            .filter_map(|(_, edge)| self.transaction_of(edge.target()))
            .sorted()
            .dedup()
            .collect()
    }

    fn transaction_of(&self, node: NodeId) -> Option<TransactionId> {
        self.graph
            .node(node)
            .and_then(|node| node.identity().transaction())
    }

    /// Verifies the underlying graph; on failure it is poisoned.
    pub(crate) fn check_consistency(&mut self) -> Result<(), FlowError> {
        Ok(self.graph.check_consistency()?)
    }
}

/// Whether `ordering` forces `earlier` to happen no later than `later`, given that the two can be
/// pending at the same instant.
pub(crate) fn is_ordered(
    ordering: &dyn TemporalOrdering,
    earlier: &Transaction,
    later: &Transaction,
) -> bool {
    earlier.id != later.id
        && earlier.time.pending_overlaps(&later.time)
        && ordering.possibly_before(earlier.id, later.id)
        && ordering.necessarily_before(earlier.id, later.id)
}
