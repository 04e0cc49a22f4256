use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;

use log::error;
use log::trace;

use super::Edge;
use super::EdgeId;
use super::Node;
use super::NodeId;
use crate::basic_types::is_valid_capacity;
use crate::basic_types::Capacity;
use crate::basic_types::ConstructionError;
use crate::basic_types::FlowError;
use crate::basic_types::InconsistencyError;
use crate::containers::HashMap;
use crate::containers::KeyedVec;
use crate::flow_asserts::flow_assert_extreme;
use crate::flow_asserts::flow_assert_simple;

/// A directed, capacitated graph which owns all of its nodes and edges.
///
/// Nodes and edges live in arenas and are addressed by [`NodeId`] and [`EdgeId`]; removing one
/// leaves a tombstone so that the remaining handles stay valid. Every edge is registered exactly
/// once in the outgoing list of its source and the incoming list of its target, and only the graph
/// can change this registration.
///
/// Nodes and edges can be disabled instead of removed; disabling is constant time and does not
/// touch the adjacency lists, which makes it cheap to switch between the sub-graphs needed by
/// consecutive flow queries. An edge is *usable* when it and both of its endpoints are enabled.
///
/// # Traversal passes
/// Traversals mark nodes with the stamp of the current pass (see [`FlowGraph::begin_pass`]). A
/// traversal holds `&mut FlowGraph` for its whole duration, so two traversals can never interleave
/// and the graph cannot be mutated while one is running.
///
/// # Poisoning
/// When [`FlowGraph::check_consistency`] detects that the adjacency lists disagree with the edge
/// set, the graph is poisoned: all further mutations and solves report the inconsistency. A
/// poisoned graph should be discarded.
#[derive(Clone, Debug)]
pub struct FlowGraph<Identity> {
    nodes: KeyedVec<NodeId, Option<Node<Identity>>>,
    edges: KeyedVec<EdgeId, Option<Edge>>,
    identities: HashMap<Identity, NodeId>,
    num_nodes: usize,
    num_edges: usize,
    /// The stamp of the most recent traversal pass
    current_pass: u32,
    poisoned: Option<InconsistencyError>,
}

impl<Identity> Default for FlowGraph<Identity> {
    fn default() -> Self {
        FlowGraph {
            nodes: KeyedVec::default(),
            edges: KeyedVec::default(),
            identities: HashMap::default(),
            num_nodes: 0,
            num_edges: 0,
            current_pass: 0,
            poisoned: None,
        }
    }
}

impl<Identity: Clone + Eq + Hash + Debug> FlowGraph<Identity> {
    /// The number of live nodes.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// The number of live edges.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    pub fn node(&self, node: NodeId) -> Option<&Node<Identity>> {
        self.nodes.get(node).and_then(Option::as_ref)
    }

    pub fn edge(&self, edge: EdgeId) -> Option<&Edge> {
        self.edges.get(edge).and_then(Option::as_ref)
    }

    pub fn node_by_identity(&self, identity: &Identity) -> Option<NodeId> {
        self.identities.get(identity).copied()
    }

    /// All live nodes in creation order, enabled or not.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node<Identity>)> + '_ {
        self.nodes
            .iter_enumerated()
            .filter_map(|(id, node)| node.as_ref().map(|node| (id, node)))
    }

    /// All live edges in creation order, enabled or not.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges
            .iter_enumerated()
            .filter_map(|(id, edge)| edge.as_ref().map(|edge| (id, edge)))
    }

    /// The outgoing edges of `node` in insertion order, enabled or not; empty for an unknown node.
    pub fn out_edges_of(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.node(node)
            .map(Node::out_edges)
            .unwrap_or(&[])
            .iter()
            .filter_map(|&id| self.edge(id).map(|edge| (id, edge)))
    }

    /// The incoming edges of `node` in insertion order, enabled or not; empty for an unknown node.
    pub fn in_edges_of(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.node(node)
            .map(Node::in_edges)
            .unwrap_or(&[])
            .iter()
            .filter_map(|&id| self.edge(id).map(|edge| (id, edge)))
    }

    /// Whether `edge` and both of its endpoints are enabled.
    pub fn is_usable(&self, edge: EdgeId) -> bool {
        self.edge(edge).is_some_and(|edge| {
            edge.is_enabled()
                && self.is_node_enabled(edge.source())
                && self.is_node_enabled(edge.target())
        })
    }

    pub fn is_node_enabled(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(Node::is_enabled)
    }

    /// Adds an enabled node with the given identity.
    pub fn add_node(&mut self, identity: Identity) -> Result<NodeId, FlowError> {
        self.ensure_not_poisoned()?;
        if let Some(&existing) = self.identities.get(&identity) {
            return Err(ConstructionError::DuplicateIdentity(existing).into());
        }

        let id = self.nodes.push(Some(Node::new(identity.clone())));
        let _ = self.identities.insert(identity, id);
        self.num_nodes += 1;
        trace!("added node {id}");
        Ok(id)
    }

    /// Removes `node` together with all of its incident edges.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), FlowError> {
        self.ensure_not_poisoned()?;
        let incident = {
            let removed = self.live_node(node)?;
            let mut incident = removed.out_edges().to_vec();
            incident.extend(
                removed
                    .in_edges()
                    .iter()
                    .filter(|edge| !removed.out_edges().contains(edge)),
            );
            incident
        };
        for edge in incident {
            self.remove_edge(edge)?;
        }

        if let Some(removed) = self.nodes[node].take() {
            let _ = self.identities.remove(removed.identity());
        }
        self.num_nodes -= 1;
        trace!("removed node {node}");
        flow_assert_extreme!(self.check_consistency().is_ok());
        Ok(())
    }

    /// Adds an enabled edge from `source` to `target`.
    ///
    /// Fails if either endpoint is not a live node of this graph, or if the capacity is negative
    /// or not a number.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        capacity: Capacity,
    ) -> Result<EdgeId, FlowError> {
        self.ensure_not_poisoned()?;
        if !is_valid_capacity(capacity) {
            return Err(ConstructionError::InvalidCapacity { capacity }.into());
        }
        let _ = self.live_node(source)?;
        let _ = self.live_node(target)?;

        let edge = Edge::new(source, target, capacity);
        let id = self.edges.push(Some(edge));
        edge.connect(id, &mut self.nodes);
        self.num_edges += 1;
        trace!("added edge {id}: {edge}");
        flow_assert_extreme!(self.check_consistency().is_ok());
        Ok(id)
    }

    /// Removes `edge` from the graph and from the adjacency lists of its endpoints.
    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<(), FlowError> {
        self.ensure_not_poisoned()?;
        let removed = *self.live_edge(edge)?;
        removed.disconnect(edge, &mut self.nodes);
        self.edges[edge] = None;
        self.num_edges -= 1;
        trace!("removed edge {edge}");
        Ok(())
    }

    /// Changes the capacity of `edge`; this resets its flow to zero.
    pub fn set_capacity(&mut self, edge: EdgeId, capacity: Capacity) -> Result<(), FlowError> {
        self.ensure_not_poisoned()?;
        if !is_valid_capacity(capacity) {
            return Err(ConstructionError::InvalidCapacity { capacity }.into());
        }
        self.live_edge_mut(edge)?.set_capacity(capacity);
        Ok(())
    }

    pub fn enable_node(&mut self, node: NodeId) -> Result<(), FlowError> {
        self.live_node_mut(node)?.set_enabled();
        Ok(())
    }

    pub fn disable_node(&mut self, node: NodeId) -> Result<(), FlowError> {
        self.live_node_mut(node)?.set_disabled();
        Ok(())
    }

    pub fn enable_edge(&mut self, edge: EdgeId) -> Result<(), FlowError> {
        self.live_edge_mut(edge)?.set_enabled();
        Ok(())
    }

    pub fn disable_edge(&mut self, edge: EdgeId) -> Result<(), FlowError> {
        self.live_edge_mut(edge)?.set_disabled();
        Ok(())
    }

    /// Starts a new traversal pass and returns its stamp.
    ///
    /// A node counts as visited in the pass if its [`Node::visit`] equals the returned stamp, so no
    /// reset of the markers is needed between passes.
    pub fn begin_pass(&mut self) -> u32 {
        if self.current_pass == u32::MAX {
            self.nodes
                .iter_mut()
                .flatten()
                .for_each(|node| node.set_visit(0));
            self.current_pass = 0;
        }
        self.current_pass += 1;
        self.current_pass
    }

    /// Marks `node` as visited in `pass`; returns `false` if it already was.
    pub fn mark_visited(&mut self, node: NodeId, pass: u32) -> bool {
        flow_assert_simple!(pass == self.current_pass, "Marking a node for a stale pass");
        match self.nodes.get_mut(node).and_then(Option::as_mut) {
            Some(node) if node.visit() != pass => {
                node.set_visit(pass);
                true
            }
            _ => false,
        }
    }

    pub fn is_visited(&self, node: NodeId, pass: u32) -> bool {
        self.node(node).is_some_and(|node| node.visit() == pass)
    }

    /// Whether a path of usable edges leads from `from` to `to`.
    ///
    /// This is a structural check which ignores capacities; it is used to avoid a full max-flow
    /// computation when the source and the sink are disconnected.
    pub fn has_enabled_path(&mut self, from: NodeId, to: NodeId) -> Result<bool, FlowError> {
        self.ensure_not_poisoned()?;
        let _ = self.live_node(from)?;
        let _ = self.live_node(to)?;
        if !self.is_node_enabled(from) || !self.is_node_enabled(to) {
            return Ok(false);
        }

        let pass = self.begin_pass();
        let _ = self.mark_visited(from, pass);
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                return Ok(true);
            }
            let successors = self
                .out_edges_of(current)
                .filter(|(id, _)| self.is_usable(*id))
                .map(|(_, edge)| edge.target())
                .collect::<Vec<_>>();
            for successor in successors {
                if self.mark_visited(successor, pass) {
                    queue.push_back(successor);
                }
            }
        }
        Ok(false)
    }

    /// Sets the flow of every edge to zero.
    pub(crate) fn reset_flows(&mut self) {
        self.edges
            .iter_mut()
            .flatten()
            .for_each(|edge| edge.set_flow(0.0));
    }

    pub(crate) fn edge_mut(&mut self, edge: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(edge).and_then(Option::as_mut)
    }

    /// The flow leaving `node` minus the flow entering it, over usable edges.
    pub fn flow_imbalance(&self, node: NodeId) -> Capacity {
        let outgoing: Capacity = self
            .out_edges_of(node)
            .filter(|(id, _)| self.is_usable(*id))
            .map(|(_, edge)| edge.flow())
            .sum();
        let incoming: Capacity = self
            .in_edges_of(node)
            .filter(|(id, _)| self.is_usable(*id))
            .map(|(_, edge)| edge.flow())
            .sum();
        outgoing - incoming
    }

    /// Verifies that every edge appears exactly once in the outgoing list of its source and the
    /// incoming list of its target, and that the adjacency lists refer to nothing else.
    ///
    /// On failure the graph is poisoned.
    pub fn check_consistency(&mut self) -> Result<(), InconsistencyError> {
        if let Some(poisoned) = self.poisoned {
            return Err(InconsistencyError::Poisoned(poisoned.cause()));
        }
        if let Err(error) = self.find_inconsistency() {
            error!("flow graph is inconsistent: {error}");
            self.poisoned = Some(error);
            return Err(error);
        }
        Ok(())
    }

    fn find_inconsistency(&self) -> Result<(), InconsistencyError> {
        for (id, edge) in self.edges() {
            for (node, entries) in [
                (edge.source(), self.node(edge.source()).map(Node::out_edges)),
                (edge.target(), self.node(edge.target()).map(Node::in_edges)),
            ] {
                let occurrences = entries
                    .unwrap_or(&[])
                    .iter()
                    .filter(|&&entry| entry == id)
                    .count();
                match occurrences {
                    0 => return Err(InconsistencyError::MissingAdjacencyEntry { edge: id, node }),
                    1 => {}
                    _ => {
                        return Err(InconsistencyError::DuplicateAdjacencyEntry { edge: id, node })
                    }
                }
            }
        }

        for (id, node) in self.nodes() {
            for &edge in node.out_edges() {
                if !self.edge(edge).is_some_and(|edge| edge.source() == id) {
                    return Err(InconsistencyError::DanglingAdjacencyEntry { edge, node: id });
                }
            }
            for &edge in node.in_edges() {
                if !self.edge(edge).is_some_and(|edge| edge.target() == id) {
                    return Err(InconsistencyError::DanglingAdjacencyEntry { edge, node: id });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn ensure_not_poisoned(&self) -> Result<(), InconsistencyError> {
        match self.poisoned {
            Some(poisoned) => Err(InconsistencyError::Poisoned(poisoned.cause())),
            None => Ok(()),
        }
    }

    /// Marks the graph as unusable after an inconsistency was detected elsewhere.
    pub(crate) fn poison(&mut self, error: InconsistencyError) {
        if self.poisoned.is_none() {
            self.poisoned = Some(error);
        }
    }

    pub(crate) fn live_node(&self, node: NodeId) -> Result<&Node<Identity>, ConstructionError> {
        self.node(node).ok_or(ConstructionError::UnknownNode(node))
    }

    fn live_node_mut(&mut self, node: NodeId) -> Result<&mut Node<Identity>, ConstructionError> {
        self.nodes
            .get_mut(node)
            .and_then(Option::as_mut)
            .ok_or(ConstructionError::UnknownNode(node))
    }

    fn live_edge(&self, edge: EdgeId) -> Result<&Edge, ConstructionError> {
        self.edge(edge).ok_or(ConstructionError::UnknownEdge(edge))
    }

    fn live_edge_mut(&mut self, edge: EdgeId) -> Result<&mut Edge, ConstructionError> {
        self.edge_mut(edge).ok_or(ConstructionError::UnknownEdge(edge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> (FlowGraph<char>, [NodeId; 4], [EdgeId; 5]) {
        let mut graph = FlowGraph::default();
        let s = graph.add_node('s').unwrap();
        let a = graph.add_node('a').unwrap();
        let b = graph.add_node('b').unwrap();
        let t = graph.add_node('t').unwrap();
        let sa = graph.add_edge(s, a, 3.0).unwrap();
        let sb = graph.add_edge(s, b, 2.0).unwrap();
        let at = graph.add_edge(a, t, 2.0).unwrap();
        let bt = graph.add_edge(b, t, 3.0).unwrap();
        let ab = graph.add_edge(a, b, 1.0).unwrap();
        (graph, [s, a, b, t], [sa, sb, at, bt, ab])
    }

    #[test]
    fn adding_an_edge_registers_it_at_both_endpoints() {
        let (graph, [s, a, b, _], [sa, sb, _, _, ab]) = diamond();

        assert_eq!(graph.node(s).unwrap().out_edges(), &[sa, sb]);
        assert_eq!(graph.node(a).unwrap().in_edges(), &[sa]);
        assert_eq!(graph.node(b).unwrap().in_edges(), &[sb, ab]);
        assert_eq!(graph.num_edges(), 5);
    }

    #[test]
    fn removing_an_edge_deregisters_it() {
        let (mut graph, [s, a, _, _], [sa, sb, _, _, _]) = diamond();

        graph.remove_edge(sa).unwrap();

        assert_eq!(graph.node(s).unwrap().out_edges(), &[sb]);
        assert!(graph.node(a).unwrap().in_edges().is_empty());
        assert!(graph.edge(sa).is_none());
        assert!(graph.check_consistency().is_ok());
    }

    #[test]
    fn removing_a_node_cascades_to_its_edges() {
        let (mut graph, [s, a, b, t], [_, sb, _, bt, _]) = diamond();

        graph.remove_node(a).unwrap();

        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.num_edges(), 2);
        assert_eq!(graph.node(s).unwrap().out_edges(), &[sb]);
        assert_eq!(graph.node(b).unwrap().in_edges(), &[sb]);
        assert_eq!(graph.node(t).unwrap().in_edges(), &[bt]);
        assert!(graph.node_by_identity(&'a').is_none());
        assert!(graph.check_consistency().is_ok());
    }

    #[test]
    fn removing_a_node_with_a_self_loop() {
        let mut graph = FlowGraph::default();
        let a = graph.add_node(0).unwrap();
        let _ = graph.add_edge(a, a, 1.0).unwrap();

        graph.remove_node(a).unwrap();

        assert_eq!(graph.num_edges(), 0);
        assert!(graph.check_consistency().is_ok());
    }

    #[test]
    fn handles_stay_valid_after_removal() {
        let (mut graph, [_, a, b, _], [_, _, _, bt, _]) = diamond();

        graph.remove_node(a).unwrap();

        assert_eq!(graph.node(b).unwrap().identity(), &'b');
        assert_eq!(graph.edge(bt).unwrap().capacity(), 3.0);
        assert_eq!(
            graph.enable_node(a),
            Err(ConstructionError::UnknownNode(a).into())
        );
    }

    #[test]
    fn removed_edge_is_unknown() {
        let (mut graph, _, [sa, ..]) = diamond();
        graph.remove_edge(sa).unwrap();

        assert_eq!(
            graph.remove_edge(sa),
            Err(ConstructionError::UnknownEdge(sa).into())
        );
        assert_eq!(
            graph.set_capacity(sa, 1.0),
            Err(ConstructionError::UnknownEdge(sa).into())
        );
        assert_eq!(
            graph.enable_edge(sa),
            Err(ConstructionError::UnknownEdge(sa).into())
        );
        assert!(graph.check_consistency().is_ok());
    }

    #[test]
    fn negative_capacity_is_rejected() {
        let (mut graph, [s, _, _, t], _) = diamond();

        let result = graph.add_edge(s, t, -1.0);

        assert_eq!(
            result,
            Err(ConstructionError::InvalidCapacity { capacity: -1.0 }.into())
        );
        assert_eq!(graph.num_edges(), 5);
    }

    #[test]
    fn edge_to_unknown_node_is_rejected() {
        let (mut graph, [s, a, _, _], _) = diamond();
        graph.remove_node(a).unwrap();

        assert_eq!(
            graph.add_edge(s, a, 1.0),
            Err(ConstructionError::UnknownNode(a).into())
        );
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let (mut graph, [s, _, _, _], _) = diamond();

        assert_eq!(
            graph.add_node('s'),
            Err(ConstructionError::DuplicateIdentity(s).into())
        );
    }

    #[test]
    fn disabling_keeps_adjacency_and_iteration_does_not_filter() {
        let (mut graph, [s, a, _, _], [sa, sb, _, _, _]) = diamond();

        graph.disable_edge(sa).unwrap();
        graph.disable_node(a).unwrap();

        assert_eq!(graph.node(s).unwrap().out_edges(), &[sa, sb]);
        assert_eq!(graph.edges().count(), 5);
        assert_eq!(
            graph.out_edges_of(s).map(|(id, _)| id).collect::<Vec<_>>(),
            vec![sa, sb]
        );
        assert!(!graph.is_usable(sa));
        assert!(graph.is_usable(sb));
    }

    #[test]
    fn edge_is_unusable_when_an_endpoint_is_disabled() {
        let (mut graph, [_, _, b, _], [_, sb, _, _, _]) = diamond();

        graph.disable_node(b).unwrap();
        assert!(!graph.is_usable(sb));

        graph.enable_node(b).unwrap();
        assert!(graph.is_usable(sb));
    }

    #[test]
    fn enabled_path_respects_disabled_edges() {
        let (mut graph, [s, _, b, t], [_, sb, at, _, _]) = diamond();
        assert!(graph.has_enabled_path(s, t).unwrap());

        graph.disable_edge(at).unwrap();
        assert!(graph.has_enabled_path(s, t).unwrap());

        graph.disable_node(b).unwrap();
        assert!(!graph.has_enabled_path(s, t).unwrap());

        graph.enable_node(b).unwrap();
        graph.disable_edge(sb).unwrap();
        // s -> a -> b -> t remains
        assert!(graph.has_enabled_path(s, t).unwrap());
    }

    #[test]
    fn passes_are_distinct() {
        let (mut graph, [s, _, _, _], _) = diamond();

        let first = graph.begin_pass();
        assert!(graph.mark_visited(s, first));
        assert!(!graph.mark_visited(s, first));

        let second = graph.begin_pass();
        assert!(!graph.is_visited(s, second));
        assert!(graph.mark_visited(s, second));
    }

    #[test]
    fn pass_counter_wraps_around() {
        let (mut graph, [s, _, _, _], _) = diamond();
        graph.current_pass = u32::MAX - 1;
        let pass = graph.begin_pass();
        assert!(graph.mark_visited(s, pass));

        let wrapped = graph.begin_pass();
        assert_eq!(wrapped, 1);
        assert!(!graph.is_visited(s, wrapped));
    }

    #[test]
    fn changing_the_capacity_resets_the_flow() {
        let (mut graph, _, [sa, _, _, _, _]) = diamond();
        graph.edge_mut(sa).unwrap().set_flow(2.0);

        graph.set_capacity(sa, 5.0).unwrap();

        let edge = graph.edge(sa).unwrap();
        assert_eq!(edge.capacity(), 5.0);
        assert_eq!(edge.flow(), 0.0);
    }

    #[test]
    fn inconsistency_poisons_the_graph() {
        let (mut graph, [s, _, _, _], [sa, _, _, _, _]) = diamond();
        // Break the invariant from inside the module.
        let _ = graph.nodes[s].as_mut().unwrap().remove_out_edge(sa);

        assert_eq!(
            graph.check_consistency(),
            Err(InconsistencyError::MissingAdjacencyEntry { edge: sa, node: s })
        );
        assert!(graph.is_poisoned());
        assert!(matches!(
            graph.add_node('x'),
            Err(FlowError::Inconsistency(InconsistencyError::Poisoned(_)))
        ));
    }

    #[test]
    fn dangling_entries_are_detected() {
        let (mut graph, [_, a, _, _], [sa, _, _, _, _]) = diamond();
        graph.nodes[a].as_mut().unwrap().add_out_edge(sa);

        assert_eq!(
            graph.check_consistency(),
            Err(InconsistencyError::DanglingAdjacencyEntry { edge: sa, node: a })
        );
    }

    #[test]
    fn flow_imbalance_ignores_unusable_edges() {
        let (mut graph, [_, a, _, _], [sa, _, at, _, ab]) = diamond();
        graph.edge_mut(sa).unwrap().set_flow(3.0);
        graph.edge_mut(at).unwrap().set_flow(2.0);
        graph.edge_mut(ab).unwrap().set_flow(1.0);
        assert_eq!(graph.flow_imbalance(a), 0.0);

        graph.disable_edge(ab).unwrap();
        assert_eq!(graph.flow_imbalance(a), -1.0);
    }
}
