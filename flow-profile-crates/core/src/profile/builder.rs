use itertools::Itertools;
use log::debug;
use log::trace;
use log::warn;

use super::envelope::is_ordered;
use super::envelope::Envelope;
use super::envelope::EnvelopeGraph;
use super::envelope::PendingExtreme;
use super::Explanation;
use super::InstantBounds;
use super::Precedence;
use super::ProfileOptions;
use super::ResourceBounds;
use super::ResourceLimits;
use super::StaticOrdering;
use super::TemporalOrdering;
use super::Transaction;
use super::TransactionId;
use super::UpdateStrategy;
use crate::basic_types::approximately_equal;
use crate::basic_types::ConstructionError;
use crate::basic_types::FlowError;
use crate::containers::HashMap;
use crate::containers::HashSet;
use crate::create_statistics_struct;
use crate::flow_asserts::flow_assert_extreme;
use crate::flow_asserts::flow_assert_moderate;
use crate::flow_asserts::flow_assert_simple;
use crate::flow_asserts::print_flow_assert_warning_message;
use crate::max_flow::MaxFlowSolver;
use crate::max_flow::MaxFlowStatistics;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;
use crate::statistics::StatisticOptions;

create_statistics_struct!(
    /// Statistics of the profile builder
    ProfileStatistics {
        /// The number of profiles which were built or updated
        num_builds: u64,
        /// The number of times the flow graphs were constructed from scratch
        num_graph_constructions: u64,
        /// The number of instants for which bounds were computed
        num_instants: u64,
        /// The number of max-flow computations
        num_solves: u64,
        /// The number of max-flow computations which were skipped because the sink was unreachable
        num_skipped_solves: u64,
        /// The number of transactions which were added to the flow graphs
        num_inserted_transactions: u64,
        /// The number of transactions which were removed from the flow graphs
        num_retracted_transactions: u64,
        /// The number of ordered pairs of transactions whose precedence edge was re-evaluated
        num_precedence_evaluations: u64,
});

/// The flow graphs of both envelopes.
#[derive(Debug)]
struct EnvelopeGraphs {
    lower: EnvelopeGraph,
    upper: EnvelopeGraph,
}

impl EnvelopeGraphs {
    fn new() -> Result<Self, FlowError> {
        Ok(EnvelopeGraphs {
            lower: EnvelopeGraph::new(Envelope::Lower)?,
            upper: EnvelopeGraph::new(Envelope::Upper)?,
        })
    }

    fn both(&mut self) -> [&mut EnvelopeGraph; 2] {
        [&mut self.lower, &mut self.upper]
    }
}

/// Computes the resource envelope of a set of transactions whose times are only partially known.
///
/// For every instant at which a transaction can start or stop being pending, the builder bounds
/// the resource level from below and from above by solving a maximum flow problem on a flow graph
/// per bound. The graphs are kept between calls: transactions which did not change keep their
/// nodes and edges, so a call after a small change mostly toggles nodes and re-runs the solver.
///
/// # Example
/// ```
/// # use flow_profile_core::profile::*;
/// let limits = ResourceLimits::new(0.0, 0.0, 10.0);
/// let mut builder = ProfileBuilder::new(limits, ProfileOptions::default());
///
/// let produce = Transaction::production(
///     TransactionId::new(0),
///     TimeBounds::new(0, 4),
///     QuantityBounds::fixed(5.0),
/// );
/// let consume = Transaction::consumption(
///     TransactionId::new(1),
///     TimeBounds::new(2, 6),
///     QuantityBounds::fixed(3.0),
/// );
/// let precedences = [Precedence::new(produce.id, consume.id)];
///
/// let bounds = builder
///     .build_or_update_profile(&[produce, consume], &precedences)
///     .unwrap();
///
/// // While both are pending, the consumption can only happen after the production.
/// assert_eq!(bounds.level_at(2), (0.0, 5.0));
/// assert_eq!(bounds.level_at(6), (2.0, 2.0));
/// assert!(bounds.infeasibility(&limits).is_none());
/// ```
#[derive(Debug)]
pub struct ProfileBuilder {
    limits: ResourceLimits,
    options: ProfileOptions,
    solver: MaxFlowSolver,
    /// `None` until the first call, and after a failure or a reset
    graphs: Option<EnvelopeGraphs>,
    /// The transactions as they were represented in the graphs after the last call
    known: HashMap<TransactionId, Transaction>,
    /// The explicit precedences of the last call; `None` if an external ordering was used
    precedences: Option<Vec<Precedence>>,
    invalidated: HashSet<TransactionId>,
    statistics: ProfileStatistics,
}

impl ProfileBuilder {
    pub fn new(limits: ResourceLimits, options: ProfileOptions) -> Self {
        print_flow_assert_warning_message!();
        ProfileBuilder {
            limits,
            options,
            solver: MaxFlowSolver::default(),
            graphs: None,
            known: HashMap::default(),
            precedences: None,
            invalidated: HashSet::default(),
            statistics: ProfileStatistics::default(),
        }
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn options(&self) -> &ProfileOptions {
        &self.options
    }

    /// Computes the envelope of `transactions`, ordered by their time bounds and the explicit
    /// `precedences`.
    ///
    /// Transactions are matched with those of the previous call by id. Transactions which are no
    /// longer present are retracted, and transactions whose bounds or kind changed are updated in
    /// place.
    pub fn build_or_update_profile(
        &mut self,
        transactions: &[Transaction],
        precedences: &[Precedence],
    ) -> Result<ResourceBounds, FlowError> {
        let precedences = precedences
            .iter()
            .copied()
            .sorted()
            .dedup()
            .collect_vec();
        let ordering_changed = self.precedences.as_ref() != Some(&precedences);
        let ordering = StaticOrdering::new(transactions, &precedences);

        let bounds = self.update(transactions, &ordering, ordering_changed, true)?;
        self.precedences = Some(precedences);
        Ok(bounds)
    }

    /// Computes the envelope of `transactions` with an external ordering oracle.
    ///
    /// The builder cannot observe changes of the oracle. Precedences between two transactions
    /// are only re-evaluated when one of them changed or was passed to
    /// [`ProfileBuilder::invalidate`] since the last call.
    pub fn build_or_update_profile_with_ordering(
        &mut self,
        transactions: &[Transaction],
        ordering: &dyn TemporalOrdering,
    ) -> Result<ResourceBounds, FlowError> {
        let ordering_changed = self.precedences.is_some();
        let bounds = self.update(transactions, ordering, ordering_changed, false)?;
        self.precedences = None;
        Ok(bounds)
    }

    /// Marks a transaction as changed, so its edges are refreshed on the next call even if its
    /// bounds are the same.
    pub fn invalidate(&mut self, transaction: TransactionId) {
        let _ = self.invalidated.insert(transaction);
    }

    /// Discards the flow graphs; the next call builds them from scratch.
    pub fn reset(&mut self) {
        self.graphs = None;
        self.known.clear();
        self.precedences = None;
        self.invalidated.clear();
    }

    pub fn statistics(&self) -> &ProfileStatistics {
        &self.statistics
    }

    pub fn solver_statistics(&self) -> &MaxFlowStatistics {
        self.solver.statistics()
    }

    /// Writes the statistics of the builder and its solver to `options`.
    pub fn log_statistics(&self, options: &mut StatisticOptions) {
        self.statistics
            .log(StatisticLogger::new("profile", &mut *options));
        self.solver
            .statistics()
            .log(StatisticLogger::new("maxFlow", &mut *options));
        options.write_postfix();
    }

    fn update(
        &mut self,
        transactions: &[Transaction],
        ordering: &dyn TemporalOrdering,
        ordering_changed: bool,
        ordering_follows_bounds: bool,
    ) -> Result<ResourceBounds, FlowError> {
        validate(transactions)?;
        self.statistics.num_builds += 1;

        if self.options.update_strategy == UpdateStrategy::FromScratch {
            self.reset();
        }

        let result = self.synchronise(
            transactions,
            ordering,
            ordering_changed,
            ordering_follows_bounds,
        );
        if let Err(error) = &result {
            // The graphs may be half updated.
            if error.is_fatal() {
                warn!("discarding the inconsistent envelope graphs: {error}");
            } else {
                debug!("discarding the envelope graphs after a failed update: {error}");
            }
            self.reset();
        }
        result
    }

    fn synchronise(
        &mut self,
        transactions: &[Transaction],
        ordering: &dyn TemporalOrdering,
        ordering_changed: bool,
        ordering_follows_bounds: bool,
    ) -> Result<ResourceBounds, FlowError> {
        let (mut graphs, fresh) = match self.graphs.take() {
            Some(graphs) => (graphs, false),
            None => {
                self.known.clear();
                self.statistics.num_graph_constructions += 1;
                (EnvelopeGraphs::new()?, true)
            }
        };

        let current: HashSet<TransactionId> = transactions
            .iter()
            .map(|transaction| transaction.id)
            .collect();

        let retracted = self
            .known
            .keys()
            .filter(|id| !current.contains(*id))
            .copied()
            .sorted()
            .collect_vec();
        for &id in retracted.iter() {
            for graph in graphs.both() {
                graph.remove(id)?;
            }
            let _ = self.known.remove(&id);
        }
        self.statistics.num_retracted_transactions += retracted.len() as u64;
        let mut structure_changed = !retracted.is_empty();

        let mut dirty = Vec::new();
        for transaction in transactions {
            let invalidated = self.invalidated.contains(&transaction.id);
            match self.known.get(&transaction.id) {
                None => {
                    for graph in graphs.both() {
                        graph.insert(transaction, &self.limits)?;
                    }
                    self.statistics.num_inserted_transactions += 1;
                    structure_changed = true;
                    dirty.push(transaction);
                }
                Some(known) if known.kind != transaction.kind => {
                    for graph in graphs.both() {
                        graph.remove(transaction.id)?;
                        graph.insert(transaction, &self.limits)?;
                    }
                    self.statistics.num_inserted_transactions += 1;
                    structure_changed = true;
                    dirty.push(transaction);
                }
                Some(known) if known != transaction => {
                    structure_changed |= known.time != transaction.time;
                    if known.quantity != transaction.quantity {
                        for graph in graphs.both() {
                            graph.update_quantity(transaction, &self.limits)?;
                        }
                    }
                    dirty.push(transaction);
                }
                Some(_) if invalidated => dirty.push(transaction),
                Some(_) => {}
            }
            let _ = self.known.insert(transaction.id, *transaction);
        }
        self.invalidated.clear();

        let rederive_all =
            fresh || ordering_changed || (ordering_follows_bounds && structure_changed);
        if rederive_all {
            for graph in graphs.both() {
                graph.clear_precedences()?;
            }
            for (earlier, later) in transactions.iter().cartesian_product(transactions) {
                if is_ordered(ordering, earlier, later) {
                    for graph in graphs.both() {
                        graph.set_precedence(later.id, earlier.id, true)?;
                    }
                }
            }
            self.statistics.num_precedence_evaluations += (transactions.len() as u64).pow(2);
        } else {
            for changed in dirty.iter() {
                for other in transactions {
                    for (earlier, later) in [(*changed, other), (other, *changed)] {
                        let ordered = is_ordered(ordering, earlier, later);
                        for graph in graphs.both() {
                            graph.set_precedence(later.id, earlier.id, ordered)?;
                        }
                    }
                }
            }
            self.statistics.num_precedence_evaluations +=
                2 * (dirty.len() * transactions.len()) as u64;
        }

        flow_assert_simple!(
            graphs.lower.graph().num_nodes() == self.known.len() + 2
                && graphs.upper.graph().num_nodes() == self.known.len() + 2,
            "The envelope graphs do not hold one node per transaction"
        );
        flow_assert_moderate!(transactions
            .iter()
            .all(|transaction| graphs.lower.contains(transaction.id)
                && graphs.upper.contains(transaction.id)));
        flow_assert_extreme!(
            graphs.lower.check_consistency().is_ok() && graphs.upper.check_consistency().is_ok()
        );
        debug!(
            "{} transactions ({} changed, {} retracted), {} precedence edges, rederived: {rederive_all}",
            transactions.len(),
            dirty.len(),
            retracted.len(),
            graphs.lower.num_active_precedences(),
        );

        let bounds = self.evaluate(&mut graphs, transactions)?;
        self.graphs = Some(graphs);
        Ok(bounds)
    }

    /// Computes the bounds at every instant with the synchronised graphs.
    fn evaluate(
        &mut self,
        graphs: &mut EnvelopeGraphs,
        transactions: &[Transaction],
    ) -> Result<ResourceBounds, FlowError> {
        let instants = transactions
            .iter()
            .flat_map(|transaction| [transaction.time.earliest, transaction.time.latest])
            .sorted()
            .dedup()
            .collect_vec();

        let mut bounds = Vec::with_capacity(instants.len());
        for time in instants {
            let pending: HashSet<TransactionId> = transactions
                .iter()
                .filter(|transaction| transaction.time.is_pending_at(time))
                .map(|transaction| transaction.id)
                .collect();

            let mut levels = [self.limits.initial_level; 2];
            let mut extremes: [PendingExtreme; 2] = Default::default();
            for ((graph, level), extreme) in graphs
                .both()
                .into_iter()
                .zip(levels.iter_mut())
                .zip(extremes.iter_mut())
            {
                let envelope = graph.envelope();
                *level += transactions
                    .iter()
                    .filter(|transaction| transaction.time.is_closed_at(time))
                    .map(|transaction| envelope.closed_contribution(transaction, &self.limits))
                    .sum::<f64>();

                graph.set_pending(|id| pending.contains(&id))?;
                let (solved, augmentations) = graph.solve(&mut self.solver, self.options.explain)?;
                match augmentations {
                    Some(_) => self.statistics.num_solves += 1,
                    None => self.statistics.num_skipped_solves += 1,
                }
                *level += envelope.sign() * solved.slack;
                *extreme = solved;
            }

            let [lower, upper] = levels;
            flow_assert_moderate!(
                lower <= upper || approximately_equal(lower, upper),
                "The lower bound {lower} exceeds the upper bound {upper} at {time}"
            );
            trace!("bounds at {time}: [{lower}, {upper}]");

            let explanation = self.options.explain.then(|| {
                let [lower, upper] = extremes;
                Explanation {
                    lower_occurred: lower.occurred,
                    lower_cut: lower.bottleneck,
                    upper_occurred: upper.occurred,
                    upper_cut: upper.bottleneck,
                }
            });
            bounds.push(InstantBounds {
                time,
                lower,
                upper,
                explanation,
            });
        }
        self.statistics.num_instants += bounds.len() as u64;

        Ok(ResourceBounds {
            initial_level: self.limits.initial_level,
            instants: bounds,
        })
    }
}

/// Checks every transaction and rejects duplicate ids.
fn validate(transactions: &[Transaction]) -> Result<(), ConstructionError> {
    let mut seen: HashSet<TransactionId> = HashSet::default();
    for transaction in transactions {
        transaction.validate()?;
        if !seen.insert(transaction.id) {
            return Err(ConstructionError::DuplicateTransaction(transaction.id));
        }
    }
    Ok(())
}
