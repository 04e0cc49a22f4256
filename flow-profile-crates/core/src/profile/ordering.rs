use itertools::Itertools;

use super::TimeBounds;
use super::Transaction;
use super::TransactionId;
use crate::containers::HashMap;
use crate::containers::HashSet;

/// An explicit constraint stating that `before` happens no later than `after`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Precedence {
    pub before: TransactionId,
    pub after: TransactionId,
}

impl Precedence {
    pub fn new(before: TransactionId, after: TransactionId) -> Self {
        Precedence { before, after }
    }
}

/// The view of the temporal network which the profile builder needs.
///
/// Both queries are about the times of two transactions in the consistent schedules of the
/// network; they orient the precedence edges of the flow graphs.
pub trait TemporalOrdering {
    /// Whether `time(a) <= time(b)` holds in every consistent schedule.
    fn necessarily_before(&self, a: TransactionId, b: TransactionId) -> bool;

    /// Whether `time(a) <= time(b)` holds in at least one consistent schedule.
    ///
    /// This must be implied by [`TemporalOrdering::necessarily_before`]; it is queried first as a
    /// cheaper filter.
    fn possibly_before(&self, a: TransactionId, b: TransactionId) -> bool;
}

/// A [`TemporalOrdering`] derived from the time bounds of the transactions and a set of explicit
/// [`Precedence`]s.
///
/// `a` is necessarily before `b` if a chain of explicit precedences and disjoint time windows
/// leads from `a` to `b`. The transitive closure is computed once on construction.
#[derive(Clone, Debug, Default)]
pub struct StaticOrdering {
    times: HashMap<TransactionId, TimeBounds>,
    /// For every known transaction, the transactions which it necessarily precedes
    successors: HashMap<TransactionId, HashSet<TransactionId>>,
}

impl StaticOrdering {
    pub fn new(transactions: &[Transaction], precedences: &[Precedence]) -> Self {
        let times: HashMap<TransactionId, TimeBounds> = transactions
            .iter()
            .map(|transaction| (transaction.id, transaction.time))
            .collect();
        let ids = times.keys().copied().sorted().collect_vec();
        let by_earliest = times
            .iter()
            .map(|(&id, bounds)| (bounds.earliest, id))
            .sorted()
            .collect_vec();

        let mut explicit: HashMap<TransactionId, Vec<TransactionId>> = HashMap::default();
        for precedence in precedences {
            explicit
                .entry(precedence.before)
                .or_default()
                .push(precedence.after);
        }

        let mut successors = HashMap::default();
        for &start in &ids {
            let mut reached = HashSet::default();
            let mut stack = vec![start];
            // Every entry of `by_earliest` from this position on has been reached.
            let mut covered = by_earliest.len();
            while let Some(current) = stack.pop() {
                if let Some(next) = explicit.get(&current) {
                    for &successor in next {
                        if reached.insert(successor) {
                            stack.push(successor);
                        }
                    }
                }
                if let Some(bounds) = times.get(&current) {
                    let from =
                        by_earliest.partition_point(|&(earliest, _)| earliest < bounds.latest);
                    for &(_, successor) in &by_earliest[from.min(covered)..covered] {
                        if successor != current && reached.insert(successor) {
                            stack.push(successor);
                        }
                    }
                    covered = covered.min(from);
                }
            }
            let _ = successors.insert(start, reached);
        }

        StaticOrdering { times, successors }
    }
}

impl TemporalOrdering for StaticOrdering {
    fn necessarily_before(&self, a: TransactionId, b: TransactionId) -> bool {
        if !self.times.contains_key(&a) || !self.times.contains_key(&b) {
            return false;
        }
        a == b
            || self
                .successors
                .get(&a)
                .is_some_and(|successors| successors.contains(&b))
    }

    fn possibly_before(&self, a: TransactionId, b: TransactionId) -> bool {
        match (self.times.get(&a), self.times.get(&b)) {
            (Some(a), Some(b)) => a.earliest <= b.latest,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::StorageKey;
    use crate::profile::QuantityBounds;

    fn transaction(id: u32, earliest: i64, latest: i64) -> Transaction {
        Transaction::production(
            TransactionId::new(id),
            TimeBounds::new(earliest, latest),
            QuantityBounds::fixed(1.0),
        )
    }

    fn id(id: u32) -> TransactionId {
        TransactionId::new(id)
    }

    #[test]
    fn disjoint_windows_are_ordered() {
        let ordering = StaticOrdering::new(&[transaction(0, 0, 3), transaction(1, 3, 6)], &[]);

        assert!(ordering.necessarily_before(id(0), id(1)));
        assert!(!ordering.necessarily_before(id(1), id(0)));
        assert!(ordering.possibly_before(id(1), id(0)));
    }

    #[test]
    fn overlapping_windows_are_unordered_without_precedences() {
        let ordering = StaticOrdering::new(&[transaction(0, 0, 5), transaction(1, 2, 6)], &[]);

        assert!(!ordering.necessarily_before(id(0), id(1)));
        assert!(!ordering.necessarily_before(id(1), id(0)));
        assert!(ordering.possibly_before(id(0), id(1)));
        assert!(ordering.possibly_before(id(1), id(0)));
    }

    #[test]
    fn precedences_are_transitive() {
        let transactions = [
            transaction(0, 0, 10),
            transaction(1, 0, 10),
            transaction(2, 0, 10),
        ];
        let ordering = StaticOrdering::new(
            &transactions,
            &[Precedence::new(id(0), id(1)), Precedence::new(id(1), id(2))],
        );

        assert!(ordering.necessarily_before(id(0), id(2)));
        assert!(!ordering.necessarily_before(id(2), id(0)));
    }

    #[test]
    fn precedences_chain_with_disjoint_windows() {
        // 0 precedes 1 explicitly, and 1 ends before 2 starts.
        let transactions = [
            transaction(0, 0, 8),
            transaction(1, 0, 4),
            transaction(2, 4, 8),
        ];
        let ordering = StaticOrdering::new(&transactions, &[Precedence::new(id(0), id(1))]);

        assert!(ordering.necessarily_before(id(0), id(2)));
    }

    #[test]
    fn closure_matches_pairwise_reachability() {
        // A staircase of windows, some overlapping and some disjoint, plus a few precedences.
        let transactions = (0..12)
            .map(|index| transaction(index, (index as i64 / 2) * 3, (index as i64 / 2) * 3 + 4))
            .collect_vec();
        let precedences = [
            Precedence::new(id(5), id(0)),
            Precedence::new(id(1), id(2)),
            Precedence::new(id(11), id(3)),
        ];
        let ordering = StaticOrdering::new(&transactions, &precedences);

        // Reachability by repeated relaxation over all pairs.
        let n = transactions.len();
        let mut reachable = vec![vec![false; n]; n];
        for (a, first) in transactions.iter().enumerate() {
            for (b, second) in transactions.iter().enumerate() {
                reachable[a][b] = a != b && first.time.latest <= second.time.earliest;
            }
        }
        for precedence in precedences {
            reachable[precedence.before.index()][precedence.after.index()] = true;
        }
        for via in 0..n {
            for a in 0..n {
                for b in 0..n {
                    reachable[a][b] |= reachable[a][via] && reachable[via][b];
                }
            }
        }

        for a in 0..n {
            for b in 0..n {
                assert_eq!(
                    ordering.necessarily_before(id(a as u32), id(b as u32)),
                    a == b || reachable[a][b],
                    "{a} before {b}"
                );
            }
        }
    }

    #[test]
    fn unknown_transactions_are_unordered() {
        let ordering = StaticOrdering::new(&[transaction(0, 0, 1)], &[]);

        assert!(!ordering.necessarily_before(id(0), id(7)));
        assert!(!ordering.necessarily_before(id(7), id(0)));
        assert!(ordering.possibly_before(id(7), id(0)));
    }

    #[test]
    fn impossible_order_is_detected() {
        let ordering = StaticOrdering::new(&[transaction(0, 5, 9), transaction(1, 0, 4)], &[]);

        assert!(!ordering.possibly_before(id(0), id(1)));
    }
}
