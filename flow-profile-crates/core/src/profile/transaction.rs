use std::fmt::Display;
use std::fmt::Formatter;

use crate::basic_types::Capacity;
use crate::basic_types::ConstructionError;
use crate::containers::StorageKey;

/// A point on the timeline of the resource.
pub type Time = i64;

/// Identifies a [`Transaction`] across calls to the
/// [`ProfileBuilder`](super::ProfileBuilder).
///
/// The builder recognises a transaction from one call to the next by this id; a transaction whose
/// id no longer appears in the input is considered retracted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u32);

impl TransactionId {
    pub const fn new(id: u32) -> Self {
        TransactionId(id)
    }
}

impl StorageKey for TransactionId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        TransactionId(index as u32)
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Adds to the resource level
    Production,
    /// Takes from the resource level
    Consumption,
}

/// The window in which the time of a transaction can still be chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeBounds {
    pub earliest: Time,
    pub latest: Time,
}

impl TimeBounds {
    pub fn new(earliest: Time, latest: Time) -> Self {
        TimeBounds { earliest, latest }
    }

    /// A transaction is pending at `time` if it may have happened already, but need not have.
    pub fn is_pending_at(&self, time: Time) -> bool {
        self.earliest <= time && time < self.latest
    }

    /// A transaction is closed at `time` if it has happened in every schedule.
    pub fn is_closed_at(&self, time: Time) -> bool {
        self.latest <= time
    }

    /// Whether there is an instant at which both transactions are pending.
    pub(crate) fn pending_overlaps(&self, other: &TimeBounds) -> bool {
        self.earliest < self.latest
            && other.earliest < other.latest
            && self.earliest < other.latest
            && other.earliest < self.latest
    }
}

/// The range of the (unsigned) amount which a transaction moves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuantityBounds {
    pub lower: Capacity,
    pub upper: Capacity,
}

impl QuantityBounds {
    pub fn new(lower: Capacity, upper: Capacity) -> Self {
        QuantityBounds { lower, upper }
    }

    pub fn fixed(quantity: Capacity) -> Self {
        QuantityBounds {
            lower: quantity,
            upper: quantity,
        }
    }

    /// Both bounds limited to at most `limit`.
    pub(crate) fn clamped_to(self, limit: Option<Capacity>) -> Self {
        match limit {
            Some(limit) => QuantityBounds {
                lower: self.lower.min(limit),
                upper: self.upper.min(limit),
            },
            None => self,
        }
    }
}

/// A production or consumption of the resource at a time which is not yet fixed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub time: TimeBounds,
    pub quantity: QuantityBounds,
}

impl Transaction {
    pub fn production(id: TransactionId, time: TimeBounds, quantity: QuantityBounds) -> Self {
        Transaction {
            id,
            kind: TransactionKind::Production,
            time,
            quantity,
        }
    }

    pub fn consumption(id: TransactionId, time: TimeBounds, quantity: QuantityBounds) -> Self {
        Transaction {
            id,
            kind: TransactionKind::Consumption,
            time,
            quantity,
        }
    }

    /// Checks that the time window is not empty and that the quantity bounds are finite,
    /// non-negative and ordered.
    pub fn validate(&self) -> Result<(), ConstructionError> {
        if self.time.earliest > self.time.latest {
            return Err(ConstructionError::InvalidTimeBounds {
                id: self.id,
                earliest: self.time.earliest,
                latest: self.time.latest,
            });
        }

        let QuantityBounds { lower, upper } = self.quantity;
        if !lower.is_finite() || !upper.is_finite() || lower < 0.0 || lower > upper {
            return Err(ConstructionError::InvalidQuantityBounds {
                id: self.id,
                lower,
                upper,
            });
        }
        Ok(())
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let verb = match self.kind {
            TransactionKind::Production => "produce",
            TransactionKind::Consumption => "consume",
        };
        write!(
            f,
            "{} {verb} [{}, {}] at [{}, {}]",
            self.id, self.quantity.lower, self.quantity.upper, self.time.earliest, self.time.latest
        )
    }
}
