use super::QuantityBounds;
use super::Transaction;
use super::TransactionKind;
use crate::basic_types::Capacity;

/// The resource whose level is bounded by the profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResourceLimits {
    /// The level before any transaction has happened
    pub initial_level: Capacity,
    /// The level may never drop below this value
    pub lower_limit: Capacity,
    /// The level may never exceed this value
    pub upper_limit: Capacity,
    /// The most a single transaction can produce
    pub max_production_rate: Option<Capacity>,
    /// The most a single transaction can consume
    pub max_consumption_rate: Option<Capacity>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        ResourceLimits {
            initial_level: 0.0,
            lower_limit: Capacity::NEG_INFINITY,
            upper_limit: Capacity::INFINITY,
            max_production_rate: None,
            max_consumption_rate: None,
        }
    }
}

impl ResourceLimits {
    pub fn new(initial_level: Capacity, lower_limit: Capacity, upper_limit: Capacity) -> Self {
        ResourceLimits {
            initial_level,
            lower_limit,
            upper_limit,
            ..Default::default()
        }
    }

    pub fn with_max_production_rate(mut self, rate: Capacity) -> Self {
        self.max_production_rate = Some(rate);
        self
    }

    pub fn with_max_consumption_rate(mut self, rate: Capacity) -> Self {
        self.max_consumption_rate = Some(rate);
        self
    }

    /// The quantity bounds of `transaction` after applying the rate limit of its kind.
    pub fn effective_quantity(&self, transaction: &Transaction) -> QuantityBounds {
        let limit = match transaction.kind {
            TransactionKind::Production => self.max_production_rate,
            TransactionKind::Consumption => self.max_consumption_rate,
        };
        transaction.quantity.clamped_to(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::TimeBounds;
    use crate::profile::TransactionId;

    #[test]
    fn rate_limits_apply_per_kind() {
        let limits = ResourceLimits::new(0.0, 0.0, 10.0).with_max_consumption_rate(3.0);
        let production = Transaction::production(
            TransactionId::new(0),
            TimeBounds::new(0, 1),
            QuantityBounds::new(1.0, 6.0),
        );
        let consumption = Transaction::consumption(
            TransactionId::new(1),
            TimeBounds::new(0, 1),
            QuantityBounds::new(1.0, 6.0),
        );

        assert_eq!(
            limits.effective_quantity(&production),
            QuantityBounds::new(1.0, 6.0)
        );
        assert_eq!(
            limits.effective_quantity(&consumption),
            QuantityBounds::new(1.0, 3.0)
        );
    }
}
