/// Flow and capacity values. [`f64::INFINITY`] is an unbounded capacity.
pub type Capacity = f64;

/// Residual capacities at or below this value are treated as saturated.
pub const FLOW_TOLERANCE: Capacity = 1e-9;

/// Relative tolerance used when two accumulated flow values are compared.
pub(crate) const COMPARISON_TOLERANCE: Capacity = 1e-6;

/// A capacity is valid when it is a non-negative number (possibly infinite).
pub(crate) fn is_valid_capacity(capacity: Capacity) -> bool {
    !capacity.is_nan() && capacity >= 0.0
}

pub(crate) fn is_positive(value: Capacity) -> bool {
    value > FLOW_TOLERANCE
}

pub(crate) fn approximately_equal(lhs: Capacity, rhs: Capacity) -> bool {
    if lhs.is_infinite() || rhs.is_infinite() {
        return lhs == rhs;
    }
    let scale = lhs.abs().max(rhs.abs()).max(1.0);
    (lhs - rhs).abs() <= COMPARISON_TOLERANCE * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_and_nan_capacities_are_invalid() {
        assert!(!is_valid_capacity(-1.0));
        assert!(!is_valid_capacity(f64::NAN));
        assert!(is_valid_capacity(0.0));
        assert!(is_valid_capacity(f64::INFINITY));
    }

    #[test]
    fn tolerance_is_relative_for_large_values() {
        assert!(approximately_equal(1e12, 1e12 + 1e-1));
        assert!(!approximately_equal(1.0, 1.0 + 1e-5));
        assert!(!approximately_equal(f64::INFINITY, 1e300));
    }
}
