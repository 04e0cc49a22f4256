use std::fmt::Display;
use std::fmt::Formatter;

use super::ResourceLimits;
use super::Time;
use super::TransactionId;
use crate::basic_types::Capacity;
use crate::basic_types::FLOW_TOLERANCE;

/// The transactions which determine the bounds at one instant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Explanation {
    /// The pending transactions which have happened in the schedule reaching the lower bound
    pub lower_occurred: Vec<TransactionId>,
    /// The transactions whose quantities form the minimum cut of the lower bound
    pub lower_cut: Vec<TransactionId>,
    /// The pending transactions which have happened in the schedule reaching the upper bound
    pub upper_occurred: Vec<TransactionId>,
    /// The transactions whose quantities form the minimum cut of the upper bound
    pub upper_cut: Vec<TransactionId>,
}

/// The tightest bounds on the resource level just after `time`.
#[derive(Clone, Debug, PartialEq)]
pub struct InstantBounds {
    pub time: Time,
    pub lower: Capacity,
    pub upper: Capacity,
    /// Only present when [`ProfileOptions::explain`](super::ProfileOptions::explain) is set
    pub explanation: Option<Explanation>,
}

impl Display for InstantBounds {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: [{}, {}]", self.time, self.lower, self.upper)
    }
}

/// The side of the resource limits which is crossed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitViolation {
    BelowLowerLimit,
    AboveUpperLimit,
}

/// The level is outside the limits at `time` in every schedule.
///
/// This is a regular outcome of building a profile; it means that the current ordering of the
/// transactions cannot be extended to a solution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InfeasibleProfile {
    pub time: Time,
    pub violation: LimitViolation,
    /// The bound which crosses the limit
    pub bound: Capacity,
}

/// The level is outside the limits at `time` in some, but not every, schedule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flaw {
    pub time: Time,
    pub violation: LimitViolation,
}

/// The resource envelope: bounds on the level at every instant at which a transaction can start or
/// stop being pending.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceBounds {
    pub(crate) initial_level: Capacity,
    /// Sorted by time
    pub(crate) instants: Vec<InstantBounds>,
}

impl ResourceBounds {
    pub fn instants(&self) -> &[InstantBounds] {
        &self.instants
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    /// The bounds `(lower, upper)` on the level at `time`.
    ///
    /// The envelope is constant between two instants; before the first instant the level is the
    /// initial level.
    pub fn level_at(&self, time: Time) -> (Capacity, Capacity) {
        let index = self.instants.partition_point(|instant| instant.time <= time);
        match index.checked_sub(1).map(|index| &self.instants[index]) {
            Some(instant) => (instant.lower, instant.upper),
            None => (self.initial_level, self.initial_level),
        }
    }

    /// The first instant at which the level necessarily violates `limits`, if any.
    pub fn infeasibility(&self, limits: &ResourceLimits) -> Option<InfeasibleProfile> {
        self.instants.iter().find_map(|instant| {
            if instant.upper < limits.lower_limit - FLOW_TOLERANCE {
                Some(InfeasibleProfile {
                    time: instant.time,
                    violation: LimitViolation::BelowLowerLimit,
                    bound: instant.upper,
                })
            } else if instant.lower > limits.upper_limit + FLOW_TOLERANCE {
                Some(InfeasibleProfile {
                    time: instant.time,
                    violation: LimitViolation::AboveUpperLimit,
                    bound: instant.lower,
                })
            } else {
                None
            }
        })
    }

    /// The instants at which the level may violate `limits`, in order of time.
    pub fn flaws(&self, limits: &ResourceLimits) -> Vec<Flaw> {
        let mut flaws = vec![];
        for instant in self.instants.iter() {
            if instant.lower < limits.lower_limit - FLOW_TOLERANCE {
                flaws.push(Flaw {
                    time: instant.time,
                    violation: LimitViolation::BelowLowerLimit,
                });
            }
            if instant.upper > limits.upper_limit + FLOW_TOLERANCE {
                flaws.push(Flaw {
                    time: instant.time,
                    violation: LimitViolation::AboveUpperLimit,
                });
            }
        }
        flaws
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> ResourceBounds {
        let instant = |time, lower, upper| InstantBounds {
            time,
            lower,
            upper,
            explanation: None,
        };
        ResourceBounds {
            initial_level: 5.0,
            instants: vec![
                instant(0, 2.0, 8.0),
                instant(4, -3.0, 6.0),
                instant(9, 11.0, 14.0),
            ],
        }
    }

    #[test]
    fn level_is_constant_between_instants() {
        let bounds = bounds();

        assert_eq!(bounds.level_at(-1), (5.0, 5.0));
        assert_eq!(bounds.level_at(0), (2.0, 8.0));
        assert_eq!(bounds.level_at(3), (2.0, 8.0));
        assert_eq!(bounds.level_at(4), (-3.0, 6.0));
        assert_eq!(bounds.level_at(100), (11.0, 14.0));
    }

    #[test]
    fn infeasibility_reports_the_first_crossing() {
        let bounds = bounds();

        assert_eq!(bounds.infeasibility(&ResourceLimits::new(5.0, 0.0, 20.0)), None);
        assert_eq!(
            bounds.infeasibility(&ResourceLimits::new(5.0, 0.0, 10.0)),
            Some(InfeasibleProfile {
                time: 9,
                violation: LimitViolation::AboveUpperLimit,
                bound: 11.0
            })
        );
        assert_eq!(
            bounds.infeasibility(&ResourceLimits::new(5.0, 7.0, 20.0)),
            Some(InfeasibleProfile {
                time: 4,
                violation: LimitViolation::BelowLowerLimit,
                bound: 6.0
            })
        );
    }

    #[test]
    fn flaws_are_possible_violations() {
        let bounds = bounds();

        assert_eq!(
            bounds.flaws(&ResourceLimits::new(5.0, 0.0, 12.0)),
            vec![
                Flaw {
                    time: 4,
                    violation: LimitViolation::BelowLowerLimit
                },
                Flaw {
                    time: 9,
                    violation: LimitViolation::AboveUpperLimit
                },
            ]
        );
    }
}
