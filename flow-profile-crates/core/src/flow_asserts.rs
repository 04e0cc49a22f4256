//! Leveled debug checks.
//!
//! The cheap checks ([`flow_assert_simple`]) are always active; the expensive ones re-verify
//! whole-graph invariants after every solve and are only compiled in with the `debug-checks`
//! feature.

#[cfg(not(feature = "debug-checks"))]
pub(crate) const FLOW_ASSERT_LEVEL_DEFINITION: u8 = FLOW_ASSERT_SIMPLE;
#[cfg(feature = "debug-checks")]
pub(crate) const FLOW_ASSERT_LEVEL_DEFINITION: u8 = FLOW_ASSERT_EXTREME;

pub(crate) const FLOW_ASSERT_SIMPLE: u8 = 1;
pub(crate) const FLOW_ASSERT_MODERATE: u8 = 2;
pub(crate) const FLOW_ASSERT_ADVANCED: u8 = 3;
pub(crate) const FLOW_ASSERT_EXTREME: u8 = 4;

macro_rules! print_flow_assert_warning_message {
    () => {
        if $crate::flow_asserts::FLOW_ASSERT_LEVEL_DEFINITION
            >= $crate::flow_asserts::FLOW_ASSERT_MODERATE
        {
            log::warn!(
                "Potential performance degradation: the flow assert level is set to {}, meaning every solve re-verifies the whole graph.",
                $crate::flow_asserts::FLOW_ASSERT_LEVEL_DEFINITION
            );
        };
    };
}

macro_rules! flow_assert_simple {
    ($($arg:tt)*) => {
        if $crate::flow_asserts::FLOW_ASSERT_LEVEL_DEFINITION >= $crate::flow_asserts::FLOW_ASSERT_SIMPLE {
            assert!($($arg)*);
        }
    };
}

macro_rules! flow_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::flow_asserts::FLOW_ASSERT_LEVEL_DEFINITION >= $crate::flow_asserts::FLOW_ASSERT_MODERATE {
            assert!($($arg)*);
        }
    };
}

macro_rules! flow_assert_advanced {
    ($($arg:tt)*) => {
        if $crate::flow_asserts::FLOW_ASSERT_LEVEL_DEFINITION >= $crate::flow_asserts::FLOW_ASSERT_ADVANCED {
            assert!($($arg)*);
        }
    };
}

macro_rules! flow_assert_extreme {
    ($($arg:tt)*) => {
        if $crate::flow_asserts::FLOW_ASSERT_LEVEL_DEFINITION >= $crate::flow_asserts::FLOW_ASSERT_EXTREME {
            assert!($($arg)*);
        }
    };
}

pub(crate) use flow_assert_advanced;
pub(crate) use flow_assert_extreme;
pub(crate) use flow_assert_moderate;
pub(crate) use flow_assert_simple;
pub(crate) use print_flow_assert_warning_message;
