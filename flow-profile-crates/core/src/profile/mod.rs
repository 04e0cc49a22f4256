//! Resource envelopes of transactions with partially known times.
//!
//! The [`ProfileBuilder`] turns a set of [`Transaction`]s and a [`TemporalOrdering`] into
//! [`ResourceBounds`]: for every instant the lowest and highest level which the resource can have
//! in any schedule consistent with the ordering. Each bound is the result of a maximum flow
//! computation on a flow graph which is kept up to date between calls.
mod bounds;
mod builder;
mod envelope;
mod limits;
mod options;
mod ordering;
mod transaction;

pub use bounds::*;
pub use builder::ProfileBuilder;
pub use builder::ProfileStatistics;
pub use limits::ResourceLimits;
pub use options::*;
pub use ordering::*;
pub use transaction::*;
