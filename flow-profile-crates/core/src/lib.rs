//! # Flow profile
//! Bounds on the level of a resource whose producing and consuming transactions happen at times
//! which are only partially known, computed with maximum flows.
//!
//! The crate consists of three layers:
//! - [`graph::FlowGraph`], an arena of nodes and edges addressed by stable handles, in which nodes
//!   and edges can be disabled and re-enabled without being removed.
//! - [`max_flow::MaxFlowSolver`], which computes a maximum flow and the corresponding minimum cut
//!   over the enabled part of a flow graph.
//! - [`profile::ProfileBuilder`], which translates transactions and their temporal ordering into
//!   two flow graphs (one per bound) and keeps them up to date between calls.
//!
//! # Example
//! ```
//! # use flow_profile_core::profile::*;
//! let limits = ResourceLimits::new(2.0, 0.0, 4.0);
//! let mut builder = ProfileBuilder::new(limits, ProfileOptions::default());
//!
//! let transactions = [
//!     Transaction::consumption(
//!         TransactionId::new(0),
//!         TimeBounds::new(0, 10),
//!         QuantityBounds::fixed(3.0),
//!     ),
//!     Transaction::production(
//!         TransactionId::new(1),
//!         TimeBounds::new(0, 10),
//!         QuantityBounds::fixed(1.0),
//!     ),
//! ];
//! let bounds = builder.build_or_update_profile(&transactions, &[]).unwrap();
//!
//! // The consumption may happen before the production, taking the level below zero.
//! assert_eq!(bounds.level_at(0), (-1.0, 3.0));
//! assert_eq!(bounds.flaws(&limits).len(), 1);
//! assert!(bounds.infeasibility(&limits).is_none());
//! ```
pub(crate) mod flow_asserts;

pub mod basic_types;
pub mod containers;
pub mod graph;
pub mod max_flow;
pub mod profile;
pub mod statistics;

pub use convert_case;

pub use crate::basic_types::Capacity;
pub use crate::basic_types::ConstructionError;
pub use crate::basic_types::FlowError;
pub use crate::basic_types::InconsistencyError;
pub use crate::graph::FlowGraph;
pub use crate::max_flow::MaxFlowSolver;
pub use crate::profile::ProfileBuilder;
