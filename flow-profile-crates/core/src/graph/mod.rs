//! The flow graph: an arena of [`Node`]s and [`Edge`]s addressed by stable handles.
mod edge;
mod flow_graph;
mod ids;
mod node;

pub use edge::Edge;
pub use flow_graph::FlowGraph;
pub use ids::EdgeId;
pub use ids::NodeId;
pub use node::Node;
