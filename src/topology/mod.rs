//! Network topology: nodes, branches and the graph that owns them.
//!
//! Nodes and branches live in an arena ([`graph::NetworkGraph`]) keyed by
//! stable ids; branches name their end nodes by id and node incidence is
//! derived on demand.

pub mod branch;
pub mod cache;
pub mod graph;
pub mod ids;
pub mod node;

pub use branch::{Branch, BranchKind, UNORDERED};
pub use cache::InvalidateCache;
pub use graph::{Incidence, NetworkGraph};
pub use ids::{BranchId, FeatureId, NodeId};
pub use node::Node;
