//! Network nodes.
//!
//! A node only knows where it is. Which branches start or end at it is
//! derived from the branches themselves by [`NetworkGraph`](super::graph::NetworkGraph).

use crate::geometry::Coordinate;
use crate::topology::ids::NodeId;

/// A connection point between branches (junction, boundary, manhole).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    id: NodeId,
    /// Display name; not required to be unique.
    pub name: String,
    /// Position of the node in the plane.
    pub location: Coordinate,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>, location: Coordinate) -> Self {
        Self {
            id,
            name: name.into(),
            location,
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }
}
