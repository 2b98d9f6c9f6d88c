//! Network branches.
//!
//! A branch runs from its source node to its target node along a line
//! geometry. Chainage on the branch is measured in units of its *effective
//! length*: the geometric length, or a custom hydraulic length when one is
//! set.

use crate::geometry::{LineGeometry, LineString};
use crate::network_error::NetworkError;
use crate::topology::ids::{BranchId, NodeId};

/// Order number of a branch that takes no part in junction ordering.
pub const UNORDERED: i32 = -1;

/// What a branch physically is. Decides whether it is an open channel or an
/// enclosed conduit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BranchKind {
    /// Open river or canal reach.
    Channel,
    /// Closed conduit.
    Pipe,
    /// Closed connection inside a sewer system.
    SewerConnection,
}

impl BranchKind {
    /// True for closed conduits.
    pub fn is_enclosed(self) -> bool {
        !matches!(self, BranchKind::Channel)
    }
}

/// A directed edge of the network.
///
/// Source and target are ids resolved through the owning
/// [`NetworkGraph`](super::graph::NetworkGraph); they can only be changed
/// through the graph so the node incidence cache stays in sync.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Branch {
    id: BranchId,
    pub name: String,
    /// Optional descriptive name. Empty means "not set".
    pub long_name: String,
    pub kind: BranchKind,
    /// Junction disambiguation value, [`UNORDERED`] by default.
    pub order_number: i32,
    pub(crate) source: NodeId,
    pub(crate) target: NodeId,
    geometry: LineString,
    custom_length: Option<f64>,
}

impl Branch {
    /// A new unordered channel without custom length.
    pub fn new(
        id: BranchId,
        name: impl Into<String>,
        source: NodeId,
        target: NodeId,
        geometry: LineString,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            long_name: String::new(),
            kind: BranchKind::Channel,
            order_number: UNORDERED,
            source,
            target,
            geometry,
            custom_length: None,
        }
    }

    /// Builder-style kind override.
    pub fn with_kind(mut self, kind: BranchKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builder-style custom length for a branch not yet in a network.
    pub fn with_custom_length(mut self, length: f64) -> Result<Self, NetworkError> {
        self.set_custom_length(Some(length))?;
        Ok(self)
    }

    #[inline]
    pub fn id(&self) -> BranchId {
        self.id
    }

    #[inline]
    pub fn source(&self) -> NodeId {
        self.source
    }

    #[inline]
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn geometry(&self) -> &LineString {
        &self.geometry
    }

    /// Length used for chainage: the custom length if set, else the geometric one.
    pub fn effective_length(&self) -> f64 {
        self.custom_length
            .unwrap_or_else(|| self.geometry.length())
    }

    pub fn is_length_custom(&self) -> bool {
        self.custom_length.is_some()
    }

    pub fn custom_length(&self) -> Option<f64> {
        self.custom_length
    }

    pub fn is_enclosed(&self) -> bool {
        self.kind.is_enclosed()
    }

    /// Geometric distance matching `chainage`.
    pub fn chainage_to_distance(&self, chainage: f64) -> f64 {
        match self.custom_length {
            Some(custom) if custom > 0.0 => chainage * self.geometry.length() / custom,
            _ => chainage,
        }
    }

    /// Chainage matching a geometric distance along the line.
    pub fn distance_to_chainage(&self, distance: f64) -> f64 {
        match self.custom_length {
            Some(custom) => {
                let geometric = self.geometry.length();
                if geometric > 0.0 {
                    distance * custom / geometric
                } else {
                    0.0
                }
            }
            None => distance,
        }
    }

    /// Clamp `chainage` into `[0, effective_length]`.
    pub fn clamp_chainage(&self, chainage: f64) -> f64 {
        chainage.clamp(0.0, self.effective_length())
    }

    /// Set or clear the custom length. Located objects are *not* touched here;
    /// use [`HydroNetwork::set_branch_length`](crate::network::HydroNetwork::set_branch_length)
    /// to rescale them as well.
    pub(crate) fn set_custom_length(&mut self, length: Option<f64>) -> Result<(), NetworkError> {
        if let Some(len) = length {
            let len = NetworkError::check_finite("custom length", len)?;
            if len <= 0.0 {
                return Err(NetworkError::InvalidGeometry(format!(
                    "custom length must be positive, got {len}"
                )));
            }
        }
        self.custom_length = length;
        Ok(())
    }

    pub(crate) fn set_geometry(&mut self, geometry: LineString) {
        self.geometry = geometry;
    }
}
