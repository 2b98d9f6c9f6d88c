//! NetworkError: Unified error type for hydro-network public APIs
//!
//! Only contract violations are reported through this type. Rejected
//! operations (splitting at a node, merging a junction) return `None`, and
//! validation failures are reported as a [`ValidationOutcome`].
//!
//! [`ValidationOutcome`]: crate::cross_section::validator::ValidationOutcome

use crate::coverage::NetworkLocation;
use crate::topology::ids::{BranchId, FeatureId, NodeId};
use thiserror::Error;

/// Unified error type for hydro-network operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NetworkError {
    /// Attempted to construct an identifier with a zero value (invalid).
    #[error("identifier must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidId,
    /// The node is not part of the network.
    #[error("unknown node `{0}`")]
    UnknownNode(NodeId),
    /// The branch is not part of the network.
    #[error("unknown branch `{0}`")]
    UnknownBranch(BranchId),
    /// The feature is not registered.
    #[error("unknown branch feature `{0}`")]
    UnknownFeature(FeatureId),
    /// A node with this id was already added.
    #[error("duplicate node `{0}`")]
    DuplicateNode(NodeId),
    /// A branch with this id was already added.
    #[error("duplicate branch `{0}`")]
    DuplicateBranch(BranchId),
    /// A node was removed while branches still reference it.
    #[error("node `{node}` still has {incident} incident branch(es)")]
    NodeStillConnected { node: NodeId, incident: usize },
    /// `begin_edit` while another edit is active.
    #[error("a structural edit is already in progress ({active})")]
    EditInProgress { active: &'static str },
    /// `end_edit` without a matching `begin_edit`.
    #[error("no structural edit in progress")]
    NoEditInProgress,
    /// Discretization was asked for a negative minimum distance.
    #[error("minimum distance must be non-negative, got {0}")]
    NegativeMinimumDistance(f64),
    /// Fixed-length generation needs a strictly positive length.
    #[error("fixed length must be positive, got {0}")]
    NonPositiveFixedLength(f64),
    /// Structure distance must be non-negative.
    #[error("structure distance must be non-negative, got {0}")]
    NegativeStructureDistance(f64),
    /// A rebase plan was applied to a location it does not describe.
    #[error("location {0} is not covered by the rebase plan")]
    UnknownLocation(NetworkLocation),
    /// A chainage, length or coordinate was NaN or infinite.
    #[error("non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
    /// Geometry that cannot back a branch (fewer than two vertices, zero length, ...).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// A coverage value buffer does not match `locations × stride`.
    #[error("value buffer length mismatch: expected {expected}, found {found}")]
    ValueLengthMismatch { expected: usize, found: usize },
    /// Internal bookkeeping broke an invariant.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl NetworkError {
    /// Error unless `value` is finite.
    pub(crate) fn check_finite(what: &'static str, value: f64) -> Result<f64, NetworkError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(NetworkError::NonFinite { what, value })
        }
    }
}
