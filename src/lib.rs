#![cfg_attr(docsrs, feature(doc_cfg))]
//! # hydro-network
//!
//! hydro-network models 1-D hydraulic networks: channels, pipes and sewer
//! connections joined at nodes, with cross sections, structures and lateral
//! sources placed along them. It edits the network structurally and
//! generates calculation grids on it.
//!
//! ## Features
//! - Arena graph of nodes and branches with stable ids and lazily cached
//!   node incidence
//! - Branch features kept in chainage order, with composite structures
//! - Split, merge, reverse and length edits that rebase every
//!   location-addressed data set (features, coverages, grids) in one
//!   transaction
//! - Calculation point generation around structures, at cross sections and
//!   lateral sources, and at fixed intervals
//! - Cross-section placement and flow-width validation
//!
//! ## Editing
//!
//! Structural edits go through [`edit::BranchTopologyEditor`]. Data that
//! lives on network locations implements [`rebase::LocationAddressed`] and
//! is registered with the editor; after the graph changes each data set
//! receives the same [`rebase::RebasePlan`]. An edit that does not apply
//! (splitting at a node, merging at a junction) returns `Ok(None)` and
//! changes nothing.
//!
//! ## Invariants
//!
//! Mutations re-check their invariants in debug builds. Enable the
//! `check-invariants` feature to keep the checks in release builds.
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and never installs a logger.

pub mod coverage;
pub mod cross_section;
pub mod debug_invariants;
pub mod discretization;
pub mod edit;
pub mod features;
pub mod geometry;
pub mod network;
pub mod network_error;
pub mod rebase;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use network::HydroNetwork;
pub use network_error::NetworkError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::coverage::{NetworkCoverage, NetworkLocation};
    pub use crate::cross_section::{CrossSectionDefinition, ShapeCatalog, ValidationOutcome};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::discretization::{
        Discretization, DiscretizationGenerator, DiscretizationOptions, FixedLengthPolicy,
        NetworkGenerationOptions, generate_network_discretization,
    };
    pub use crate::edit::{BranchTopologyEditor, EditAction, EditListener, SplitAt};
    pub use crate::features::{BranchFeature, FeatureKind, StructureType};
    pub use crate::geometry::{Coordinate, LineGeometry, LineString};
    pub use crate::network::HydroNetwork;
    pub use crate::network_error::NetworkError;
    pub use crate::rebase::{LocationAddressed, RebasePlan};
    pub use crate::topology::{Branch, BranchId, BranchKind, FeatureId, NodeId};
}
