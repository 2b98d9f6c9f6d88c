//! Branch features: objects located at a chainage on exactly one branch.
//!
//! The feature hierarchy is a closed enum ([`FeatureKind`]). Features are
//! stored in a [`BranchFeatureRegistry`], which keeps them ordered by
//! chainage per branch and rebases them when the network is edited.

pub mod composite;
pub mod registry;

pub use composite::{
    COMPOSITE_TOLERANCE, add_structure_to_composite, remove_structure, remove_unused_composites,
};
pub use registry::BranchFeatureRegistry;

use crate::cross_section::CrossSectionDefinition;
use crate::topology::ids::{BranchId, FeatureId};
use serde::{Deserialize, Serialize};

/// Name given to cross sections created from a bare definition.
pub const DEFAULT_CROSS_SECTION_NAME: &str = "cross_section";

/// A cross section placed on a branch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    pub definition: CrossSectionDefinition,
}

/// Hydraulic structure kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureType {
    Weir,
    Orifice,
    Pump,
    Culvert,
    Bridge,
    Gate,
}

/// A single structure. Structures are grouped into a [`CompositeStructure`]
/// at their location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub structure_type: StructureType,
    pub(crate) composite: Option<FeatureId>,
}

impl Structure {
    pub fn new(structure_type: StructureType) -> Self {
        Self {
            structure_type,
            composite: None,
        }
    }

    /// Composite this structure belongs to, if any.
    pub fn composite(&self) -> Option<FeatureId> {
        self.composite
    }
}

/// Container of the structures sharing one location.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeStructure {
    pub(crate) members: Vec<FeatureId>,
}

impl CompositeStructure {
    pub fn members(&self) -> &[FeatureId] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Point inflow or outflow.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LateralSource {
    /// Constant discharge in m³/s; positive is inflow.
    pub discharge: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FeatureKind {
    CrossSection(CrossSection),
    Structure(Structure),
    CompositeStructure(CompositeStructure),
    LateralSource(LateralSource),
}

impl FeatureKind {
    /// Lower-case label used in log messages.
    pub fn label(&self) -> &'static str {
        match self {
            FeatureKind::CrossSection(_) => "cross section",
            FeatureKind::Structure(_) => "structure",
            FeatureKind::CompositeStructure(_) => "composite structure",
            FeatureKind::LateralSource(_) => "lateral source",
        }
    }
}

/// A feature and its location.
///
/// `branch` and `chainage` are owned by the registry: they change only when
/// the feature is attached, moved or rebased.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BranchFeature {
    id: Option<FeatureId>,
    pub name: String,
    branch: Option<BranchId>,
    chainage: f64,
    /// Extent along the branch; zero for point features.
    pub length: f64,
    pub kind: FeatureKind,
}

impl BranchFeature {
    /// A detached point feature.
    pub fn new(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            id: None,
            name: name.into(),
            branch: None,
            chainage: 0.0,
            length: 0.0,
            kind,
        }
    }

    pub fn cross_section(name: impl Into<String>, definition: CrossSectionDefinition) -> Self {
        Self::new(name, FeatureKind::CrossSection(CrossSection { definition }))
    }

    pub fn structure(name: impl Into<String>, structure_type: StructureType) -> Self {
        Self::new(name, FeatureKind::Structure(Structure::new(structure_type)))
    }

    pub fn lateral_source(name: impl Into<String>, discharge: f64) -> Self {
        Self::new(name, FeatureKind::LateralSource(LateralSource { discharge }))
    }

    /// Builder-style extent override.
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length.max(0.0);
        self
    }

    /// Registry id; `None` until attached.
    pub fn id(&self) -> Option<FeatureId> {
        self.id
    }

    /// Branch the feature sits on; `None` when detached.
    pub fn branch(&self) -> Option<BranchId> {
        self.branch
    }

    pub fn chainage(&self) -> f64 {
        self.chainage
    }

    pub fn is_cross_section(&self) -> bool {
        matches!(self.kind, FeatureKind::CrossSection(_))
    }

    pub fn is_structure(&self) -> bool {
        matches!(self.kind, FeatureKind::Structure(_))
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, FeatureKind::CompositeStructure(_))
    }

    pub fn is_lateral_source(&self) -> bool {
        matches!(self.kind, FeatureKind::LateralSource(_))
    }

    pub fn as_cross_section(&self) -> Option<&CrossSection> {
        match &self.kind {
            FeatureKind::CrossSection(cs) => Some(cs),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&Structure> {
        match &self.kind {
            FeatureKind::Structure(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeStructure> {
        match &self.kind {
            FeatureKind::CompositeStructure(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn attach(&mut self, id: FeatureId, branch: BranchId, chainage: f64) {
        self.id = Some(id);
        self.branch = Some(branch);
        self.chainage = chainage;
    }

    pub(crate) fn relocate(&mut self, branch: BranchId, chainage: f64) {
        self.branch = Some(branch);
        self.chainage = chainage;
    }

    pub(crate) fn detach(&mut self) {
        self.branch = None;
    }
}
