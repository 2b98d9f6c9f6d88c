//! HydroNetwork: the graph, its located features and the edit state.
//!
//! `HydroNetwork` is the entry point most callers use. It owns
//! - the [`NetworkGraph`] of nodes and branches,
//! - the [`BranchFeatureRegistry`] of cross sections, structures and laterals,
//! - the [`LocationRebaser`] that remembers reversal records between edits,
//! - the single edit slot that makes structural edits non-reentrant.
//!
//! Structural edits (split, merge, reverse, length changes) run through
//! [`BranchTopologyEditor`](crate::edit::BranchTopologyEditor).

use crate::cross_section::CrossSectionDefinition;
use crate::debug_invariants::DebugInvariants;
use crate::edit::{BranchTopologyEditor, EditAction};
use crate::features::{
    self, BranchFeature, BranchFeatureRegistry, DEFAULT_CROSS_SECTION_NAME,
};
use crate::geometry::{Coordinate, LineString};
use crate::network_error::NetworkError;
use crate::rebase::LocationRebaser;
use crate::topology::branch::{Branch, BranchKind, UNORDERED};
use crate::topology::graph::NetworkGraph;
use crate::topology::ids::{BranchId, FeatureId, NodeId};
use crate::topology::node::Node;

/// Two node positions closer than this are the same node when channels are
/// connected by geometry.
pub const NODE_SNAP_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug, Default)]
pub struct HydroNetwork {
    pub name: String,
    graph: NetworkGraph,
    features: BranchFeatureRegistry,
    rebaser: LocationRebaser,
    editing: Option<&'static str>,
}

impl HydroNetwork {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A chain of channels `branch1..branchN` through `points`, with nodes
    /// `node1..nodeN+1`.
    pub fn snake(points: &[Coordinate]) -> Result<Self, NetworkError> {
        let mut network = Self::new("network");
        let mut nodes = Vec::with_capacity(points.len());
        for (i, &p) in points.iter().enumerate() {
            nodes.push(network.add_node(format!("node{}", i + 1), p)?);
        }
        for (i, pair) in nodes.windows(2).enumerate() {
            let line = LineString::segment(points[i], points[i + 1])?;
            network.connect(format!("branch{}", i + 1), pair[0], pair[1], line, BranchKind::Channel)?;
        }
        Ok(network)
    }

    pub fn graph(&self) -> &NetworkGraph {
        &self.graph
    }

    pub fn features(&self) -> &BranchFeatureRegistry {
        &self.features
    }

    /// Direct registry access. Chainages set here are not clamped.
    pub fn features_mut(&mut self) -> &mut BranchFeatureRegistry {
        &mut self.features
    }

    pub(crate) fn parts_mut(
        &mut self,
    ) -> (&mut NetworkGraph, &mut BranchFeatureRegistry, &mut LocationRebaser) {
        (&mut self.graph, &mut self.features, &mut self.rebaser)
    }

    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.graph.branch(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node(id)
    }

    /// Descriptive fields of a branch (name, long name, kind, order number).
    pub fn branch_mut(&mut self, id: BranchId) -> Option<&mut Branch> {
        self.graph.branch_mut(id)
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        location: Coordinate,
    ) -> Result<NodeId, NetworkError> {
        if !location.is_finite() {
            return Err(NetworkError::NonFinite {
                what: "node location",
                value: if location.x.is_finite() { location.y } else { location.x },
            });
        }
        let id = self.graph.next_node_id();
        self.graph.add_node(Node::new(id, name, location))
    }

    /// First node within [`NODE_SNAP_TOLERANCE`] of `location`.
    pub fn find_node_at(&self, location: &Coordinate) -> Option<NodeId> {
        self.graph
            .nodes()
            .find(|n| n.location.distance(location) <= NODE_SNAP_TOLERANCE)
            .map(Node::id)
    }

    /// Add a branch between two existing nodes with an unordered order number.
    pub fn connect(
        &mut self,
        name: impl Into<String>,
        source: NodeId,
        target: NodeId,
        geometry: LineString,
        kind: BranchKind,
    ) -> Result<BranchId, NetworkError> {
        let id = self.graph.next_branch_id();
        let branch = Branch::new(id, name, source, target, geometry).with_kind(kind);
        self.graph.add_branch(branch)
    }

    /// Add `branch` to the network by its geometry.
    ///
    /// The end nodes are looked up at the first and last vertex and created
    /// when missing; the branch's own id and end nodes are replaced. An
    /// unordered branch takes over the order number of the branches it
    /// connects to when they all agree.
    pub fn add_channel(&mut self, mut branch: Branch) -> Result<BranchId, NetworkError> {
        let start = branch.geometry().start();
        let end = branch.geometry().end();
        let source = self.node_at_or_new(start)?;
        let target = self.node_at_or_new(end)?;

        if branch.order_number == UNORDERED {
            branch.order_number = self.inherited_order_number(source, target);
        }
        let id = self.graph.next_branch_id();
        let geometry = branch.geometry().clone();
        let custom_length = branch.custom_length();
        let mut placed =
            Branch::new(id, branch.name, source, target, geometry).with_kind(branch.kind);
        placed.long_name = branch.long_name;
        placed.order_number = branch.order_number;
        placed.set_custom_length(custom_length)?;
        self.graph.add_branch(placed)
    }

    fn node_at_or_new(&mut self, location: Coordinate) -> Result<NodeId, NetworkError> {
        match self.find_node_at(&location) {
            Some(node) => Ok(node),
            None => {
                let name = format!("node{}", self.graph.node_count() + 1);
                self.add_node(name, location)
            }
        }
    }

    fn inherited_order_number(&self, source: NodeId, target: NodeId) -> i32 {
        let mut orders = Vec::with_capacity(2);
        for node in [source, target] {
            let at = self.graph.branches_at(node);
            match at.as_slice() {
                [] => {}
                [only] => {
                    if let Some(b) = self.graph.branch(*only) {
                        orders.push(b.order_number);
                    }
                }
                _ => return UNORDERED,
            }
        }
        match orders.split_first() {
            Some((first, rest)) if rest.iter().all(|o| o == first) => *first,
            _ => UNORDERED,
        }
    }

    /// Remove a branch and every feature on it. Its nodes stay.
    pub fn remove_branch(&mut self, id: BranchId) -> Result<Branch, NetworkError> {
        self.graph.try_branch(id)?;
        let on_branch: Vec<FeatureId> = self.features.ids_on_branch(id).to_vec();
        for feature in on_branch {
            if self.features.contains(feature) {
                self.features.remove(feature)?;
            }
        }
        self.graph.remove_branch(id)
    }

    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, NetworkError> {
        self.graph.remove_node(id)
    }

    /// Attach a feature at `chainage`, clamped into the branch.
    ///
    /// Structures are placed inside a composite structure; the structure's
    /// own id is returned.
    pub fn add_branch_feature(
        &mut self,
        branch: BranchId,
        feature: BranchFeature,
        chainage: f64,
    ) -> Result<FeatureId, NetworkError> {
        let chainage = NetworkError::check_finite("feature chainage", chainage)?;
        let chainage = self.graph.try_branch(branch)?.clamp_chainage(chainage);
        if feature.is_structure() {
            let (_, id) =
                features::add_structure_to_composite(&mut self.features, branch, feature, chainage)?;
            return Ok(id);
        }
        self.features.add(feature, branch, chainage)
    }

    /// Place `definition` as a cross section named `cross_section`.
    pub fn add_cross_section_definition(
        &mut self,
        branch: BranchId,
        definition: CrossSectionDefinition,
        chainage: f64,
    ) -> Result<FeatureId, NetworkError> {
        let feature = BranchFeature::cross_section(DEFAULT_CROSS_SECTION_NAME, definition);
        self.add_branch_feature(branch, feature, chainage)
    }

    /// Add a structure to the composite at its location, creating one when
    /// needed. Returns `(composite, structure)`.
    pub fn add_structure(
        &mut self,
        branch: BranchId,
        structure: BranchFeature,
        chainage: f64,
    ) -> Result<(FeatureId, FeatureId), NetworkError> {
        let chainage = NetworkError::check_finite("structure chainage", chainage)?;
        let chainage = self.graph.try_branch(branch)?.clamp_chainage(chainage);
        features::add_structure_to_composite(&mut self.features, branch, structure, chainage)
    }

    /// Remove a structure and its composite once empty. `None` when the
    /// structure is not on a branch.
    pub fn remove_structure(
        &mut self,
        structure: FeatureId,
    ) -> Result<Option<BranchFeature>, NetworkError> {
        let Some(feature) = self.features.get(structure) else {
            return Ok(None);
        };
        if feature.branch().is_none() {
            return Ok(None);
        }
        self.begin_edit("delete structure")?;
        let removed = features::remove_structure(&mut self.features, structure);
        self.end_edit()?;
        removed
    }

    pub fn remove_unused_composites(&mut self) -> Result<usize, NetworkError> {
        features::remove_unused_composites(&mut self.features)
    }

    /// Set (`Some`) or clear (`None`) the custom length of `branch`,
    /// rescaling every feature on it. Only the network's own features
    /// follow; use [`BranchTopologyEditor`] to include external data.
    pub fn set_branch_length(
        &mut self,
        branch: BranchId,
        length: Option<f64>,
    ) -> Result<Option<EditAction>, NetworkError> {
        BranchTopologyEditor::new(self).set_branch_length(branch, length)
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Name of the edit in progress.
    pub fn edit_in_progress(&self) -> Option<&'static str> {
        self.editing
    }

    /// Open the edit slot.
    ///
    /// # Errors
    /// `EditInProgress` while another edit holds it.
    pub fn begin_edit(&mut self, action: &'static str) -> Result<(), NetworkError> {
        if let Some(active) = self.editing {
            return Err(NetworkError::EditInProgress { active });
        }
        self.editing = Some(action);
        Ok(())
    }

    /// Close the edit slot.
    pub fn end_edit(&mut self) -> Result<(), NetworkError> {
        self.editing
            .take()
            .map(|_| ())
            .ok_or(NetworkError::NoEditInProgress)?;
        crate::debug_invariants!(self.validate_invariants(), "HydroNetwork");
        Ok(())
    }
}

impl DebugInvariants for HydroNetwork {
    fn debug_assert_invariants(&self) {
        self.graph.debug_assert_invariants();
        self.features.debug_assert_invariants();
        crate::debug_invariants!(self.validate_invariants(), "HydroNetwork");
    }

    /// Every feature sits on an existing branch inside its length.
    fn validate_invariants(&self) -> Result<(), NetworkError> {
        for feature in self.features.iter() {
            let Some(branch) = feature.branch() else {
                continue;
            };
            let length = self.graph.try_branch(branch)?.effective_length();
            let c = feature.chainage();
            if c < -crate::coverage::LOCATION_TOLERANCE
                || c > length + crate::coverage::LOCATION_TOLERANCE
            {
                return Err(NetworkError::InvariantViolation(format!(
                    "feature `{}` at {c} outside branch {branch} of length {length}",
                    feature.name
                )));
            }
        }
        Ok(())
    }
}
