//! Grouping of structures into composite structures.
//!
//! Every structure on a branch belongs to a composite at the same chainage.
//! Adding a structure joins the composite already sitting within
//! [`COMPOSITE_TOLERANCE`] of it, or creates a new uniquely named one.

use super::registry::BranchFeatureRegistry;
use super::{BranchFeature, CompositeStructure, FeatureKind};
use crate::network_error::NetworkError;
use crate::topology::ids::{BranchId, FeatureId};

/// Maximum chainage difference for a structure to join an existing composite.
pub const COMPOSITE_TOLERANCE: f64 = 0.01;

/// Prefix of generated composite names; a number is appended.
pub const COMPOSITE_NAME_PREFIX: &str = "CompositeBranchStructure_1D_";

/// Attach `structure` at `chainage` on `branch` inside a composite.
///
/// Returns `(composite, structure)` ids. When an existing composite is
/// joined the structure takes over its chainage.
pub fn add_structure_to_composite(
    registry: &mut BranchFeatureRegistry,
    branch: BranchId,
    structure: BranchFeature,
    chainage: f64,
) -> Result<(FeatureId, FeatureId), NetworkError> {
    if !structure.is_structure() {
        return Err(NetworkError::InvariantViolation(format!(
            "`{}` is a {}, only structures go into composites",
            structure.name,
            structure.kind.label()
        )));
    }
    let composite = match registry.composite_near(branch, chainage, COMPOSITE_TOLERANCE) {
        Some(existing) => existing,
        None => {
            let name = unique_composite_name(registry);
            let composite = BranchFeature::new(
                name,
                FeatureKind::CompositeStructure(CompositeStructure::default()),
            );
            registry.add(composite, branch, chainage)?
        }
    };
    let at = registry
        .get(composite)
        .map_or(chainage, BranchFeature::chainage);
    let id = registry.add(structure, branch, at)?;
    registry.link_structure(id, composite)?;
    Ok((composite, id))
}

/// Detach `structure`, and its composite once that is empty.
///
/// Returns `None` (nothing changes) for a structure that is not on a branch.
pub fn remove_structure(
    registry: &mut BranchFeatureRegistry,
    structure: FeatureId,
) -> Result<Option<BranchFeature>, NetworkError> {
    let Some(feature) = registry.get(structure) else {
        return Ok(None);
    };
    if feature.branch().is_none() {
        return Ok(None);
    }
    let parent = feature.as_structure().and_then(|s| s.composite());
    let removed = registry.remove(structure)?;
    if let Some(parent) = parent {
        if registry
            .get(parent)
            .and_then(BranchFeature::as_composite)
            .is_some_and(CompositeStructure::is_empty)
        {
            registry.remove(parent)?;
        }
    }
    Ok(Some(removed))
}

/// Remove every composite without members. Returns how many were removed.
pub fn remove_unused_composites(registry: &mut BranchFeatureRegistry) -> Result<usize, NetworkError> {
    let unused: Vec<FeatureId> = registry
        .iter()
        .filter(|f| f.as_composite().is_some_and(CompositeStructure::is_empty))
        .filter_map(BranchFeature::id)
        .collect();
    for &id in &unused {
        registry.remove(id)?;
    }
    Ok(unused.len())
}

/// Chainages that represent structures for discretization: each composite,
/// plus every structure without one.
pub fn structure_chainages(registry: &BranchFeatureRegistry, branch: BranchId) -> Vec<f64> {
    registry
        .on_branch(branch)
        .filter(|f| {
            f.is_composite() || f.as_structure().is_some_and(|s| s.composite().is_none())
        })
        .map(BranchFeature::chainage)
        .collect()
}

fn unique_composite_name(registry: &BranchFeatureRegistry) -> String {
    let taken: hashbrown::HashSet<&str> = registry
        .iter()
        .filter(|f| f.is_composite())
        .map(|f| f.name.as_str())
        .collect();
    (1..)
        .map(|n| format!("{COMPOSITE_NAME_PREFIX}{n}"))
        .find(|name| !taken.contains(name.as_str()))
        .unwrap_or_else(|| COMPOSITE_NAME_PREFIX.to_string())
}
