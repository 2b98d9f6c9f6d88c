//! BranchFeatureRegistry: storage of located branch features.
//!
//! Features are kept in an id-keyed arena plus, per branch, the list of
//! feature ids in chainage order. The per-branch lists are the only ordering
//! authority; every operation that moves a feature re-sorts the lists it
//! touches (stably, so features sharing a chainage keep their relative order).

use super::{BranchFeature, FeatureKind};
use crate::coverage::location::{LOCATION_TOLERANCE, NetworkLocation};
use crate::debug_invariants::{DebugInvariants, check_chainage_order};
use crate::network_error::NetworkError;
use crate::rebase::{LocationAddressed, RebasePlan};
use crate::topology::ids::{BranchId, FeatureId, IdAllocator};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct BranchFeatureRegistry {
    features: BTreeMap<FeatureId, BranchFeature>,
    by_branch: hashbrown::HashMap<BranchId, Vec<FeatureId>>,
    ids: IdAllocator,
    version: u64,
}

impl BranchFeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `feature` to `branch` at `chainage` and return its new id.
    ///
    /// The chainage is taken as given; callers that know the branch length
    /// clamp it first.
    pub fn add(
        &mut self,
        mut feature: BranchFeature,
        branch: BranchId,
        chainage: f64,
    ) -> Result<FeatureId, NetworkError> {
        let chainage = NetworkError::check_finite("feature chainage", chainage)?;
        let id = self.next_id();
        feature.attach(id, branch, chainage);
        self.features.insert(id, feature);
        self.insert_sorted(branch, id);
        self.touch();
        Ok(id)
    }

    /// Detach and return a feature.
    ///
    /// A structure is also dropped from its composite; the members of a
    /// removed composite lose their parent.
    pub fn remove(&mut self, id: FeatureId) -> Result<BranchFeature, NetworkError> {
        let mut feature = self
            .features
            .remove(&id)
            .ok_or(NetworkError::UnknownFeature(id))?;
        if let Some(branch) = feature.branch() {
            self.unlink(branch, id);
        }
        match &mut feature.kind {
            FeatureKind::Structure(s) => {
                if let Some(parent) = s.composite.take() {
                    if let Some(FeatureKind::CompositeStructure(c)) =
                        self.features.get_mut(&parent).map(|f| &mut f.kind)
                    {
                        c.members.retain(|&m| m != id);
                    }
                }
            }
            FeatureKind::CompositeStructure(c) => {
                for member in c.members.drain(..) {
                    if let Some(FeatureKind::Structure(s)) =
                        self.features.get_mut(&member).map(|f| &mut f.kind)
                    {
                        s.composite = None;
                    }
                }
            }
            FeatureKind::CrossSection(_) | FeatureKind::LateralSource(_) => {}
        }
        feature.detach();
        self.touch();
        Ok(feature)
    }

    pub fn get(&self, id: FeatureId) -> Option<&BranchFeature> {
        self.features.get(&id)
    }

    /// Mutable access to a feature's descriptive fields. Location changes go
    /// through [`set_chainage`](Self::set_chainage) and
    /// [`move_to_branch`](Self::move_to_branch).
    pub fn get_mut(&mut self, id: FeatureId) -> Option<&mut BranchFeature> {
        self.features.get_mut(&id)
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.features.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// All features in id order.
    pub fn iter(&self) -> impl Iterator<Item = &BranchFeature> {
        self.features.values()
    }

    /// Monotonic version bumped by every change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Feature ids on `branch` in chainage order.
    pub fn ids_on_branch(&self, branch: BranchId) -> &[FeatureId] {
        self.by_branch.get(&branch).map_or(&[], Vec::as_slice)
    }

    /// Features on `branch` in chainage order.
    pub fn on_branch(&self, branch: BranchId) -> impl Iterator<Item = &BranchFeature> + '_ {
        self.ids_on_branch(branch)
            .iter()
            .filter_map(move |id| self.features.get(id))
    }

    pub fn cross_sections_on(&self, branch: BranchId) -> impl Iterator<Item = &BranchFeature> + '_ {
        self.on_branch(branch).filter(|f| f.is_cross_section())
    }

    pub fn structures_on(&self, branch: BranchId) -> impl Iterator<Item = &BranchFeature> + '_ {
        self.on_branch(branch).filter(|f| f.is_structure())
    }

    pub fn composites_on(&self, branch: BranchId) -> impl Iterator<Item = &BranchFeature> + '_ {
        self.on_branch(branch).filter(|f| f.is_composite())
    }

    pub fn laterals_on(&self, branch: BranchId) -> impl Iterator<Item = &BranchFeature> + '_ {
        self.on_branch(branch).filter(|f| f.is_lateral_source())
    }

    /// Move a feature along its branch.
    pub fn set_chainage(&mut self, id: FeatureId, chainage: f64) -> Result<(), NetworkError> {
        let branch = self
            .get(id)
            .ok_or(NetworkError::UnknownFeature(id))?
            .branch()
            .ok_or(NetworkError::UnknownFeature(id))?;
        self.move_to_branch(id, branch, chainage)
    }

    /// Move a feature to `chainage` on `branch`.
    pub fn move_to_branch(
        &mut self,
        id: FeatureId,
        branch: BranchId,
        chainage: f64,
    ) -> Result<(), NetworkError> {
        let chainage = NetworkError::check_finite("feature chainage", chainage)?;
        let feature = self
            .features
            .get_mut(&id)
            .ok_or(NetworkError::UnknownFeature(id))?;
        let old = feature.branch();
        feature.relocate(branch, chainage);
        if let Some(old) = old {
            self.unlink(old, id);
        }
        self.insert_sorted(branch, id);
        self.touch();
        Ok(())
    }

    /// Multiply every chainage on `branch` by `factor`.
    pub fn rescale_branch(&mut self, branch: BranchId, factor: f64) -> Result<(), NetworkError> {
        let factor = NetworkError::check_finite("rescale factor", factor)?;
        if factor < 0.0 {
            return Err(NetworkError::InvariantViolation(format!(
                "negative rescale factor {factor} would invert feature order"
            )));
        }
        for id in self.by_branch.get(&branch).into_iter().flatten() {
            if let Some(f) = self.features.get_mut(id) {
                f.chainage *= factor;
            }
        }
        self.touch();
        Ok(())
    }

    /// Re-sort the feature list of `branch` by chainage.
    pub fn reorder_branch(&mut self, branch: BranchId) {
        if let Some(mut ids) = self.by_branch.remove(&branch) {
            self.sort_ids(&mut ids);
            self.by_branch.insert(branch, ids);
        }
        self.touch();
    }

    /// Composite on `branch` whose chainage is within `tolerance` of `chainage`.
    pub fn composite_near(
        &self,
        branch: BranchId,
        chainage: f64,
        tolerance: f64,
    ) -> Option<FeatureId> {
        self.composites_on(branch)
            .find(|f| (f.chainage() - chainage).abs() < tolerance)
            .and_then(BranchFeature::id)
    }

    pub(crate) fn link_structure(
        &mut self,
        structure: FeatureId,
        composite: FeatureId,
    ) -> Result<(), NetworkError> {
        if !self.get(composite).is_some_and(BranchFeature::is_composite) {
            return Err(NetworkError::UnknownFeature(composite));
        }
        match self.features.get_mut(&structure).map(|f| &mut f.kind) {
            Some(FeatureKind::Structure(s)) => s.composite = Some(composite),
            _ => return Err(NetworkError::UnknownFeature(structure)),
        }
        let member_length = self.features.get(&structure).map_or(0.0, |f| f.length);
        if let Some(parent) = self.features.get_mut(&composite) {
            parent.length = parent.length.max(member_length);
            if let FeatureKind::CompositeStructure(c) = &mut parent.kind {
                c.members.push(structure);
            }
        }
        self.touch();
        Ok(())
    }

    fn next_id(&mut self) -> FeatureId {
        loop {
            if let Ok(id) = FeatureId::new(self.ids.next_raw()) {
                if !self.features.contains_key(&id) {
                    return id;
                }
            }
        }
    }

    fn unlink(&mut self, branch: BranchId, id: FeatureId) {
        if let Some(ids) = self.by_branch.get_mut(&branch) {
            ids.retain(|&f| f != id);
            if ids.is_empty() {
                self.by_branch.remove(&branch);
            }
        }
    }

    /// Insert after every feature at the same or a lower chainage.
    fn insert_sorted(&mut self, branch: BranchId, id: FeatureId) {
        let chainage = self.features.get(&id).map_or(0.0, BranchFeature::chainage);
        let features = &self.features;
        let ids = self.by_branch.entry(branch).or_default();
        let at = ids.partition_point(|other| {
            features
                .get(other)
                .is_some_and(|f| f.chainage() <= chainage)
        });
        ids.insert(at, id);
    }

    fn sort_ids(&self, ids: &mut [FeatureId]) {
        ids.sort_by(|a, b| {
            let ca = self.features.get(a).map_or(0.0, BranchFeature::chainage);
            let cb = self.features.get(b).map_or(0.0, BranchFeature::chainage);
            ca.total_cmp(&cb)
        });
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
        crate::debug_invariants!(self.validate_invariants(), "BranchFeatureRegistry");
    }
}

impl LocationAddressed for BranchFeatureRegistry {
    fn rebase(&mut self, plan: &RebasePlan) -> Result<(), NetworkError> {
        let mut sources: Vec<BranchId> = Vec::new();
        for map in plan.maps() {
            if !sources.contains(&map.source) {
                sources.push(map.source);
            }
        }

        // Map everything first so a failing location leaves the registry as it was.
        let mut moved: Vec<(FeatureId, NetworkLocation)> = Vec::new();
        for &branch in &sources {
            for &id in self.ids_on_branch(branch) {
                let feature = self.features.get(&id).ok_or(NetworkError::UnknownFeature(id))?;
                let old = NetworkLocation::new(branch, feature.chainage());
                moved.push((id, plan.map_extent(old, feature.length)?));
            }
        }

        // Structures stay at their composite's location.
        let composite_targets: hashbrown::HashMap<FeatureId, NetworkLocation> = moved
            .iter()
            .filter(|(id, _)| self.get(*id).is_some_and(BranchFeature::is_composite))
            .copied()
            .collect();
        for (id, to) in &mut moved {
            let parent = self
                .get(*id)
                .and_then(BranchFeature::as_structure)
                .and_then(|s| s.composite());
            if let Some(parent_to) = parent.and_then(|p| composite_targets.get(&p)) {
                *to = *parent_to;
            }
        }

        // Receiving branches that are not sources keep their features in front.
        let mut order: Vec<BranchId> = Vec::new();
        for target in plan.targets() {
            if !sources.contains(&target) && !order.contains(&target) {
                order.push(target);
            }
        }
        order.extend(sources.iter().copied());

        for (id, to) in &moved {
            if let Some(f) = self.features.get_mut(id) {
                f.relocate(to.branch, to.chainage);
            }
        }

        let mut old_lists: Vec<(BranchId, Vec<FeatureId>)> = order
            .iter()
            .map(|&b| (b, self.by_branch.remove(&b).unwrap_or_default()))
            .collect();
        let mut rebuilt: hashbrown::HashMap<BranchId, Vec<FeatureId>> = hashbrown::HashMap::new();
        for (branch, ids) in &mut old_lists {
            if plan.reverses(*branch) {
                ids.reverse();
            }
            for &id in ids.iter() {
                if let Some(target) = self.features.get(&id).and_then(BranchFeature::branch) {
                    rebuilt.entry(target).or_default().push(id);
                }
            }
        }
        for (branch, mut ids) in rebuilt {
            self.sort_ids(&mut ids);
            self.by_branch.insert(branch, ids);
        }
        self.touch();
        Ok(())
    }
}

impl DebugInvariants for BranchFeatureRegistry {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "BranchFeatureRegistry");
    }

    fn validate_invariants(&self) -> Result<(), NetworkError> {
        let mut listed = 0usize;
        for (&branch, ids) in &self.by_branch {
            let mut chainages = Vec::with_capacity(ids.len());
            for id in ids {
                let feature = self.features.get(id).ok_or_else(|| {
                    NetworkError::InvariantViolation(format!(
                        "branch {branch} lists missing feature {id}"
                    ))
                })?;
                if feature.branch() != Some(branch) {
                    return Err(NetworkError::InvariantViolation(format!(
                        "feature {id} listed on branch {branch} but located elsewhere"
                    )));
                }
                chainages.push(feature.chainage());
            }
            check_chainage_order(branch, chainages, f64::INFINITY, LOCATION_TOLERANCE)?;
            listed += ids.len();
        }
        let attached = self.features.values().filter(|f| f.branch().is_some()).count();
        if listed != attached {
            return Err(NetworkError::InvariantViolation(format!(
                "{attached} attached features but {listed} listed"
            )));
        }
        for (&id, feature) in &self.features {
            if let FeatureKind::Structure(s) = &feature.kind {
                if let Some(parent) = s.composite {
                    let ok = self
                        .features
                        .get(&parent)
                        .and_then(BranchFeature::as_composite)
                        .is_some_and(|c| c.members.contains(&id));
                    if !ok {
                        return Err(NetworkError::InvariantViolation(format!(
                            "structure {id} points at composite {parent} that does not list it"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
