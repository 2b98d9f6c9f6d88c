//! Calculation grids ("discretizations") on the network.
//!
//! A [`Discretization`] is an ordered set of calculation points, each of
//! which may be fixed by the user. Fixed points survive regeneration; every
//! other point is rebuilt by the [`DiscretizationGenerator`] from the
//! branch's features and the [`DiscretizationOptions`].

pub mod generator;
pub mod network_grid;
pub mod options;

pub use generator::DiscretizationGenerator;
pub use network_grid::{
    cleanup_locations_at_nodes, generate_from_chainages, generate_network_discretization,
    replace_points_for_removed_branch,
};
pub use options::{DiscretizationOptions, FixedLengthPolicy, NetworkGenerationOptions};

use crate::coverage::{LOCATION_TOLERANCE, NetworkCoverage, NetworkLocation};
use crate::debug_invariants::DebugInvariants;
use crate::network_error::NetworkError;
use crate::rebase::{LocationAddressed, RebasePlan};
use crate::topology::ids::BranchId;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// One calculation point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPoint {
    pub location: NetworkLocation,
    pub fixed: bool,
}

/// Calculation points, sorted by (branch, chainage), with a fixed flag each.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Discretization {
    points: NetworkCoverage<bool>,
}

impl Default for Discretization {
    fn default() -> Self {
        Self::new("computational grid")
    }
}

impl Discretization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            points: NetworkCoverage::new(name, false),
        }
    }

    pub fn name(&self) -> &str {
        &self.points.name
    }

    pub fn locations(&self) -> &[NetworkLocation] {
        self.points.locations()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        self.points
            .locations()
            .iter()
            .zip(self.points.values())
            .map(|(&location, &fixed)| GridPoint { location, fixed })
    }

    /// Points on `branch` in chainage order.
    pub fn locations_on(&self, branch: BranchId) -> &[NetworkLocation] {
        let locations = self.points.locations();
        let start = locations.partition_point(|l| l.branch < branch);
        let end = locations.partition_point(|l| l.branch <= branch);
        &locations[start..end]
    }

    /// Chainages of `branch`, in order.
    pub fn chainages_on(&self, branch: BranchId) -> Vec<f64> {
        self.locations_on(branch).iter().map(|l| l.chainage).collect()
    }

    /// Chainages of the fixed points on `branch`.
    pub fn fixed_chainages_on(&self, branch: BranchId) -> Vec<f64> {
        self.points()
            .filter(|p| p.fixed && p.location.branch == branch)
            .map(|p| p.location.chainage)
            .collect()
    }

    pub fn is_fixed(&self, location: &NetworkLocation) -> bool {
        self.points.value(location).copied().unwrap_or(false)
    }

    /// Flip the fixed flag of an existing point and return the new flag.
    pub fn toggle_fixed_point(&mut self, location: &NetworkLocation) -> Result<bool, NetworkError> {
        let index = self
            .points
            .index_of(location)
            .ok_or(NetworkError::UnknownLocation(*location))?;
        let flag = &mut self.points.values_mut()[index];
        *flag = !*flag;
        Ok(*flag)
    }

    /// Add a (non-fixed) point; an existing coinciding point is kept as is.
    pub fn add_location(&mut self, location: NetworkLocation) -> Result<usize, NetworkError> {
        self.points.add_location(location)
    }

    pub fn clear_branch(&mut self, branch: BranchId) {
        self.points.clear_branch(branch);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Replace the point set (or merge into it when `merge`), sort it and
    /// drop duplicates within [`LOCATION_TOLERANCE`]. Points that coincide
    /// with a fixed point of the old set stay fixed.
    pub fn update_network_locations(
        &mut self,
        locations: impl IntoIterator<Item = NetworkLocation>,
        merge: bool,
    ) -> Result<(), NetworkError> {
        let fixed: Vec<NetworkLocation> = self
            .points()
            .filter(|p| p.fixed)
            .map(|p| p.location)
            .collect();
        let mut all: Vec<NetworkLocation> = if merge {
            self.locations().to_vec()
        } else {
            Vec::new()
        };
        all.extend(locations);
        all.sort_by(NetworkLocation::total_cmp);
        all.dedup_by(|next, kept| next.coincides(kept, LOCATION_TOLERANCE));
        let flags = all
            .iter()
            .map(|l| fixed.iter().any(|f| f.coincides(l, LOCATION_TOLERANCE)))
            .collect();
        self.points.set_locations(all, flags)?;
        crate::debug_invariants!(self.validate_invariants(), "Discretization");
        Ok(())
    }

    /// Rebuild the points of `branch` from `chainages`. Chainages that
    /// coincide with one of `fixed` are flagged fixed.
    pub(crate) fn replace_branch(
        &mut self,
        branch: BranchId,
        chainages: &[f64],
        fixed: &[f64],
    ) -> Result<(), NetworkError> {
        let mut locations: Vec<NetworkLocation> = self
            .locations()
            .iter()
            .filter(|l| l.branch != branch)
            .copied()
            .collect();
        let mut flags: Vec<bool> = self
            .points()
            .filter(|p| p.location.branch != branch)
            .map(|p| p.fixed)
            .collect();
        for &chainage in chainages {
            NetworkError::check_finite("grid chainage", chainage)?;
            locations.push(NetworkLocation::new(branch, chainage));
            flags.push(
                fixed
                    .iter()
                    .any(|f| (f - chainage).abs() <= LOCATION_TOLERANCE),
            );
        }
        self.points.set_locations(locations, flags)?;
        crate::debug_invariants!(self.validate_invariants(), "Discretization");
        Ok(())
    }
}

/// Merging two branches lands the end point of one and the start point of
/// the other on the same location; those collapse into one point, fixed if
/// either was.
impl LocationAddressed for Discretization {
    fn rebase(&mut self, plan: &RebasePlan) -> Result<(), NetworkError> {
        self.points.rebase(plan)?;

        let mut locations: Vec<NetworkLocation> = Vec::with_capacity(self.len());
        let mut flags: Vec<bool> = Vec::with_capacity(self.len());
        for point in self.points() {
            match (locations.last(), flags.last_mut()) {
                (Some(kept), Some(fixed)) if kept.coincides(&point.location, LOCATION_TOLERANCE) => {
                    *fixed |= point.fixed;
                }
                _ => {
                    locations.push(point.location);
                    flags.push(point.fixed);
                }
            }
        }
        if locations.len() < self.len() {
            log::debug!(
                "`{}`: {} calculation points collapsed after rebase",
                self.name(),
                self.len() - locations.len()
            );
            self.points.set_locations(locations, flags)?;
        }
        crate::debug_invariants!(self.validate_invariants(), "Discretization");
        Ok(())
    }
}

impl DebugInvariants for Discretization {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Discretization");
    }

    fn validate_invariants(&self) -> Result<(), NetworkError> {
        self.points.validate_invariants()?;
        if let Some((a, _)) = self
            .locations()
            .iter()
            .tuple_windows()
            .find(|(a, b)| a.coincides(b, LOCATION_TOLERANCE))
        {
            return Err(NetworkError::InvariantViolation(format!(
                "duplicate calculation point {a} in `{}`",
                self.name()
            )));
        }
        Ok(())
    }
}
