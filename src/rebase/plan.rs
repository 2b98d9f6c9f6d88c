//! Rebase plans: how old (branch, chainage) pairs map to new ones after one
//! topology edit or length change.

use crate::coverage::location::{LOCATION_TOLERANCE, NetworkLocation};
use crate::coverage::permutation::LocationPermutation;
use crate::network_error::NetworkError;
use crate::topology::ids::BranchId;
use std::cell::RefCell;

/// Reversal record: (start bits, extent bits) after a mirror, to the start
/// chainage before it.
pub(crate) type MirrorTable = hashbrown::HashMap<(u64, u64), f64>;

/// How chainages inside one [`ChainageMap`] range move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChainageTransform {
    Identity,
    /// `c + offset`
    Shift(f64),
    /// `c * factor`
    Scale(f64),
    /// `length - c`
    Mirror { length: f64 },
}

/// One piece of a plan: chainages of `source` inside `range` end up on
/// `target`, transformed and clamped into `[0, target_length]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainageMap {
    pub source: BranchId,
    /// Old chainages covered, both ends inclusive (with tolerance).
    pub range: (f64, f64),
    pub target: BranchId,
    pub target_length: f64,
    pub transform: ChainageTransform,
}

impl ChainageMap {
    fn covers(&self, location: &NetworkLocation) -> bool {
        location.branch == self.source
            && location.chainage >= self.range.0 - LOCATION_TOLERANCE
            && location.chainage <= self.range.1 + LOCATION_TOLERANCE
    }
}

/// The mapping handed to every location-addressed data set after an edit.
///
/// Locations on branches the plan does not mention are left alone. A
/// location on a mentioned branch that no map covers is a contract
/// violation ([`NetworkError::UnknownLocation`]).
///
/// Mirrored chainages are looked up in the record of the previous reversal
/// of the same branch first, so reversing twice gives back the exact
/// original bits instead of `L - (L - c)`.
#[derive(Debug, Default)]
pub struct RebasePlan {
    maps: Vec<ChainageMap>,
    mirror_restore: MirrorTable,
    mirror_record: RefCell<MirrorTable>,
}

impl RebasePlan {
    /// A plan from explicit maps. The first map covering a location wins.
    pub fn new(maps: Vec<ChainageMap>) -> Self {
        Self {
            maps,
            ..Self::default()
        }
    }

    pub(crate) fn with_mirror_restore(mut self, restore: MirrorTable) -> Self {
        self.mirror_restore = restore;
        self
    }

    pub fn maps(&self) -> &[ChainageMap] {
        &self.maps
    }

    /// True if locations on `branch` may move.
    pub fn affects(&self, branch: BranchId) -> bool {
        self.maps.iter().any(|m| m.source == branch)
    }

    /// True if chainages on `branch` are mirrored, i.e. their order flips.
    pub fn reverses(&self, branch: BranchId) -> bool {
        self.maps
            .iter()
            .any(|m| m.source == branch && matches!(m.transform, ChainageTransform::Mirror { .. }))
    }

    /// Branches that receive locations from another branch.
    pub fn targets(&self) -> impl Iterator<Item = BranchId> + '_ {
        self.maps.iter().map(|m| m.target)
    }

    /// New address of a point location.
    pub fn map_location(&self, location: NetworkLocation) -> Result<NetworkLocation, NetworkError> {
        self.map_extent(location, 0.0)
    }

    /// New start of an object covering `[chainage, chainage + extent]`.
    /// Under a mirror the far end becomes the new start.
    pub fn map_extent(
        &self,
        location: NetworkLocation,
        extent: f64,
    ) -> Result<NetworkLocation, NetworkError> {
        if !self.affects(location.branch) {
            return Ok(location);
        }
        let map = self
            .maps
            .iter()
            .find(|m| m.covers(&location))
            .ok_or(NetworkError::UnknownLocation(location))?;
        let c = location.chainage;
        let mapped = match map.transform {
            ChainageTransform::Identity => c,
            ChainageTransform::Shift(offset) => c + offset,
            ChainageTransform::Scale(factor) => c * factor,
            ChainageTransform::Mirror { length } => self
                .mirror_restore
                .get(&(c.to_bits(), extent.to_bits()))
                .copied()
                .unwrap_or(length - (c + extent)),
        };
        let chainage = NetworkError::check_finite("rebased chainage", mapped)?
            .clamp(0.0, map.target_length);
        if matches!(map.transform, ChainageTransform::Mirror { .. }) {
            self.mirror_record
                .borrow_mut()
                .insert((chainage.to_bits(), extent.to_bits()), c);
        }
        Ok(NetworkLocation::new(map.target, chainage))
    }

    /// Map every location, then return them sorted together with the
    /// permutation that brings parallel value arrays into the same order.
    pub fn rebase_locations(
        &self,
        locations: &[NetworkLocation],
    ) -> Result<(Vec<NetworkLocation>, LocationPermutation), NetworkError> {
        let mapped = locations
            .iter()
            .map(|&l| self.map_location(l))
            .collect::<Result<Vec<_>, _>>()?;
        let permutation = LocationPermutation::sorting(&mapped);
        let sorted = permutation.permute(&mapped)?;
        Ok((sorted, permutation))
    }

    pub(crate) fn take_mirror_record(&self) -> MirrorTable {
        self.mirror_record.take()
    }
}
