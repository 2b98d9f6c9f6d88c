//! (branch, chainage) addresses on the network.

use crate::topology::ids::BranchId;
use std::cmp::Ordering;
use std::fmt;

/// Two chainages on the same branch closer than this are the same location.
pub const LOCATION_TOLERANCE: f64 = 1e-7;

/// A point on the network.
///
/// Locations order by branch id first, then by chainage. Equality is
/// tolerant: same branch and chainages within [`LOCATION_TOLERANCE`].
/// Because tolerant equality is not transitive, the type implements
/// `PartialEq`/`PartialOrd` only; use [`NetworkLocation::total_cmp`] for
/// sorting.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct NetworkLocation {
    pub branch: BranchId,
    pub chainage: f64,
}

impl NetworkLocation {
    pub const fn new(branch: BranchId, chainage: f64) -> Self {
        Self { branch, chainage }
    }

    /// Strict ordering: branch id, then `f64::total_cmp` on chainage.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.branch
            .cmp(&other.branch)
            .then_with(|| self.chainage.total_cmp(&other.chainage))
    }

    /// Same branch and within `tolerance`.
    pub fn coincides(&self, other: &Self, tolerance: f64) -> bool {
        self.branch == other.branch && (self.chainage - other.chainage).abs() <= tolerance
    }
}

impl PartialEq for NetworkLocation {
    fn eq(&self, other: &Self) -> bool {
        self.coincides(other, LOCATION_TOLERANCE)
    }
}

impl PartialOrd for NetworkLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else {
            Some(self.total_cmp(other))
        }
    }
}

impl fmt::Display for NetworkLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.branch, self.chainage)
    }
}

/// Sort in place by [`NetworkLocation::total_cmp`].
pub fn sort_locations(locations: &mut [NetworkLocation]) {
    locations.sort_by(NetworkLocation::total_cmp);
}
