//! Location-addressed data: network locations, value coverages and the
//! permutations that keep them aligned.

pub mod location;
pub mod network_coverage;
pub mod permutation;

pub use location::{LOCATION_TOLERANCE, NetworkLocation, sort_locations};
pub use network_coverage::NetworkCoverage;
pub use permutation::LocationPermutation;
