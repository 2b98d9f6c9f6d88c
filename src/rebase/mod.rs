//! Keeping located data consistent across topology edits.
//!
//! Every edit produces a [`RebasePlan`] from the [`LocationRebaser`]. The
//! network applies it to its own features and hands it to every registered
//! [`LocationAddressed`] data set, which moves and re-sorts its locations and
//! permutes any values indexed by them.

pub mod plan;
pub mod rebaser;

pub use plan::{ChainageMap, ChainageTransform, RebasePlan};
pub use rebaser::LocationRebaser;

use crate::network_error::NetworkError;

/// Data bound to network locations that must follow topology edits.
pub trait LocationAddressed {
    /// Move every owned location according to `plan`.
    ///
    /// # Errors
    /// Implementations propagate [`NetworkError::UnknownLocation`] from the
    /// plan and must not leave partially rebased state behind.
    fn rebase(&mut self, plan: &RebasePlan) -> Result<(), NetworkError>;
}
