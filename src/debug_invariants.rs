//! Invariant checking shared by the graph, the feature registry and the
//! location-addressed data sets.

use crate::network_error::NetworkError;
use crate::topology::ids::BranchId;
use itertools::Itertools;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Assert invariants in debug builds or when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), NetworkError>;
}

/// Helper macro to run a fallible check and panic on error when invariant
/// checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

/// Chainages on `branch` must be finite, non-decreasing and inside
/// `[0, length]` (with `tolerance` slack at both ends).
pub(crate) fn check_chainage_order<I>(
    branch: BranchId,
    chainages: I,
    length: f64,
    tolerance: f64,
) -> Result<(), NetworkError>
where
    I: IntoIterator<Item = f64>,
{
    let chainages: Vec<f64> = chainages.into_iter().collect();
    if let Some(&bad) = chainages.iter().find(|c| !c.is_finite()) {
        return Err(NetworkError::NonFinite {
            what: "chainage",
            value: bad,
        });
    }
    if let Some(&out) = chainages
        .iter()
        .find(|&&c| c < -tolerance || c > length + tolerance)
    {
        return Err(NetworkError::InvariantViolation(format!(
            "chainage {out} outside [0, {length}] on branch {branch}"
        )));
    }
    if let Some((a, b)) = chainages.iter().tuple_windows().find(|(a, b)| b < a) {
        return Err(NetworkError::InvariantViolation(format!(
            "chainages out of order on branch {branch}: {a} before {b}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b() -> BranchId {
        BranchId::new(1).unwrap()
    }

    #[test]
    fn sorted_in_range_passes() {
        assert!(check_chainage_order(b(), [0.0, 10.0, 10.0, 100.0], 100.0, 1e-7).is_ok());
    }

    #[test]
    fn unsorted_is_reported() {
        let err = check_chainage_order(b(), [0.0, 30.0, 10.0], 100.0, 1e-7).unwrap_err();
        assert!(matches!(err, NetworkError::InvariantViolation(_)));
    }

    #[test]
    fn out_of_range_and_nan_are_reported() {
        assert!(check_chainage_order(b(), [101.0], 100.0, 1e-7).is_err());
        assert!(matches!(
            check_chainage_order(b(), [f64::NAN], 100.0, 1e-7),
            Err(NetworkError::NonFinite { .. })
        ));
    }
}
