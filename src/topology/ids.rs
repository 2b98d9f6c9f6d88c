//! Strong, zero-cost handles for network entities.
//!
//! Nodes, branches and branch features live in arenas and refer to each
//! other only through these identifiers. Each one wraps a nonzero `u64`, so
//! 0 stays reserved as an invalid or sentinel value and `Option<Id>` costs
//! nothing extra.
//!
//! All three types are `repr(transparent)` over `NonZeroU64`, ordered and
//! hashable, and print as the bare integer with `Display` and as
//! `Name(raw)` with `Debug`.

use crate::network_error::NetworkError;
use std::{fmt, num::NonZeroU64};

macro_rules! network_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Creates a new identifier from a raw `u64` value.
            ///
            /// # Errors
            /// Returns [`NetworkError::InvalidId`] if `raw == 0`.
            #[inline]
            pub fn new(raw: u64) -> Result<Self, NetworkError> {
                NonZeroU64::new(raw).map($name).ok_or(NetworkError::InvalidId)
            }

            /// Returns the inner `u64` value.
            #[inline]
            pub const fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.get()).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.get())
            }
        }
    };
}

network_id!(
    /// Handle of a [`Node`](crate::topology::node::Node).
    NodeId
);
network_id!(
    /// Handle of a [`Branch`](crate::topology::branch::Branch).
    ///
    /// Branch ids also define the primary sort order of
    /// [`NetworkLocation`](crate::coverage::NetworkLocation)s.
    BranchId
);
network_id!(
    /// Handle of a [`BranchFeature`](crate::features::BranchFeature).
    FeatureId
);

/// Monotonic id source. Starts at 1 and never hands out the same raw value twice.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Next raw value.
    pub fn next_raw(&mut self) -> u64 {
        let raw = self.next;
        self.next += 1;
        raw
    }

    /// Make sure ids handed out later are all greater than `raw`.
    pub fn observe(&mut self, raw: u64) {
        if raw >= self.next {
            self.next = raw + 1;
        }
    }
}

#[cfg(test)]
mod layout_tests {
    //! Compile-time assertion that the handles have the same size as `u64`.
    use super::*;
    use static_assertions::{assert_eq_align, assert_eq_size};

    assert_eq_size!(NodeId, u64);
    assert_eq_size!(BranchId, u64);
    assert_eq_size!(Option<FeatureId>, u64);
    assert_eq_align!(BranchId, u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert_eq!(NodeId::new(0), Err(NetworkError::InvalidId));
        assert_eq!(BranchId::new(0), Err(NetworkError::InvalidId));
    }

    #[test]
    fn new_and_get() {
        assert_eq!(BranchId::new(42).unwrap().get(), 42);
        assert_eq!(FeatureId::new(u64::MAX).unwrap().get(), u64::MAX);
    }

    #[test]
    fn debug_and_display() {
        let b = BranchId::new(7).unwrap();
        assert_eq!(format!("{:?}", b), "BranchId(7)");
        assert_eq!(format!("{}", b), "7");
        assert_eq!(format!("{:?}", NodeId::new(3).unwrap()), "NodeId(3)");
    }

    #[test]
    fn ordering_and_hash() {
        let a = NodeId::new(1).unwrap();
        let b = NodeId::new(2).unwrap();
        assert!(a < b);
        let set: std::collections::HashSet<_> = [a, b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn allocator_skips_observed_values() {
        let mut alloc = IdAllocator::default();
        assert_eq!(alloc.next_raw(), 1);
        alloc.observe(10);
        assert_eq!(alloc.next_raw(), 11);
        alloc.observe(3);
        assert_eq!(alloc.next_raw(), 12);
    }
}
