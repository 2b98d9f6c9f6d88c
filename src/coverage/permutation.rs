//! Reordering of location-indexed values.
//!
//! When the locations of a data set are re-sorted (after a reversal or a
//! merge), every value array indexed by location has to follow. A
//! [`LocationPermutation`] records the new order and applies it to flat
//! buffers, either one-dimensional or along one axis of a row-major
//! multi-dimensional buffer, leaving every other axis untouched.

use super::location::NetworkLocation;
use crate::network_error::NetworkError;

/// `order[new_index] == old_index`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocationPermutation {
    order: Vec<usize>,
}

impl LocationPermutation {
    pub fn identity(len: usize) -> Self {
        Self {
            order: (0..len).collect(),
        }
    }

    /// Full reversal of `len` entries.
    pub fn reversal(len: usize) -> Self {
        Self {
            order: (0..len).rev().collect(),
        }
    }

    /// Permutation from an explicit order.
    ///
    /// # Errors
    /// `InvariantViolation` unless `order` holds each of `0..order.len()` once.
    pub fn from_order(order: Vec<usize>) -> Result<Self, NetworkError> {
        let mut seen = vec![false; order.len()];
        for &i in &order {
            match seen.get_mut(i) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(NetworkError::InvariantViolation(format!(
                        "index {i} repeated or out of range in permutation of {}",
                        order.len()
                    )));
                }
            }
        }
        Ok(Self { order })
    }

    /// The stable order that sorts `locations`.
    pub fn sorting(locations: &[NetworkLocation]) -> Self {
        let mut order: Vec<usize> = (0..locations.len()).collect();
        order.sort_by(|&a, &b| locations[a].total_cmp(&locations[b]));
        Self { order }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn is_identity(&self) -> bool {
        self.order.iter().enumerate().all(|(i, &o)| i == o)
    }

    /// Write `src` into `dest` in the new order.
    ///
    /// Returns an error if the lengths differ from the permutation length.
    pub fn apply<V: Clone>(&self, src: &[V], dest: &mut [V]) -> Result<(), NetworkError> {
        let expected = self.order.len();
        for found in [src.len(), dest.len()] {
            if found != expected {
                return Err(NetworkError::ValueLengthMismatch { expected, found });
            }
        }
        for (d, &o) in dest.iter_mut().zip(&self.order) {
            *d = src[o].clone();
        }
        Ok(())
    }

    /// Reorder a one-dimensional buffer.
    pub fn permute<V: Clone>(&self, values: &[V]) -> Result<Vec<V>, NetworkError> {
        self.apply_along_axis(values, &[self.order.len()], 0)
    }

    /// Reorder index `axis` of a row-major buffer of the given `shape`.
    /// `shape[axis]` must equal the permutation length.
    pub fn apply_along_axis<V: Clone>(
        &self,
        values: &[V],
        shape: &[usize],
        axis: usize,
    ) -> Result<Vec<V>, NetworkError> {
        let n = shape.get(axis).copied().ok_or_else(|| {
            NetworkError::InvariantViolation(format!(
                "axis {axis} out of range for shape {shape:?}"
            ))
        })?;
        if n != self.order.len() {
            return Err(NetworkError::ValueLengthMismatch {
                expected: self.order.len(),
                found: n,
            });
        }
        let total: usize = shape.iter().product();
        if values.len() != total {
            return Err(NetworkError::ValueLengthMismatch {
                expected: total,
                found: values.len(),
            });
        }
        let inner: usize = shape[axis + 1..].iter().product();
        let outer: usize = shape[..axis].iter().product();
        let mut out = Vec::with_capacity(total);
        for o in 0..outer {
            let block = o * n * inner;
            for &old in &self.order {
                let start = block + old * inner;
                out.extend_from_slice(&values[start..start + inner]);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::ids::BranchId;

    #[test]
    fn identity_is_noop() {
        let p = LocationPermutation::identity(3);
        assert!(p.is_identity());
        assert_eq!(p.permute(&[1, 2, 3]).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn reversal_reverses() {
        let src = vec![1, 2, 3, 4];
        let mut dst = vec![0; 4];
        LocationPermutation::reversal(4).apply(&src, &mut dst).unwrap();
        assert_eq!(dst, vec![4, 3, 2, 1]);
    }

    #[test]
    fn length_mismatch_errors() {
        let src = vec![1, 2, 3];
        let mut dst = vec![0; 2];
        let err = LocationPermutation::identity(3)
            .apply(&src, &mut dst)
            .unwrap_err();
        assert_eq!(
            err,
            NetworkError::ValueLengthMismatch {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn from_order_validates() {
        assert!(LocationPermutation::from_order(vec![2, 0, 1]).is_ok());
        assert!(LocationPermutation::from_order(vec![0, 0, 1]).is_err());
        assert!(LocationPermutation::from_order(vec![0, 3]).is_err());
    }

    #[test]
    fn sorting_is_stable() {
        let b = BranchId::new(1).unwrap();
        let locs = [
            NetworkLocation::new(b, 90.0),
            NetworkLocation::new(b, 10.0),
            NetworkLocation::new(b, 90.0),
        ];
        assert_eq!(LocationPermutation::sorting(&locs).order(), &[1, 0, 2]);
    }

    #[test]
    fn permutes_only_the_location_axis() {
        // shape [time = 2, location = 3, component = 2]
        let values: Vec<i32> = (0..12).collect();
        let p = LocationPermutation::reversal(3);
        let out = p.apply_along_axis(&values, &[2, 3, 2], 1).unwrap();
        assert_eq!(out, vec![4, 5, 2, 3, 0, 1, 10, 11, 8, 9, 6, 7]);

        // location as the trailing axis: shape [time = 2, location = 3]
        let values = vec![1, 2, 3, 10, 20, 30];
        let out = p.apply_along_axis(&values, &[2, 3], 1).unwrap();
        assert_eq!(out, vec![3, 2, 1, 30, 20, 10]);
    }

    #[test]
    fn wrong_axis_is_reported() {
        let p = LocationPermutation::identity(2);
        assert!(p.apply_along_axis(&[1, 2], &[2], 1).is_err());
        assert!(p.apply_along_axis(&[1, 2, 3], &[3], 0).is_err());
    }
}
