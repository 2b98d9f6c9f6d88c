//! NetworkCoverage: values bound to network locations.
//!
//! A coverage stores a sorted list of locations and a flat row-major value
//! buffer in which one axis (the *location axis*) is indexed by location.
//! Any other axes (time steps before it, components after it) are carried
//! along untouched when locations are added, removed or rebased.

use super::location::NetworkLocation;
use super::permutation::LocationPermutation;
use crate::debug_invariants::DebugInvariants;
use crate::network_error::NetworkError;
use crate::rebase::{LocationAddressed, RebasePlan};
use crate::topology::ids::BranchId;
use itertools::Itertools;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct NetworkCoverage<V> {
    pub name: String,
    locations: Vec<NetworkLocation>,
    values: Vec<V>,
    /// Full shape of `values`; `shape[location_axis] == locations.len()`.
    shape: Vec<usize>,
    location_axis: usize,
    default_value: V,
}

impl<V: Clone> NetworkCoverage<V> {
    /// One value per location.
    pub fn new(name: impl Into<String>, default_value: V) -> Self {
        Self::with_shape(name, default_value, &[], &[])
    }

    /// Values shaped `leading × locations × trailing`.
    pub fn with_shape(
        name: impl Into<String>,
        default_value: V,
        leading: &[usize],
        trailing: &[usize],
    ) -> Self {
        let mut shape = leading.to_vec();
        shape.push(0);
        shape.extend_from_slice(trailing);
        Self {
            name: name.into(),
            locations: Vec::new(),
            values: Vec::new(),
            shape,
            location_axis: leading.len(),
            default_value,
        }
    }

    pub fn locations(&self) -> &[NetworkLocation] {
        &self.locations
    }

    /// Flat row-major buffer.
    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [V] {
        &mut self.values
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn location_axis(&self) -> usize {
        self.location_axis
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Index of the location coinciding with `location`.
    pub fn index_of(&self, location: &NetworkLocation) -> Option<usize> {
        self.locations.iter().position(|l| l == location)
    }

    /// Value of a one-value-per-location coverage.
    pub fn value(&self, location: &NetworkLocation) -> Option<&V> {
        if self.shape.len() != 1 {
            return None;
        }
        self.index_of(location).and_then(|i| self.values.get(i))
    }

    /// Set the value of a one-value-per-location coverage, adding the
    /// location when it is new.
    pub fn set_value(&mut self, location: NetworkLocation, value: V) -> Result<(), NetworkError> {
        if self.shape.len() != 1 {
            return Err(NetworkError::ValueLengthMismatch {
                expected: 1,
                found: self.shape.iter().product(),
            });
        }
        let index = self.add_location(location)?;
        self.values[index] = value;
        Ok(())
    }

    /// Insert `location` in sorted position with default values and return
    /// its index. A coinciding location is reused.
    pub fn add_location(&mut self, location: NetworkLocation) -> Result<usize, NetworkError> {
        NetworkError::check_finite("coverage chainage", location.chainage)?;
        if let Some(existing) = self.index_of(&location) {
            return Ok(existing);
        }
        let at = self
            .locations
            .partition_point(|l| l.total_cmp(&location).is_le());
        let picks: Vec<Option<usize>> = (0..self.locations.len())
            .map(Some)
            .take(at)
            .chain(std::iter::once(None))
            .chain((at..self.locations.len()).map(Some))
            .collect();
        self.regather(&picks);
        self.locations.insert(at, location);
        crate::debug_invariants!(self.validate_invariants(), "NetworkCoverage");
        Ok(at)
    }

    /// Replace all locations and values. `values` is laid out with the given
    /// locations on the location axis; both are sorted together.
    pub fn set_locations(
        &mut self,
        locations: Vec<NetworkLocation>,
        values: Vec<V>,
    ) -> Result<(), NetworkError> {
        let mut shape = self.shape.clone();
        shape[self.location_axis] = locations.len();
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(NetworkError::ValueLengthMismatch {
                expected,
                found: values.len(),
            });
        }
        if let Some(bad) = locations.iter().find(|l| !l.chainage.is_finite()) {
            return Err(NetworkError::NonFinite {
                what: "coverage chainage",
                value: bad.chainage,
            });
        }
        let permutation = LocationPermutation::sorting(&locations);
        self.values = permutation.apply_along_axis(&values, &shape, self.location_axis)?;
        self.locations = permutation.permute(&locations)?;
        self.shape = shape;
        crate::debug_invariants!(self.validate_invariants(), "NetworkCoverage");
        Ok(())
    }

    /// Drop every location on `branch` with its values.
    pub fn clear_branch(&mut self, branch: BranchId) {
        let picks: Vec<Option<usize>> = self
            .locations
            .iter()
            .positions(|l| l.branch != branch)
            .map(Some)
            .collect();
        self.regather(&picks);
        self.locations.retain(|l| l.branch != branch);
        crate::debug_invariants!(self.validate_invariants(), "NetworkCoverage");
    }

    pub fn clear(&mut self) {
        self.regather(&[]);
        self.locations.clear();
    }

    /// Rebuild the buffer along the location axis: entry `i` of the new axis
    /// is old entry `picks[i]`, or the default value for `None`.
    fn regather(&mut self, picks: &[Option<usize>]) {
        let axis = self.location_axis;
        let n = self.shape[axis];
        let inner: usize = self.shape[axis + 1..].iter().product();
        let outer: usize = self.shape[..axis].iter().product();
        let mut out = Vec::with_capacity(outer * picks.len() * inner);
        for o in 0..outer {
            let block = o * n * inner;
            for pick in picks {
                match pick {
                    Some(old) => {
                        let start = block + old * inner;
                        out.extend_from_slice(&self.values[start..start + inner]);
                    }
                    None => out.extend(std::iter::repeat_n(self.default_value.clone(), inner)),
                }
            }
        }
        self.values = out;
        self.shape[axis] = picks.len();
    }
}

impl<V: Clone> LocationAddressed for NetworkCoverage<V> {
    fn rebase(&mut self, plan: &RebasePlan) -> Result<(), NetworkError> {
        let (locations, permutation) = plan.rebase_locations(&self.locations)?;
        let values = permutation.apply_along_axis(&self.values, &self.shape, self.location_axis)?;
        self.locations = locations;
        self.values = values;
        crate::debug_invariants!(self.validate_invariants(), "NetworkCoverage");
        Ok(())
    }
}

impl<V: Clone> DebugInvariants for NetworkCoverage<V> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "NetworkCoverage");
    }

    fn validate_invariants(&self) -> Result<(), NetworkError> {
        if self.shape[self.location_axis] != self.locations.len() {
            return Err(NetworkError::ValueLengthMismatch {
                expected: self.locations.len(),
                found: self.shape[self.location_axis],
            });
        }
        let expected: usize = self.shape.iter().product();
        if self.values.len() != expected {
            return Err(NetworkError::ValueLengthMismatch {
                expected,
                found: self.values.len(),
            });
        }
        if let Some((a, b)) = self
            .locations
            .iter()
            .tuple_windows()
            .find(|(a, b)| a.total_cmp(b).is_gt())
        {
            return Err(NetworkError::InvariantViolation(format!(
                "coverage `{}` locations out of order: {a} before {b}",
                self.name
            )));
        }
        Ok(())
    }
}
