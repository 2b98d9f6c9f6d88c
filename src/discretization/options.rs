//! Generation options, loadable from partial JSON documents.

use crate::network_error::NetworkError;
use crate::topology::ids::BranchId;
use serde::{Deserialize, Serialize};

/// How fixed-length points are placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedLengthPolicy {
    /// Points at k × fixed length from the start of the branch.
    #[default]
    Multiples,
    /// Every gap between already accepted points that is longer than the
    /// fixed length is cut into `ceil(gap / fixed length)` equal parts.
    SubdivideSegments,
}

/// Per-branch discretization settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscretizationOptions {
    pub minimum_distance: f64,
    pub at_structures: bool,
    /// Offset of the points placed either side of a structure.
    pub structure_distance: f64,
    pub at_cross_sections: bool,
    pub at_laterals: bool,
    pub at_fixed_length: bool,
    pub fixed_length: f64,
    pub fixed_length_policy: FixedLengthPolicy,
}

impl Default for DiscretizationOptions {
    fn default() -> Self {
        Self {
            minimum_distance: 0.5,
            at_structures: false,
            structure_distance: 10.0,
            at_cross_sections: false,
            at_laterals: false,
            at_fixed_length: false,
            fixed_length: 100.0,
            fixed_length_policy: FixedLengthPolicy::Multiples,
        }
    }
}

impl DiscretizationOptions {
    pub fn with_minimum_distance(mut self, distance: f64) -> Self {
        self.minimum_distance = distance;
        self
    }

    /// Place points `distance` before and after every structure.
    pub fn with_structures(mut self, distance: f64) -> Self {
        self.at_structures = true;
        self.structure_distance = distance;
        self
    }

    pub fn with_cross_sections(mut self) -> Self {
        self.at_cross_sections = true;
        self
    }

    pub fn with_laterals(mut self) -> Self {
        self.at_laterals = true;
        self
    }

    pub fn with_fixed_length(mut self, length: f64, policy: FixedLengthPolicy) -> Self {
        self.at_fixed_length = true;
        self.fixed_length = length;
        self.fixed_length_policy = policy;
        self
    }

    /// Contract checks. Disabled sources are not checked.
    pub fn validate(&self) -> Result<(), NetworkError> {
        let min = NetworkError::check_finite("minimum distance", self.minimum_distance)?;
        if min < 0.0 {
            return Err(NetworkError::NegativeMinimumDistance(min));
        }
        if self.at_structures {
            let sd = NetworkError::check_finite("structure distance", self.structure_distance)?;
            if sd < 0.0 {
                return Err(NetworkError::NegativeStructureDistance(sd));
            }
        }
        if self.at_fixed_length
            && !(self.fixed_length.is_finite() && self.fixed_length > 0.0)
        {
            return Err(NetworkError::NonPositiveFixedLength(self.fixed_length));
        }
        Ok(())
    }
}

/// Settings for [`generate_network_discretization`](super::generate_network_discretization).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkGenerationOptions {
    #[serde(flatten)]
    pub branch: DiscretizationOptions,
    /// Regenerate channels that already carry more than one point.
    pub overwrite_existing: bool,
    /// Only clear the selected channels.
    pub erase_existing: bool,
    /// Channels to process; all channels when `None`.
    pub selected: Option<Vec<BranchId>>,
}

impl NetworkGenerationOptions {
    pub fn new(branch: DiscretizationOptions) -> Self {
        Self {
            branch,
            ..Self::default()
        }
    }

    pub fn overwrite(mut self) -> Self {
        self.overwrite_existing = true;
        self
    }

    pub fn erase(mut self) -> Self {
        self.erase_existing = true;
        self
    }

    pub fn select(mut self, branches: impl IntoIterator<Item = BranchId>) -> Self {
        self.selected = Some(branches.into_iter().collect());
        self
    }
}
