//! Validation predicates for cross-section definitions.
//!
//! None of these functions mutate anything or fail: a failed check is a
//! validation outcome for a reporting layer, not an error.

use super::definition::{CrossSectionDefinition, ProfileKind, StandardShape, ZwRow};
use crate::topology::branch::BranchKind;

/// Absolute tolerance for width comparisons.
pub const WIDTH_TOLERANCE: f64 = 1e-5;

/// Message reported when a shape is placed on a closed conduit that cannot
/// carry it.
pub const ENCLOSED_BRANCH_MESSAGE: &str = "Cross-sections on enclosed branches are not supported.";

/// Boolean verdict plus the message to show when it is negative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    /// Empty when `valid`.
    pub message: String,
}

impl ValidationOutcome {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Which profile kinds a closed conduit can carry.
pub trait ShapeCatalog {
    fn allows_enclosed(&self, kind: ProfileKind) -> bool;
}

/// Built-in catalog: only the closed parametric shapes fit in a conduit.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardShapeCatalog;

impl ShapeCatalog for StandardShapeCatalog {
    fn allows_enclosed(&self, kind: ProfileKind) -> bool {
        match kind {
            ProfileKind::Standard(shape) => match shape {
                StandardShape::Rectangle
                | StandardShape::Elliptical
                | StandardShape::Cunette
                | StandardShape::SteelCunette
                | StandardShape::Arch => true,
                StandardShape::Trapezium => false,
            },
            ProfileKind::Zw | ProfileKind::Yz | ProfileKind::Xyz => false,
        }
    }
}

/// The named section widths add up to the flow width.
///
/// Only the first three sections (main, flood plain 1, flood plain 2) take
/// part; a definition without sections is vacuously valid.
pub fn are_sections_equal_to_flow_width(def: &CrossSectionDefinition) -> bool {
    let sections = def.sections();
    if sections.is_empty() {
        return true;
    }
    let total: f64 = sections.iter().take(3).map(|s| s.width).sum();
    (total - def.flow_width()).abs() <= WIDTH_TOLERANCE
}

/// An empty inner flood plain cannot precede a non-empty outer one.
pub fn are_flood_plain_widths_valid(def: &CrossSectionDefinition) -> bool {
    let sections = def.sections();
    if sections.len() < 3 {
        return true;
    }
    let (fp1, fp2) = (sections[1].width, sections[2].width);
    !(fp1 == 0.0 && fp2 > 0.0)
}

/// Zero-width rows in a Z-W profile may only sit at its lowest or highest
/// level; when both extremes are zero at least one row must lie between.
pub fn is_flow_profile_valid(rows: &[ZwRow]) -> bool {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| a.z.total_cmp(&b.z));
    let last = sorted.len().saturating_sub(1);
    let zeros: Vec<usize> = sorted
        .iter()
        .enumerate()
        .filter(|(_, r)| r.total_width == 0.0)
        .map(|(i, _)| i)
        .collect();
    match zeros.as_slice() {
        [] => true,
        [i] => *i == 0 || *i == last,
        [lo, hi] => *lo == 0 && *hi == last && hi - lo > 1,
        _ => false,
    }
}

/// [`is_flow_profile_valid`] for a definition; profiles without a Z-W table
/// pass.
pub fn is_definition_flow_profile_valid(def: &CrossSectionDefinition) -> bool {
    def.zw_rows()
        .is_none_or(|rows| is_flow_profile_valid(&rows))
}

/// Whether `def` may be placed on a branch of `branch_kind`.
pub fn is_cross_section_allowed_on_branch(
    def: &CrossSectionDefinition,
    branch_kind: BranchKind,
) -> ValidationOutcome {
    is_cross_section_allowed_with(&StandardShapeCatalog, def, branch_kind)
}

/// Like [`is_cross_section_allowed_on_branch`] with a caller-supplied catalog.
pub fn is_cross_section_allowed_with<C: ShapeCatalog + ?Sized>(
    catalog: &C,
    def: &CrossSectionDefinition,
    branch_kind: BranchKind,
) -> ValidationOutcome {
    if !branch_kind.is_enclosed() || catalog.allows_enclosed(def.kind()) {
        ValidationOutcome::ok()
    } else {
        ValidationOutcome::rejected(ENCLOSED_BRANCH_MESSAGE)
    }
}
