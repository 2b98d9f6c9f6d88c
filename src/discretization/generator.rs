//! Per-branch calculation point generation.
//!
//! Points are built up in stages on a sorted chainage list that starts as
//! the branch ends plus the fixed points:
//!
//! 1. a point `structure_distance` before and after every structure;
//!    windows of neighbouring structures that come too close are centred
//!    between the two structures,
//! 2. cross sections and lateral sources, each only when it keeps the
//!    minimum distance to both neighbours,
//! 3. a spacing pass: non-fixed points closer than the minimum distance to
//!    a branch end or a fixed point are dropped, and neighbouring non-fixed
//!    points that are still too close merge into their midpoint,
//! 4. fixed-length points.
//!
//! Branch ends and fixed points are never moved or dropped.

use super::Discretization;
use super::options::{DiscretizationOptions, FixedLengthPolicy};
use crate::coverage::LOCATION_TOLERANCE;
use crate::features::BranchFeature;
use crate::features::composite::structure_chainages;
use crate::network::HydroNetwork;
use crate::network_error::NetworkError;
use crate::topology::branch::Branch;
use crate::topology::ids::BranchId;

/// A feature this close to a structure gets no point of its own.
const STRUCTURE_OVERLAP_TOLERANCE: f64 = 1e-7;

/// Generates the calculation points of single branches.
#[derive(Debug)]
pub struct DiscretizationGenerator<'a> {
    network: &'a HydroNetwork,
    options: &'a DiscretizationOptions,
}

impl<'a> DiscretizationGenerator<'a> {
    /// # Errors
    /// The options' contract checks, see [`DiscretizationOptions::validate`].
    pub fn new(
        network: &'a HydroNetwork,
        options: &'a DiscretizationOptions,
    ) -> Result<Self, NetworkError> {
        options.validate()?;
        Ok(Self { network, options })
    }

    pub fn options(&self) -> &DiscretizationOptions {
        self.options
    }

    /// Regenerate the points of `branch`, keeping its fixed points.
    pub fn generate(
        &self,
        discretization: &mut Discretization,
        branch: BranchId,
    ) -> Result<(), NetworkError> {
        let fixed = discretization.fixed_chainages_on(branch);
        let chainages = self.chainages(branch, &fixed)?;
        log::debug!(
            "generated {} calculation points on branch {branch} ({} fixed)",
            chainages.len(),
            fixed.len()
        );
        discretization.replace_branch(branch, &chainages, &fixed)
    }

    /// Sorted chainages for `branch` given the chainages of its fixed points.
    pub fn chainages(&self, branch: BranchId, fixed: &[f64]) -> Result<Vec<f64>, NetworkError> {
        let channel = self.network.graph().try_branch(branch)?;
        let length = channel.effective_length();
        let min = self.options.minimum_distance;

        let mut protected = vec![0.0, length];
        for &f in fixed {
            protected.push(channel.clamp_chainage(NetworkError::check_finite("fixed point", f)?));
        }
        let mut grid = protected.clone();
        normalize(&mut grid);

        let features = self.network.features();
        if self.options.at_structures {
            let structures = structure_chainages(features, branch);
            add_structure_windows(&mut grid, &structures, min, self.options.structure_distance);
        }

        let structures: Vec<f64> = features.structures_on(branch).map(BranchFeature::chainage).collect();
        if self.options.at_cross_sections {
            let points = features
                .cross_sections_on(branch)
                .filter(|f| !overlaps_structure(channel, f, &structures))
                .map(|f| (f.name.as_str(), f.chainage()));
            add_feature_points(&mut grid, channel, "cross section", points, min);
        }
        if self.options.at_laterals {
            let points = features
                .laterals_on(branch)
                .filter(|f| !overlaps_structure(channel, f, &structures))
                .map(|f| (f.name.as_str(), f.chainage()));
            add_feature_points(&mut grid, channel, "lateral source", points, min);
        }
        enforce_spacing(&mut grid, &protected, min);

        if self.options.at_fixed_length {
            let step = self.options.fixed_length;
            match self.options.fixed_length_policy {
                FixedLengthPolicy::Multiples => {
                    let multiples = (1..)
                        .map(|k| k as f64 * step)
                        .take_while(|c| *c < length - LOCATION_TOLERANCE)
                        .map(|c| ("fixed length", c));
                    add_feature_points(&mut grid, channel, "grid point", multiples, min);
                }
                FixedLengthPolicy::SubdivideSegments => subdivide(&mut grid, step, min),
            }
        }

        normalize(&mut grid);
        Ok(grid)
    }
}

fn normalize(grid: &mut Vec<f64>) {
    grid.sort_by(f64::total_cmp);
    grid.dedup_by(|next, kept| (*next - *kept).abs() <= LOCATION_TOLERANCE);
}

fn overlaps_structure(channel: &Branch, feature: &BranchFeature, structures: &[f64]) -> bool {
    let c = feature.chainage();
    let overlaps = structures
        .iter()
        .any(|s| (s - c).abs() < STRUCTURE_OVERLAP_TOLERANCE);
    if overlaps {
        log::info!(
            "no grid point generated for {} {}:{} at {c:.2}: it would overlap with a structure",
            feature.kind.label(),
            feature.name,
            channel.name
        );
    }
    overlaps
}

/// Windows around structures. `structures` must be sorted. `previous`
/// tracks the last accepted point left of the current structure and whether
/// it is itself a window point, which may still be centred.
fn add_structure_windows(grid: &mut Vec<f64>, structures: &[f64], min: f64, step: f64) {
    let mut windows: Vec<f64> = Vec::new();
    let mut previous = 0.0;
    let mut previous_is_window = false;
    let mut next = 0;

    for &structure in structures {
        while next < grid.len() && grid[next] < structure {
            previous = grid[next];
            previous_is_window = false;
            next += 1;
        }

        let before = structure - step;
        if before - previous >= min {
            windows.push(before);
            previous = before;
            previous_is_window = true;
        } else if previous_is_window {
            if let Some(last) = windows.last_mut() {
                *last = (before + previous) / 2.0;
                previous = *last;
            }
        } else {
            log::warn!(
                "no grid point generated before structure at {structure:.2}: too close to point at {previous:.2}"
            );
        }

        let after = structure + step;
        if after - previous < min {
            continue;
        }
        match grid.get(next) {
            Some(&following) if following - after >= min => {
                windows.push(after);
                previous = after;
                previous_is_window = true;
            }
            Some(&following) => log::warn!(
                "no grid point generated after structure at {structure:.2}: too close to point at {following:.2}"
            ),
            None => {}
        }
    }

    grid.extend(windows);
    normalize(grid);
}

/// Drop non-fixed points within `min` of a protected point (branch end or
/// fixed point), then merge each remaining pair of non-fixed neighbours
/// closer than `min` into its midpoint. `grid` must be sorted.
fn enforce_spacing(grid: &mut Vec<f64>, protected: &[f64], min: f64) {
    if min <= 0.0 {
        return;
    }
    let mut kept: Vec<(f64, bool)> = Vec::with_capacity(grid.len());
    for &c in grid.iter() {
        if protected.iter().any(|p| (p - c).abs() <= LOCATION_TOLERANCE) {
            kept.push((c, true));
            continue;
        }
        if let Some(p) = protected.iter().find(|&&p| (p - c).abs() < min) {
            log::debug!("grid point at {c:.2} dropped: within minimum distance of point at {p:.2}");
            continue;
        }
        match kept.last_mut() {
            Some((last, false)) if c - *last < min => {
                log::debug!("grid points at {last:.2} and {c:.2} merged");
                *last = (*last + c) / 2.0;
            }
            _ => kept.push((c, false)),
        }
    }
    grid.clear();
    grid.extend(kept.into_iter().map(|(c, _)| c));
}

/// Insert each point that keeps `min` to both neighbours; warn about the rest.
fn add_feature_points<'n>(
    grid: &mut Vec<f64>,
    channel: &Branch,
    label: &str,
    points: impl Iterator<Item = (&'n str, f64)>,
    min: f64,
) {
    let mut points: Vec<(&str, f64)> = points.collect();
    points.sort_by(|a, b| a.1.total_cmp(&b.1));

    for (name, c) in points {
        let at = grid.partition_point(|&g| g < c);
        let previous = at.checked_sub(1).map_or(0.0, |i| grid[i]);
        let too_close = if c - previous < min {
            Some(previous)
        } else {
            grid.get(at).copied().filter(|&following| following - c < min)
        };
        match too_close {
            Some(neighbour) => log::warn!(
                "no grid point generated for {label} {name}:{} at {c:.2}: too close to point at {neighbour:.2}",
                channel.name
            ),
            None => grid.insert(at, c),
        }
    }
}

/// Cut every gap longer than `step` into equal parts, never shorter than
/// `min`.
fn subdivide(grid: &mut Vec<f64>, step: f64, min: f64) {
    let mut extra = Vec::new();
    for pair in grid.windows(2) {
        let gap = pair[1] - pair[0];
        if gap <= step {
            continue;
        }
        let mut parts = (gap / step).ceil() as usize;
        if min > 0.0 {
            parts = parts.min((gap / min).floor() as usize);
        }
        extra.extend((1..parts).map(|j| pair[0] + j as f64 * gap / parts as f64));
    }
    grid.extend(extra);
    normalize(grid);
}
