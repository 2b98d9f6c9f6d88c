//! Network-wide grid operations.

use super::{Discretization, DiscretizationGenerator, NetworkGenerationOptions};
use crate::coverage::{LOCATION_TOLERANCE, NetworkLocation};
use crate::network::HydroNetwork;
use crate::network_error::NetworkError;
use crate::topology::ids::{BranchId, NodeId};

/// Generate points on the selected channels (all channels when none are
/// selected) and normalise the result. Returns the number of channels that
/// were regenerated.
///
/// A channel that already carries more than one point is left alone unless
/// `overwrite_existing` is set. With `erase_existing` a processed channel is
/// cleared instead of regenerated.
pub fn generate_network_discretization(
    network: &HydroNetwork,
    discretization: &mut Discretization,
    options: &NetworkGenerationOptions,
) -> Result<usize, NetworkError> {
    let generator = DiscretizationGenerator::new(network, &options.branch)?;
    let channels: Vec<BranchId> = match &options.selected {
        Some(selected) => {
            for &branch in selected {
                network.graph().try_branch(branch)?;
            }
            selected.clone()
        }
        None => network.graph().channels().map(|b| b.id()).collect(),
    };

    let mut generated = 0;
    for branch in channels {
        if discretization.locations_on(branch).len() > 1 && !options.overwrite_existing {
            log::debug!("keeping existing calculation points on branch {branch}");
            continue;
        }
        if options.erase_existing {
            discretization.clear_branch(branch);
            continue;
        }
        generator.generate(discretization, branch)?;
        generated += 1;
    }

    let all = discretization.locations().to_vec();
    discretization.update_network_locations(all, false)?;
    cleanup_locations_at_nodes(network, discretization)?;
    Ok(generated)
}

/// Where several branches meet, keep one point per node: the end point of
/// the first incoming branch, else the start point of the first outgoing
/// one. Returns the number of points removed.
pub fn cleanup_locations_at_nodes(
    network: &HydroNetwork,
    discretization: &mut Discretization,
) -> Result<usize, NetworkError> {
    let mut duplicates: Vec<NetworkLocation> = Vec::new();
    for node in network.graph().nodes() {
        let at_node = points_at_node(network, discretization, node.id());
        if at_node.len() <= 1 {
            continue;
        }
        duplicates.extend(at_node.into_iter().skip(1));
    }
    if duplicates.is_empty() {
        return Ok(0);
    }

    let kept: Vec<NetworkLocation> = discretization
        .locations()
        .iter()
        .filter(|l| !duplicates.iter().any(|d| d.total_cmp(l).is_eq()))
        .copied()
        .collect();
    discretization.update_network_locations(kept, false)?;
    Ok(duplicates.len())
}

/// End points of incoming branches, then start points of outgoing branches
/// of `node`, in incidence order.
fn points_at_node(
    network: &HydroNetwork,
    discretization: &Discretization,
    node: NodeId,
) -> Vec<NetworkLocation> {
    let graph = network.graph();
    let ends = graph.incoming(node).iter().filter_map(|&b| {
        let length = graph.branch(b)?.effective_length();
        discretization
            .locations_on(b)
            .last()
            .filter(|l| (l.chainage - length).abs() <= LOCATION_TOLERANCE)
            .copied()
    });
    let starts = graph.outgoing(node).iter().filter_map(|&b| {
        discretization
            .locations_on(b)
            .first()
            .filter(|l| l.chainage.abs() <= LOCATION_TOLERANCE)
            .copied()
    });
    ends.chain(starts).collect()
}

/// Drop the points of a branch that is about to be removed. Its node points
/// move to another branch at the same node (outgoing first) so the nodes
/// stay covered. Call before removing the branch from the network.
pub fn replace_points_for_removed_branch(
    network: &HydroNetwork,
    discretization: &mut Discretization,
    branch: BranchId,
) -> Result<(), NetworkError> {
    let graph = network.graph();
    let removed = graph.try_branch(branch)?;
    let length = removed.effective_length();
    let on_branch = discretization.locations_on(branch);

    let replacement_at = |node: NodeId| -> Option<NetworkLocation> {
        if let Some(&other) = graph.outgoing(node).iter().find(|&&b| b != branch) {
            return Some(NetworkLocation::new(other, 0.0));
        }
        let &other = graph.incoming(node).iter().find(|&&b| b != branch)?;
        let other_length = graph.branch(other)?.effective_length();
        Some(NetworkLocation::new(other, other_length))
    };

    let mut replacements = Vec::new();
    if on_branch
        .first()
        .is_some_and(|l| l.chainage.abs() <= LOCATION_TOLERANCE)
    {
        replacements.extend(replacement_at(removed.source()));
    }
    if on_branch
        .last()
        .is_some_and(|l| (l.chainage - length).abs() <= LOCATION_TOLERANCE)
    {
        replacements.extend(replacement_at(removed.target()));
    }

    discretization.clear_branch(branch);
    discretization.update_network_locations(replacements, true)
}

/// Replace the points of `branch` with the given chainages, clamped into
/// the branch. Fixed flags on the branch are cleared.
pub fn generate_from_chainages(
    network: &HydroNetwork,
    discretization: &mut Discretization,
    branch: BranchId,
    chainages: impl IntoIterator<Item = f64>,
) -> Result<(), NetworkError> {
    let channel = network.graph().try_branch(branch)?;
    let mut grid = chainages
        .into_iter()
        .map(|c| NetworkError::check_finite("grid chainage", c).map(|c| channel.clamp_chainage(c)))
        .collect::<Result<Vec<f64>, _>>()?;
    grid.sort_by(f64::total_cmp);
    grid.dedup_by(|next, kept| (*next - *kept).abs() <= LOCATION_TOLERANCE);
    discretization.replace_branch(branch, &grid, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::DiscretizationOptions;
    use crate::geometry::{Coordinate, LineString};
    use crate::topology::BranchKind;

    fn chain() -> (HydroNetwork, Vec<BranchId>) {
        let net = HydroNetwork::snake(&[
            Coordinate::new(0.0, 0.0),
            Coordinate::new(100.0, 0.0),
            Coordinate::new(150.0, 0.0),
        ])
        .unwrap();
        let branches = net.graph().branches().map(|b| b.id()).collect();
        (net, branches)
    }

    #[test]
    fn shared_node_keeps_one_point() {
        let (net, branches) = chain();
        let mut grid = Discretization::default();
        let options = NetworkGenerationOptions::new(DiscretizationOptions::default());
        assert_eq!(generate_network_discretization(&net, &mut grid, &options).unwrap(), 2);
        assert_eq!(grid.chainages_on(branches[0]), vec![0.0, 100.0]);
        assert_eq!(grid.chainages_on(branches[1]), vec![50.0]);
    }

    #[test]
    fn incoming_end_point_wins_over_lower_outgoing_id() {
        let mut net = HydroNetwork::new("reach");
        let a = net.add_node("a", Coordinate::new(0.0, 0.0)).unwrap();
        let m = net.add_node("m", Coordinate::new(50.0, 0.0)).unwrap();
        let c = net.add_node("c", Coordinate::new(100.0, 0.0)).unwrap();
        let line = |from: f64, to: f64| LineString::from_xy(&[(from, 0.0), (to, 0.0)]).unwrap();
        let down = net
            .connect("down", m, c, line(50.0, 100.0), BranchKind::Channel)
            .unwrap();
        let up = net
            .connect("up", a, m, line(0.0, 50.0), BranchKind::Channel)
            .unwrap();
        assert!(down < up);

        let mut grid = Discretization::default();
        let options = NetworkGenerationOptions::new(DiscretizationOptions::default());
        generate_network_discretization(&net, &mut grid, &options).unwrap();
        assert_eq!(grid.chainages_on(up), vec![0.0, 50.0]);
        assert_eq!(grid.chainages_on(down), vec![50.0]);
    }

    #[test]
    fn existing_points_are_kept_without_overwrite() {
        let (net, branches) = chain();
        let mut grid = Discretization::default();
        generate_from_chainages(&net, &mut grid, branches[0], [0.0, 30.0, 60.0, 100.0]).unwrap();
        let options = NetworkGenerationOptions::new(DiscretizationOptions::default())
            .select([branches[0]]);
        assert_eq!(generate_network_discretization(&net, &mut grid, &options).unwrap(), 0);
        assert_eq!(grid.locations_on(branches[0]).len(), 4);

        let options = options.overwrite();
        generate_network_discretization(&net, &mut grid, &options).unwrap();
        assert_eq!(grid.chainages_on(branches[0]), vec![0.0, 100.0]);
    }

    #[test]
    fn erase_clears_selected_channels() {
        let (net, branches) = chain();
        let mut grid = Discretization::default();
        let options = NetworkGenerationOptions::new(DiscretizationOptions::default());
        generate_network_discretization(&net, &mut grid, &options).unwrap();
        let erase = options.overwrite().erase().select([branches[1]]);
        assert_eq!(generate_network_discretization(&net, &mut grid, &erase).unwrap(), 0);
        assert!(grid.locations_on(branches[1]).is_empty());
        assert_eq!(grid.locations_on(branches[0]).len(), 2);
    }

    #[test]
    fn removed_branch_hands_node_points_on() {
        let (net, branches) = chain();
        let mut grid = Discretization::default();
        generate_from_chainages(&net, &mut grid, branches[0], [0.0, 50.0, 100.0]).unwrap();
        generate_from_chainages(&net, &mut grid, branches[1], [25.0]).unwrap();
        replace_points_for_removed_branch(&net, &mut grid, branches[0]).unwrap();
        assert!(grid.locations_on(branches[0]).is_empty());
        assert_eq!(grid.chainages_on(branches[1]), vec![0.0, 25.0]);
    }

    #[test]
    fn explicit_chainages_are_clamped_and_sorted() {
        let (net, branches) = chain();
        let mut grid = Discretization::default();
        generate_from_chainages(&net, &mut grid, branches[1], [40.0, -5.0, 80.0, 10.0]).unwrap();
        assert_eq!(grid.chainages_on(branches[1]), vec![0.0, 10.0, 40.0, 50.0]);
        assert!(
            generate_from_chainages(&net, &mut grid, branches[1], [f64::NAN]).is_err()
        );
    }
}
