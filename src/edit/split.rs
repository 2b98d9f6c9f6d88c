use super::EditAction;
use crate::geometry::{Coordinate, LineGeometry};
use crate::network::HydroNetwork;
use crate::network_error::NetworkError;
use crate::rebase::RebasePlan;
use crate::topology::branch::Branch;
use crate::topology::ids::BranchId;
use crate::topology::node::Node;

/// Chainages this close to an end node count as "at the node".
pub(crate) const SPLIT_TOLERANCE: f64 = 1e-7;

/// Where to cut a branch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SplitAt {
    /// Chainage in effective-length units.
    Chainage(f64),
    /// A point, projected onto the branch line.
    Coordinate(Coordinate),
}

impl SplitAt {
    fn chainage_on(self, branch: &Branch) -> Result<f64, NetworkError> {
        match self {
            SplitAt::Chainage(c) => NetworkError::check_finite("split chainage", c),
            SplitAt::Coordinate(p) => {
                if !p.is_finite() {
                    return Err(NetworkError::NonFinite {
                        what: "split coordinate",
                        value: if p.x.is_finite() { p.y } else { p.x },
                    });
                }
                let distance = branch.geometry().distance_along(&p);
                Ok(branch.distance_to_chainage(distance))
            }
        }
    }
}

pub(super) fn split(
    network: &mut HydroNetwork,
    branch_id: BranchId,
    at: SplitAt,
) -> Result<Option<(EditAction, RebasePlan)>, NetworkError> {
    let node_name = format!("node{}", network.graph().node_count() + 1);
    let (graph, _, rebaser) = network.parts_mut();
    let branch = graph.try_branch(branch_id)?;
    let length = branch.effective_length();
    let chainage = at.chainage_on(branch)?;
    if chainage <= SPLIT_TOLERANCE || chainage >= length - SPLIT_TOLERANCE {
        log::warn!(
            "not splitting branch `{}` at chainage {chainage}: that is an end node (length {length})",
            branch.name
        );
        return Ok(None);
    }
    let Ok((head, tail)) = branch.geometry().split_at(branch.chainage_to_distance(chainage))
    else {
        log::warn!(
            "not splitting branch `{}`: its geometry cannot be cut at chainage {chainage}",
            branch.name
        );
        return Ok(None);
    };

    let source = branch.source();
    let target = branch.target();
    let custom = branch.is_length_custom();
    let name = branch.name.clone();
    let long_name = branch.long_name.clone();
    let kind = branch.kind;
    let order_number = branch.order_number;
    let split_point = head.end();

    let new_node = graph.next_node_id();
    graph.add_node(Node::new(new_node, node_name, split_point))?;

    let new_branch = graph.next_branch_id();
    let mut tail_branch =
        Branch::new(new_branch, format!("{name}_B"), new_node, target, tail).with_kind(kind);
    tail_branch.order_number = order_number;
    if !long_name.is_empty() {
        tail_branch.long_name = format!("{long_name}_B");
    }
    if custom {
        tail_branch.set_custom_length(Some(length - chainage))?;
    }
    graph.add_branch(tail_branch)?;

    let head_branch = graph.try_branch_mut(branch_id)?;
    head_branch.name = format!("{name}_A");
    if !long_name.is_empty() {
        head_branch.long_name = format!("{long_name}_A");
    }
    head_branch.set_geometry(head);
    if custom {
        head_branch.set_custom_length(Some(chainage))?;
    }
    graph.set_endpoints(branch_id, source, new_node)?;

    let plan = rebaser.plan_split(branch_id, new_branch, chainage, length);
    Ok(Some((
        EditAction::Split {
            split_branch: branch_id,
            new_branch,
            new_node,
            chainage,
        },
        plan,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::BranchTopologyEditor;
    use crate::features::BranchFeature;

    fn river() -> (HydroNetwork, BranchId) {
        let mut net =
            HydroNetwork::snake(&[Coordinate::new(0.0, 0.0), Coordinate::new(100.0, 0.0)]).unwrap();
        let b = net.graph().branches().next().unwrap().id();
        net.branch_mut(b).unwrap().long_name = "Meuse".into();
        net.branch_mut(b).unwrap().order_number = 2;
        (net, b)
    }

    #[test]
    fn split_renames_and_copies_order() {
        let (mut net, b) = river();
        let action = BranchTopologyEditor::new(&mut net)
            .split_branch(b, SplitAt::Chainage(40.0))
            .unwrap()
            .unwrap();
        let EditAction::Split {
            new_branch,
            new_node,
            ..
        } = action
        else {
            panic!("expected split, got {action:?}");
        };
        let a = net.branch(b).unwrap();
        let bb = net.branch(new_branch).unwrap();
        assert_eq!((a.name.as_str(), bb.name.as_str()), ("branch1_A", "branch1_B"));
        assert_eq!((a.long_name.as_str(), bb.long_name.as_str()), ("Meuse_A", "Meuse_B"));
        assert_eq!(bb.order_number, 2);
        assert_eq!(a.target(), new_node);
        assert_eq!(bb.source(), new_node);
        assert_eq!(a.effective_length(), 40.0);
        assert_eq!(bb.effective_length(), 60.0);
        assert_eq!(net.node(new_node).unwrap().location, Coordinate::new(40.0, 0.0));
    }

    #[test]
    fn empty_long_name_stays_empty() {
        let (mut net, b) = river();
        net.branch_mut(b).unwrap().long_name.clear();
        BranchTopologyEditor::new(&mut net)
            .split_branch(b, SplitAt::Chainage(50.0))
            .unwrap();
        assert!(net.graph().branches().all(|br| br.long_name.is_empty()));
    }

    #[test]
    fn custom_length_is_split_proportionally() {
        let (mut net, b) = river();
        net.set_branch_length(b, Some(200.0)).unwrap();
        let lat = net
            .add_branch_feature(b, BranchFeature::lateral_source("lat", 1.0), 150.0)
            .unwrap();
        let action = BranchTopologyEditor::new(&mut net)
            .split_branch(b, SplitAt::Chainage(50.0))
            .unwrap()
            .unwrap();
        let new_branch = action.branches()[1];
        assert_eq!(net.branch(b).unwrap().effective_length(), 50.0);
        assert_eq!(net.branch(new_branch).unwrap().effective_length(), 150.0);
        assert_eq!(net.branch(b).unwrap().geometry().length(), 25.0);
        let feature = net.features().get(lat).unwrap();
        assert_eq!(feature.branch(), Some(new_branch));
        assert_eq!(feature.chainage(), 100.0);
    }

    #[test]
    fn split_by_coordinate_projects() {
        let (mut net, b) = river();
        let action = BranchTopologyEditor::new(&mut net)
            .split_branch(b, SplitAt::Coordinate(Coordinate::new(30.0, 12.0)))
            .unwrap();
        assert!(matches!(action, Some(EditAction::Split { chainage, .. }) if chainage == 30.0));
    }

    #[test]
    fn split_at_end_nodes_is_rejected() {
        let (mut net, b) = river();
        for at in [0.0, 100.0, 1e-9, 100.0 - 1e-9] {
            let outcome = BranchTopologyEditor::new(&mut net)
                .split_branch(b, SplitAt::Chainage(at))
                .unwrap();
            assert_eq!(outcome, None);
        }
        assert_eq!(net.graph().channel_count(), 1);
        assert_eq!(net.branch(b).unwrap().name, "branch1");
    }
}
