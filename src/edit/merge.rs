use super::EditAction;
use crate::geometry::LineGeometry;
use crate::network::HydroNetwork;
use crate::network_error::NetworkError;
use crate::rebase::RebasePlan;
use crate::topology::ids::NodeId;

pub(super) fn merge(
    network: &mut HydroNetwork,
    node: NodeId,
) -> Result<Option<(EditAction, RebasePlan)>, NetworkError> {
    let (graph, _, rebaser) = network.parts_mut();
    if !graph.contains_node(node) {
        return Err(NetworkError::UnknownNode(node));
    }
    let incidence = graph.incidence_of(node);
    let (upstream, downstream) = match (incidence.incoming.as_slice(), incidence.outgoing.as_slice())
    {
        ([up], [down]) if up != down => (*up, *down),
        (incoming, outgoing) => {
            log::warn!(
                "not merging at node {node}: it has {} incoming and {} outgoing branches",
                incoming.len(),
                outgoing.len()
            );
            return Ok(None);
        }
    };

    let up = graph.try_branch(upstream)?;
    let down = graph.try_branch(downstream)?;
    let upstream_length = up.effective_length();
    let downstream_length = down.effective_length();
    let custom = up.is_length_custom() || down.is_length_custom();
    let geometry = up.geometry().concat(down.geometry())?;
    let source = up.source();
    let target = down.target();

    graph.remove_branch(downstream)?;
    let merged = graph.try_branch_mut(upstream)?;
    merged.set_geometry(geometry);
    if custom {
        merged.set_custom_length(Some(upstream_length + downstream_length))?;
    }
    graph.set_endpoints(upstream, source, target)?;
    graph.remove_node(node)?;

    let plan = rebaser.plan_merge(upstream, downstream, upstream_length, downstream_length);
    Ok(Some((
        EditAction::Merge {
            upstream,
            removed_branch: downstream,
            removed_node: node,
        },
        plan,
    )))
}
