use super::EditAction;
use crate::geometry::LineGeometry;
use crate::network::HydroNetwork;
use crate::network_error::NetworkError;
use crate::rebase::RebasePlan;
use crate::topology::ids::BranchId;

pub(super) fn reverse(
    network: &mut HydroNetwork,
    branch: BranchId,
) -> Result<Option<(EditAction, RebasePlan)>, NetworkError> {
    let (graph, _, rebaser) = network.parts_mut();
    let current = graph.try_branch(branch)?;
    let length = current.effective_length();
    let (source, target) = (current.source(), current.target());
    let geometry = current.geometry().reversed();

    graph.try_branch_mut(branch)?.set_geometry(geometry);
    graph.set_endpoints(branch, target, source)?;

    let plan = rebaser.plan_reverse(branch, length);
    Ok(Some((EditAction::Reverse { branch }, plan)))
}
