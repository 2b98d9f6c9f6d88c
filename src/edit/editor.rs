//! BranchTopologyEditor: transactional driver for structural edits.

use super::{EditAction, EditListener, EditOutcome, SplitAt, merge, reverse, split};
use crate::network::HydroNetwork;
use crate::network_error::NetworkError;
use crate::rebase::{LocationAddressed, RebasePlan};
use crate::topology::ids::{BranchId, NodeId};

/// Runs split, merge, reverse and length edits on a network, keeping the
/// network's features and every registered data set in step.
///
/// ```
/// use hydro_network::prelude::*;
///
/// let mut network = HydroNetwork::snake(&[
///     Coordinate::new(0.0, 0.0),
///     Coordinate::new(100.0, 0.0),
/// ])?;
/// let branch = network.graph().branches().next().map(|b| b.id()).unwrap();
/// let mut depth = NetworkCoverage::new("depth", 0.0);
/// depth.set_value(NetworkLocation::new(branch, 75.0), 2.5)?;
///
/// let action = BranchTopologyEditor::new(&mut network)
///     .with_data(&mut depth)
///     .split_branch(branch, SplitAt::Chainage(40.0))?;
/// assert!(matches!(action, Some(EditAction::Split { .. })));
/// assert_eq!(depth.locations()[0].chainage, 35.0);
/// # Ok::<(), NetworkError>(())
/// ```
pub struct BranchTopologyEditor<'a> {
    network: &'a mut HydroNetwork,
    data: Vec<&'a mut (dyn LocationAddressed + 'a)>,
    listeners: Vec<&'a mut (dyn EditListener + 'a)>,
}

impl<'a> BranchTopologyEditor<'a> {
    pub fn new(network: &'a mut HydroNetwork) -> Self {
        Self {
            network,
            data: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Register a data set to rebase after each edit.
    pub fn with_data(mut self, data: &'a mut (dyn LocationAddressed + 'a)) -> Self {
        self.data.push(data);
        self
    }

    pub fn with_listener(mut self, listener: &'a mut (dyn EditListener + 'a)) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn network(&self) -> &HydroNetwork {
        &*self.network
    }

    /// Open the network's edit slot. Fails while another edit is active.
    pub fn begin_edit(&mut self, action: &'static str) -> Result<(), NetworkError> {
        self.network.begin_edit(action)
    }

    pub fn end_edit(&mut self) -> Result<(), NetworkError> {
        self.network.end_edit()
    }

    /// Cut `branch` in two at `at`. Rejected at (or within tolerance of)
    /// either end node.
    pub fn split_branch(&mut self, branch: BranchId, at: SplitAt) -> EditOutcome {
        self.transaction("split branch", |n| split::split(n, branch, at))
    }

    /// Join the single incoming and single outgoing branch of `node`.
    /// Rejected for any other node.
    pub fn merge_at_node(&mut self, node: NodeId) -> EditOutcome {
        self.transaction("merge branches", |n| merge::merge(n, node))
    }

    /// Flip the direction of `branch`.
    pub fn reverse_branch(&mut self, branch: BranchId) -> EditOutcome {
        self.transaction("reverse branch", |n| reverse::reverse(n, branch))
    }

    /// Set (`Some`) or clear (`None`) the custom length of `branch`. Every
    /// location on it is rescaled to the new effective length.
    pub fn set_branch_length(&mut self, branch: BranchId, length: Option<f64>) -> EditOutcome {
        self.transaction("set branch length", |n| resize(n, branch, length))
    }

    /// `mutate` applies the edit and returns the action plus the plan for
    /// moving located data, or `None` when the edit is rejected.
    fn transaction<F>(&mut self, name: &'static str, mutate: F) -> EditOutcome
    where
        F: FnOnce(&mut HydroNetwork) -> Result<Option<(EditAction, RebasePlan)>, NetworkError>,
    {
        self.network.begin_edit(name)?;
        let outcome = self.apply(mutate);
        let ended = self.network.end_edit();
        let action = outcome?;
        ended?;
        Ok(action)
    }

    fn apply<F>(&mut self, mutate: F) -> EditOutcome
    where
        F: FnOnce(&mut HydroNetwork) -> Result<Option<(EditAction, RebasePlan)>, NetworkError>,
    {
        let Some((action, plan)) = mutate(&mut *self.network)? else {
            return Ok(None);
        };
        let (_, features, _) = self.network.parts_mut();
        features.rebase(&plan)?;
        for data in self.data.iter_mut() {
            data.rebase(&plan)?;
        }
        let (_, _, rebaser) = self.network.parts_mut();
        rebaser.commit(&plan);
        log::debug!("{action}");
        for listener in self.listeners.iter_mut() {
            listener.edit_completed(&action);
        }
        Ok(Some(action))
    }
}

fn resize(
    network: &mut HydroNetwork,
    branch: BranchId,
    length: Option<f64>,
) -> Result<Option<(EditAction, RebasePlan)>, NetworkError> {
    let (graph, _, rebaser) = network.parts_mut();
    let target = graph.try_branch_mut(branch)?;
    let old_length = target.effective_length();
    target.set_custom_length(length)?;
    let new_length = target.effective_length();
    let plan = rebaser.plan_resize(branch, old_length, new_length);
    Ok(Some((
        EditAction::Resize {
            branch,
            old_length,
            new_length,
        },
        plan,
    )))
}
