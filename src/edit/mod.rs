//! Structural edits of the network: split, merge, reverse and length changes.
//!
//! Every edit runs as one transaction on the network's edit slot:
//! begin, mutate the graph, rebase the network's features and every
//! registered [`LocationAddressed`](crate::rebase::LocationAddressed) data
//! set, notify [`EditListener`]s, end. An edit that is not applicable
//! (splitting at a node, merging a junction) is rejected: nothing changes
//! and the result is `Ok(None)`.

pub mod editor;
mod merge;
mod reverse;
mod split;

pub use editor::BranchTopologyEditor;
pub use split::SplitAt;

use crate::network_error::NetworkError;
use crate::topology::ids::{BranchId, NodeId};
use std::fmt;

/// Record of one completed edit.
#[derive(Clone, Debug, PartialEq)]
pub enum EditAction {
    /// `split_branch` now ends at `new_node`; `new_branch` runs from there
    /// to the old target.
    Split {
        split_branch: BranchId,
        new_branch: BranchId,
        new_node: NodeId,
        chainage: f64,
    },
    /// `removed_branch` was appended to `upstream`; `removed_node` joined them.
    Merge {
        upstream: BranchId,
        removed_branch: BranchId,
        removed_node: NodeId,
    },
    Reverse {
        branch: BranchId,
    },
    /// The effective length of `branch` changed.
    Resize {
        branch: BranchId,
        old_length: f64,
        new_length: f64,
    },
}

impl EditAction {
    pub fn name(&self) -> &'static str {
        match self {
            EditAction::Split { .. } => "split",
            EditAction::Merge { .. } => "merge",
            EditAction::Reverse { .. } => "reverse",
            EditAction::Resize { .. } => "resize",
        }
    }

    /// Branches the action touched, removed ones included.
    pub fn branches(&self) -> Vec<BranchId> {
        match *self {
            EditAction::Split {
                split_branch,
                new_branch,
                ..
            } => vec![split_branch, new_branch],
            EditAction::Merge {
                upstream,
                removed_branch,
                ..
            } => vec![upstream, removed_branch],
            EditAction::Reverse { branch } | EditAction::Resize { branch, .. } => vec![branch],
        }
    }

    /// Node created by the action.
    pub fn new_node(&self) -> Option<NodeId> {
        match *self {
            EditAction::Split { new_node, .. } => Some(new_node),
            _ => None,
        }
    }
}

impl fmt::Display for EditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditAction::Split {
                split_branch,
                new_branch,
                new_node,
                chainage,
            } => write!(
                f,
                "split branch {split_branch} at {chainage} into {new_branch} (new node {new_node})"
            ),
            EditAction::Merge {
                upstream,
                removed_branch,
                removed_node,
            } => write!(
                f,
                "merged branch {removed_branch} into {upstream} at node {removed_node}"
            ),
            EditAction::Reverse { branch } => write!(f, "reversed branch {branch}"),
            EditAction::Resize {
                branch,
                old_length,
                new_length,
            } => write!(f, "resized branch {branch} from {old_length} to {new_length}"),
        }
    }
}

/// Result of an edit: `None` when it was rejected.
pub type EditOutcome = Result<Option<EditAction>, NetworkError>;

/// Observer of completed edits. Called once per edit, after every data set
/// has been rebased.
pub trait EditListener {
    fn edit_completed(&mut self, action: &EditAction);
}

impl<F: FnMut(&EditAction)> EditListener for F {
    fn edit_completed(&mut self, action: &EditAction) {
        self(action)
    }
}

