//! NetworkGraph: arena of nodes and branches.
//!
//! Nodes and branches are stored by id. A branch refers to its end nodes by
//! [`NodeId`]; the reverse relation (which branches start or end at a node)
//! is derived from the branches and kept in a lazily built incidence index
//! that every structural mutation invalidates.
//!
//! # Invariants
//! - Every branch's source and target are present in the node arena.
//! - A node can only be removed once no branch references it.
//! - Ids are never reused within one graph.

use crate::debug_invariants::DebugInvariants;
use crate::network_error::NetworkError;
use crate::topology::branch::{Branch, BranchKind};
use crate::topology::cache::InvalidateCache;
use crate::topology::ids::{BranchId, IdAllocator, NodeId};
use crate::topology::node::Node;
use once_cell::unsync::OnceCell;
use std::collections::BTreeMap;

/// Branches meeting at one node, in branch-id order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Incidence {
    pub incoming: Vec<BranchId>,
    pub outgoing: Vec<BranchId>,
}

impl Incidence {
    /// Total number of incident branch ends.
    pub fn degree(&self) -> usize {
        self.incoming.len() + self.outgoing.len()
    }
}

/// Pure topological container of the network.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct NetworkGraph {
    nodes: BTreeMap<NodeId, Node>,
    branches: BTreeMap<BranchId, Branch>,
    node_ids: IdAllocator,
    branch_ids: IdAllocator,
    /// Monotonic version that changes on any structural modification.
    version: u64,
    #[serde(skip)]
    incidence: OnceCell<hashbrown::HashMap<NodeId, Incidence>>,
}

impl InvalidateCache for NetworkGraph {
    fn invalidate_cache(&mut self) {
        self.incidence.take();
    }
}

impl NetworkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh node id.
    pub fn next_node_id(&mut self) -> NodeId {
        loop {
            if let Ok(id) = NodeId::new(self.node_ids.next_raw()) {
                if !self.nodes.contains_key(&id) {
                    return id;
                }
            }
        }
    }

    /// Reserve a fresh branch id.
    pub fn next_branch_id(&mut self) -> BranchId {
        loop {
            if let Ok(id) = BranchId::new(self.branch_ids.next_raw()) {
                if !self.branches.contains_key(&id) {
                    return id;
                }
            }
        }
    }

    /// Add a node.
    ///
    /// # Errors
    /// `DuplicateNode` if the id is taken.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, NetworkError> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(NetworkError::DuplicateNode(id));
        }
        self.node_ids.observe(id.get());
        self.nodes.insert(id, node);
        self.touch();
        Ok(id)
    }

    /// Add a branch whose end nodes are already in the graph.
    ///
    /// # Errors
    /// `DuplicateBranch` if the id is taken, `UnknownNode` if an end node is missing.
    pub fn add_branch(&mut self, branch: Branch) -> Result<BranchId, NetworkError> {
        let id = branch.id();
        if self.branches.contains_key(&id) {
            return Err(NetworkError::DuplicateBranch(id));
        }
        for end in [branch.source(), branch.target()] {
            if !self.nodes.contains_key(&end) {
                return Err(NetworkError::UnknownNode(end));
            }
        }
        self.branch_ids.observe(id.get());
        self.branches.insert(id, branch);
        self.touch();
        Ok(id)
    }

    /// Detach and return a branch. Its end nodes stay in the graph.
    pub fn remove_branch(&mut self, id: BranchId) -> Result<Branch, NetworkError> {
        let branch = self
            .branches
            .remove(&id)
            .ok_or(NetworkError::UnknownBranch(id))?;
        self.touch();
        Ok(branch)
    }

    /// Remove a node that no branch references any more.
    ///
    /// # Errors
    /// `NodeStillConnected` while branches start or end at the node.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, NetworkError> {
        if !self.nodes.contains_key(&id) {
            return Err(NetworkError::UnknownNode(id));
        }
        let incident = self.incidence_of(id).degree();
        if incident > 0 {
            return Err(NetworkError::NodeStillConnected { node: id, incident });
        }
        let node = self
            .nodes
            .remove(&id)
            .ok_or(NetworkError::UnknownNode(id))?;
        self.touch();
        Ok(node)
    }

    /// Reconnect a branch. Both nodes must exist.
    pub fn set_endpoints(
        &mut self,
        id: BranchId,
        source: NodeId,
        target: NodeId,
    ) -> Result<(), NetworkError> {
        for end in [source, target] {
            if !self.nodes.contains_key(&end) {
                return Err(NetworkError::UnknownNode(end));
            }
        }
        let branch = self
            .branches
            .get_mut(&id)
            .ok_or(NetworkError::UnknownBranch(id))?;
        branch.source = source;
        branch.target = target;
        self.touch();
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches.get(&id)
    }

    /// Like [`branch`](Self::branch) but with an error for unknown ids.
    pub fn try_branch(&self, id: BranchId) -> Result<&Branch, NetworkError> {
        self.branches.get(&id).ok_or(NetworkError::UnknownBranch(id))
    }

    /// Mutable access to a branch's descriptive fields. Topology (end nodes)
    /// can only be changed through [`set_endpoints`](Self::set_endpoints).
    pub fn branch_mut(&mut self, id: BranchId) -> Option<&mut Branch> {
        self.branches.get_mut(&id)
    }

    pub(crate) fn try_branch_mut(&mut self, id: BranchId) -> Result<&mut Branch, NetworkError> {
        self.branches
            .get_mut(&id)
            .ok_or(NetworkError::UnknownBranch(id))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn contains_branch(&self, id: BranchId) -> bool {
        self.branches.contains_key(&id)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Branches in id order.
    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches.values()
    }

    /// Open channels in id order.
    pub fn channels(&self) -> impl Iterator<Item = &Branch> {
        self.branches
            .values()
            .filter(|b| b.kind == BranchKind::Channel)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels().count()
    }

    /// Monotonic version that changes whenever the topology changes.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Branches ending at `node`.
    pub fn incoming(&self, node: NodeId) -> &[BranchId] {
        self.incidence()
            .get(&node)
            .map_or(&[], |inc| inc.incoming.as_slice())
    }

    /// Branches starting at `node`.
    pub fn outgoing(&self, node: NodeId) -> &[BranchId] {
        self.incidence()
            .get(&node)
            .map_or(&[], |inc| inc.outgoing.as_slice())
    }

    /// Incoming and outgoing branches of `node`.
    pub fn incidence_of(&self, node: NodeId) -> Incidence {
        self.incidence().get(&node).cloned().unwrap_or_default()
    }

    /// `incoming + outgoing > 1`. A branch looping back onto the same node
    /// counts twice.
    pub fn is_connected_to_multiple_branches(&self, node: NodeId) -> bool {
        self.incidence()
            .get(&node)
            .is_some_and(|inc| inc.degree() > 1)
    }

    /// All branches touching `node`, incoming first, without duplicates.
    pub fn branches_at(&self, node: NodeId) -> Vec<BranchId> {
        let mut ids: Vec<BranchId> = self
            .incoming(node)
            .iter()
            .chain(self.outgoing(node))
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    fn incidence(&self) -> &hashbrown::HashMap<NodeId, Incidence> {
        self.incidence.get_or_init(|| {
            let mut map: hashbrown::HashMap<NodeId, Incidence> = hashbrown::HashMap::new();
            for branch in self.branches.values() {
                map.entry(branch.source())
                    .or_default()
                    .outgoing
                    .push(branch.id());
                map.entry(branch.target())
                    .or_default()
                    .incoming
                    .push(branch.id());
            }
            map
        })
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
        InvalidateCache::invalidate_cache(self);
        crate::debug_invariants!(self.validate_invariants(), "NetworkGraph");
    }
}

impl DebugInvariants for NetworkGraph {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "NetworkGraph");
    }

    fn validate_invariants(&self) -> Result<(), NetworkError> {
        for branch in self.branches.values() {
            for end in [branch.source(), branch.target()] {
                if !self.nodes.contains_key(&end) {
                    return Err(NetworkError::InvariantViolation(format!(
                        "branch {} references missing node {end}",
                        branch.id()
                    )));
                }
            }
            let length = branch.effective_length();
            if !length.is_finite() {
                return Err(NetworkError::NonFinite {
                    what: "branch length",
                    value: length,
                });
            }
        }
        Ok(())
    }
}
