//! LocationRebaser: builds the [`RebasePlan`] for each kind of edit.
//!
//! The rebaser is long-lived (owned by the network) because it remembers,
//! per branch, how the last reversal mapped chainages. That record is only
//! valid while the branch keeps its length and is not split or merged, so
//! every other plan touching the branch drops it.

use super::plan::{ChainageMap, ChainageTransform, MirrorTable, RebasePlan};
use crate::topology::ids::BranchId;

#[derive(Clone, Debug)]
struct MirrorRecord {
    length_bits: u64,
    restore: MirrorTable,
}

#[derive(Clone, Debug, Default)]
pub struct LocationRebaser {
    mirrors: hashbrown::HashMap<BranchId, MirrorRecord>,
    /// Branch whose reversal record the pending plan will produce.
    pending_mirror: Option<(BranchId, u64)>,
}

impl LocationRebaser {
    pub fn new() -> Self {
        Self::default()
    }

    /// `branch` was cut at `at`; everything from `at` on moves to `new_branch`.
    pub fn plan_split(
        &mut self,
        branch: BranchId,
        new_branch: BranchId,
        at: f64,
        old_length: f64,
    ) -> RebasePlan {
        self.forget(&[branch, new_branch]);
        RebasePlan::new(vec![
            ChainageMap {
                source: branch,
                range: (at, old_length),
                target: new_branch,
                target_length: old_length - at,
                transform: ChainageTransform::Shift(-at),
            },
            ChainageMap {
                source: branch,
                range: (0.0, at),
                target: branch,
                target_length: at,
                transform: ChainageTransform::Identity,
            },
        ])
    }

    /// `downstream` was appended to `upstream` and removed.
    pub fn plan_merge(
        &mut self,
        upstream: BranchId,
        downstream: BranchId,
        upstream_length: f64,
        downstream_length: f64,
    ) -> RebasePlan {
        self.forget(&[upstream, downstream]);
        RebasePlan::new(vec![ChainageMap {
            source: downstream,
            range: (0.0, downstream_length),
            target: upstream,
            target_length: upstream_length + downstream_length,
            transform: ChainageTransform::Shift(upstream_length),
        }])
    }

    /// `branch` now runs the other way.
    pub fn plan_reverse(&mut self, branch: BranchId, length: f64) -> RebasePlan {
        let length_bits = length.to_bits();
        let restore = match self.mirrors.remove(&branch) {
            Some(record) if record.length_bits == length_bits => record.restore,
            _ => MirrorTable::new(),
        };
        self.pending_mirror = Some((branch, length_bits));
        RebasePlan::new(vec![ChainageMap {
            source: branch,
            range: (0.0, length),
            target: branch,
            target_length: length,
            transform: ChainageTransform::Mirror { length },
        }])
        .with_mirror_restore(restore)
    }

    /// The effective length of `branch` changed; positions scale along.
    pub fn plan_resize(&mut self, branch: BranchId, old_length: f64, new_length: f64) -> RebasePlan {
        self.forget(&[branch]);
        let transform = if old_length > 0.0 {
            ChainageTransform::Scale(new_length / old_length)
        } else {
            ChainageTransform::Identity
        };
        RebasePlan::new(vec![ChainageMap {
            source: branch,
            range: (0.0, old_length),
            target: branch,
            target_length: new_length,
            transform,
        }])
    }

    /// Called once every data set has applied `plan`.
    pub fn commit(&mut self, plan: &RebasePlan) {
        if let Some((branch, length_bits)) = self.pending_mirror.take() {
            self.mirrors.insert(
                branch,
                MirrorRecord {
                    length_bits,
                    restore: plan.take_mirror_record(),
                },
            );
        }
    }

    fn forget(&mut self, branches: &[BranchId]) {
        self.pending_mirror = None;
        for b in branches {
            self.mirrors.remove(b);
        }
    }
}
