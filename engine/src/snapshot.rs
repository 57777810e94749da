use ahash::RandomState as AHashState;
use std::collections::HashMap;

use anonymizer_types::node::{DictCode, NodeId, Transformation};

use crate::groupify::{fixed_hash_map, ClassList};
use crate::hierarchy::GeneralizationHierarchy;
use crate::lattice::Lattice;

/// A compact record of a previously-checked node's class list, sufficient
/// to reconstruct a descendant's class list without rescanning the base
/// data (spec.md section 4.5).
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub transformation: Transformation,
    pub classes: ClassList,
}

/// Re-derives a descendant's class list from `snapshot` by re-applying
/// the per-dimension generalization from the snapshot's level to the
/// target level for every class key, then re-hashing and summing counts
/// (spec.md section 4.5).
pub fn rederive(
    snapshot: &Snapshot,
    target: &Transformation,
    hierarchies: &[GeneralizationHierarchy],
) -> ClassList {
    let mut index: HashMap<Vec<DictCode>, usize, AHashState> = fixed_hash_map();
    let mut list = ClassList::default();
    for entry in snapshot.classes.iter() {
        let new_key: Vec<DictCode> = entry
            .key
            .iter()
            .enumerate()
            .map(|(d, &code)| {
                hierarchies[d].generalize_from_level(code, snapshot.transformation[d], target[d])
            })
            .collect();
        let num_sensitive = entry.sensitive_distributions.len();
        let idx = list.get_or_create(new_key, num_sensitive, &mut index);
        let merged = &mut list.entries[idx];
        merged.count += entry.count;
        if let Some(pc) = entry.pcount {
            merged.pcount = Some(merged.pcount.unwrap_or(0) + pc);
        }
        for (slot, dist) in entry.sensitive_distributions.iter().enumerate() {
            for (&value, &count) in dist {
                *merged.sensitive_distributions[slot].entry(value).or_insert(0) += count;
            }
        }
    }
    list
}

/// LRU-admitted store of prior groupifications, keyed by the checked
/// node's id (spec.md section 4.5). Bounded to `historySize` entries;
/// admission additionally requires the class-count ratio thresholds in
/// [`SnapshotCache::maybe_admit`].
pub struct SnapshotCache {
    history_size: usize,
    snapshot_size_dataset: f64,
    snapshot_size_snapshot: f64,
    /// Least-recently-used order, oldest first.
    order: Vec<NodeId>,
    entries: HashMap<NodeId, Snapshot, AHashState>,
}

impl SnapshotCache {
    pub fn new(history_size: usize, snapshot_size_dataset: f64, snapshot_size_snapshot: f64) -> Self {
        Self {
            history_size,
            snapshot_size_dataset,
            snapshot_size_snapshot,
            order: Vec::new(),
            entries: fixed_hash_map(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The cached node closest to (i.e. at the highest level below)
    /// `target` whose class list can be re-derived into `target`'s
    /// (spec.md section 4.5: `n'_d >= n_d` for every dimension).
    pub fn best_ancestor(&self, lattice: &Lattice, target: NodeId) -> Option<NodeId> {
        self.order
            .iter()
            .copied()
            .filter(|&candidate| lattice.is_parent_child_or_equal(target, candidate))
            .max_by_key(|&candidate| lattice.level(candidate))
    }

    pub fn get(&mut self, id: NodeId) -> Option<&Snapshot> {
        if self.entries.contains_key(&id) {
            self.touch(id);
        }
        self.entries.get(&id)
    }

    fn touch(&mut self, id: NodeId) {
        if let Some(pos) = self.order.iter().position(|&x| x == id) {
            let id = self.order.remove(pos);
            self.order.push(id);
        }
    }

    /// Admission policy (spec.md section 4.5, section 9 open question
    /// resolved as a conjunction: both thresholds must hold):
    /// `snapshotSizeDataset` bounds the class count relative to the row
    /// count, and `snapshotSizeSnapshot` additionally bounds it relative
    /// to the source snapshot's class count when this node was itself
    /// groupified from a snapshot (strict contraction). A node scanned
    /// fresh from the base data has no source snapshot to contract
    /// against, so only the dataset threshold applies.
    #[tracing::instrument(skip(self, classes))]
    pub fn maybe_admit(
        &mut self,
        id: NodeId,
        t: &Transformation,
        classes: ClassList,
        row_count: usize,
        source_class_count: Option<usize>,
    ) {
        if row_count == 0 {
            return;
        }
        let class_count = classes.len();
        let dataset_ok = class_count as f64 <= self.snapshot_size_dataset * row_count as f64;
        let snapshot_ok = match source_class_count {
            Some(source) if source > 0 => class_count as f64 <= self.snapshot_size_snapshot * source as f64,
            _ => true,
        };
        if !(dataset_ok && snapshot_ok) {
            tracing::debug!(?id, class_count, "snapshot admission rejected");
            return;
        }

        if self.entries.contains_key(&id) {
            self.touch(id);
        } else {
            if self.history_size == 0 {
                return;
            }
            if self.order.len() >= self.history_size {
                let evicted = self.order.remove(0);
                self.entries.remove(&evicted);
            }
            self.order.push(id);
        }
        self.entries.insert(
            id,
            Snapshot {
                transformation: t.clone(),
                classes,
            },
        );
    }
}
