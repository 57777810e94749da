use std::collections::HashMap;

use ahash::RandomState as AHashState;
use anonymizer_types::node::{DictCode, Transformation};
use once_cell::sync::Lazy;
use rayon::prelude::*;

use crate::data::DataView;
use crate::hierarchy::GeneralizationHierarchy;

/// Fixed-seed hasher state: spec.md section 4.4 requires the hash used
/// to build equivalence classes to be independent of OS ASLR so class
/// construction is reproducible across runs and across machines.
static FIXED_HASH_STATE: Lazy<AHashState> =
    Lazy::new(|| AHashState::with_seeds(0x5141_3e96_8d1c_90a7, 0x2b99_8c2a_f40d_713e, 1, 2));

pub(crate) fn fixed_hash_map<K: std::hash::Hash + Eq, V>() -> HashMap<K, V, AHashState> {
    HashMap::with_hasher(FIXED_HASH_STATE.clone())
}

/// Per-sensitive-attribute value -> count distribution, used by
/// l-diversity/t-closeness (spec.md section 3, "HashGroupifyEntry").
pub type Distribution = HashMap<DictCode, u64, AHashState>;

/// An equivalence class: rows sharing a generalized QI tuple (spec.md
/// GLOSSARY).
#[derive(Debug, Clone)]
pub struct HashGroupifyEntry {
    pub key: Vec<DictCode>,
    pub count: u64,
    /// Population count, for the journalist attacker model; `None` when
    /// no population table was supplied.
    pub pcount: Option<u64>,
    pub sensitive_distributions: Vec<Distribution>,
    pub is_not_outlier: bool,
}

impl HashGroupifyEntry {
    pub(crate) fn new(key: Vec<DictCode>, num_sensitive: usize) -> Self {
        Self {
            key,
            count: 0,
            pcount: None,
            sensitive_distributions: (0..num_sensitive).map(|_| fixed_hash_map()).collect(),
            is_not_outlier: true,
        }
    }

    /// Number of distinct values observed for a given sensitive
    /// attribute slot, used by distinct-l-diversity.
    pub fn distinct_sensitive_values(&self, slot: usize) -> usize {
        self.sensitive_distributions[slot].len()
    }
}

/// Ordered list of equivalence classes produced by groupification. Order
/// is first-seen (spec.md section 4.4): entries are appended to a `Vec`
/// in the order their key is first encountered, which is the idiomatic
/// equivalent of the source's next-pointer-threaded linked list and
/// gives the same reproducible insertion-order iteration.
#[derive(Debug, Clone, Default)]
pub struct ClassList {
    pub(crate) entries: Vec<HashGroupifyEntry>,
}

impl ClassList {
    pub fn iter(&self) -> impl Iterator<Item = &HashGroupifyEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut HashGroupifyEntry> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Looks up `key` in `index`, inserting a fresh entry if absent.
    /// Shared by the groupifier and by snapshot re-derivation so both
    /// build class lists the same way (spec.md sections 4.4, 4.5).
    pub(crate) fn get_or_create(
        &mut self,
        key: Vec<DictCode>,
        num_sensitive: usize,
        index: &mut HashMap<Vec<DictCode>, usize, AHashState>,
    ) -> usize {
        *index.entry(key.clone()).or_insert_with(|| {
            self.entries.push(HashGroupifyEntry::new(key, num_sensitive));
            self.entries.len() - 1
        })
    }

    fn merge_local(&mut self, other: ClassList) {
        let mut index: HashMap<Vec<DictCode>, usize, AHashState> = fixed_hash_map();
        for (i, entry) in self.entries.iter().enumerate() {
            index.insert(entry.key.clone(), i);
        }
        for entry in other.entries {
            if let Some(&i) = index.get(&entry.key) {
                let existing = &mut self.entries[i];
                existing.count += entry.count;
                for (slot, dist) in entry.sensitive_distributions.into_iter().enumerate() {
                    for (value, count) in dist {
                        *existing.sensitive_distributions[slot]
                            .entry(value)
                            .or_insert(0) += count;
                    }
                }
            } else {
                index.insert(entry.key.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }
}

/// Produces the equivalence-class partitioning for a transformation
/// (spec.md section 4.4). Reuses a preallocated key index across calls
/// is left to callers that want that optimization; the class list
/// itself is always rebuilt per node (sections 4.8/5).
pub struct Groupifier;

impl Groupifier {
    /// Sequential groupification, scanning the base data directly.
    #[tracing::instrument(skip(data, hierarchies))]
    pub fn groupify(
        data: &dyn DataView,
        hierarchies: &[GeneralizationHierarchy],
        t: &Transformation,
    ) -> ClassList {
        let qi = data.qi_indices();
        let sensitive = data.sensitive_indices();
        let mut index: HashMap<Vec<DictCode>, usize, AHashState> = fixed_hash_map();
        let mut list = ClassList::default();
        for row in 0..data.rows() {
            let key: Vec<DictCode> = qi
                .iter()
                .enumerate()
                .map(|(d, &col)| hierarchies[d].generalize(data.value(row, col), t[d]))
                .collect();
            let idx = *index.entry(key.clone()).or_insert_with(|| {
                list.entries.push(HashGroupifyEntry::new(key, sensitive.len()));
                list.entries.len() - 1
            });
            let entry = &mut list.entries[idx];
            entry.count += 1;
            for (slot, &col) in sensitive.iter().enumerate() {
                let value = data.value(row, col);
                *entry.sensitive_distributions[slot].entry(value).or_insert(0) += 1;
            }
        }
        list
    }

    /// Parallel row hashing (spec.md section 5): pins the global rayon
    /// pool to the available parallelism on first call, partitions rows
    /// into `anonymizer_utils::parallel::chunk_size`-sized chunks,
    /// groupifies each chunk independently, then merges chunk results
    /// sequentially in chunk order. Merge order is fixed, so the result
    /// is identical to [`Groupifier::groupify`]'s sequential baseline.
    #[tracing::instrument(skip(data, hierarchies))]
    pub fn groupify_parallel(
        data: &dyn DataView,
        hierarchies: &[GeneralizationHierarchy],
        t: &Transformation,
    ) -> ClassList {
        let rows = data.rows();
        if rows == 0 {
            return ClassList::default();
        }
        anonymizer_utils::parallel::init_threadpool(
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        );
        let chunk = anonymizer_utils::parallel::chunk_size(rows).max(1);
        let qi = data.qi_indices();
        let sensitive = data.sensitive_indices();

        let chunks: Vec<ClassList> = (0..rows)
            .step_by(chunk)
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|start| {
                let end = (start + chunk).min(rows);
                let mut index: HashMap<Vec<DictCode>, usize, AHashState> = fixed_hash_map();
                let mut list = ClassList::default();
                for row in start..end {
                    let key: Vec<DictCode> = qi
                        .iter()
                        .enumerate()
                        .map(|(d, &col)| hierarchies[d].generalize(data.value(row, col), t[d]))
                        .collect();
                    let idx = *index.entry(key.clone()).or_insert_with(|| {
                        list.entries.push(HashGroupifyEntry::new(key, sensitive.len()));
                        list.entries.len() - 1
                    });
                    let entry = &mut list.entries[idx];
                    entry.count += 1;
                    for (slot, &col) in sensitive.iter().enumerate() {
                        let value = data.value(row, col);
                        *entry.sensitive_distributions[slot].entry(value).or_insert(0) += 1;
                    }
                }
                list
            })
            .collect();

        let mut merged = ClassList::default();
        for chunk_list in chunks {
            merged.merge_local(chunk_list);
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::VecDataView;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    fn age_hierarchy() -> GeneralizationHierarchy {
        let codes = array![[0u32, 0], [1, 0], [2, 1], [3, 1]];
        GeneralizationHierarchy::new(
            0,
            codes,
            vec![4, 2],
            array![[1.0, 0.5], [1.0, 0.5], [1.0, 0.5], [1.0, 0.5]],
        )
        .unwrap()
    }

    fn four_row_view() -> VecDataView {
        // S1 from spec.md section 8: ages 25,26,51,52 -> leaf codes 0..3
        VecDataView::new(4, 1, vec![0, 1, 2, 3], vec![0], vec![])
    }

    #[test]
    fn identity_level_gives_four_singleton_classes() {
        let data = four_row_view();
        let hierarchies = vec![age_hierarchy()];
        let t = Transformation::new(vec![0]);
        let list = Groupifier::groupify(&data, &hierarchies, &t);
        assert_eq!(list.len(), 4);
        assert!(list.iter().all(|e| e.count == 1));
    }

    #[test]
    fn generalized_level_merges_into_two_classes_of_two() {
        let data = four_row_view();
        let hierarchies = vec![age_hierarchy()];
        let t = Transformation::new(vec![1]);
        let list = Groupifier::groupify(&data, &hierarchies, &t);
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|e| e.count == 2));
    }

    #[test]
    fn parallel_groupify_matches_sequential() {
        let data = four_row_view();
        let hierarchies = vec![age_hierarchy()];
        let t = Transformation::new(vec![1]);
        let sequential = Groupifier::groupify(&data, &hierarchies, &t);
        let parallel = Groupifier::groupify_parallel(&data, &hierarchies, &t);
        let mut seq_counts: Vec<(Vec<DictCode>, u64)> =
            sequential.iter().map(|e| (e.key.clone(), e.count)).collect();
        let mut par_counts: Vec<(Vec<DictCode>, u64)> =
            parallel.iter().map(|e| (e.key.clone(), e.count)).collect();
        seq_counts.sort();
        par_counts.sort();
        assert_eq!(seq_counts, par_counts);
    }
}
