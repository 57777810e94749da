use ahash::RandomState as AHashState;
use std::collections::HashMap;

use anonymizer_types::criteria::Criterion;
use anonymizer_types::node::DictCode;

use crate::groupify::{fixed_hash_map, ClassList, HashGroupifyEntry};

/// Aggregate per-sensitive-attribute value distribution over every class
/// in a node, used by t-closeness to compare a class's local distribution
/// against the dataset-wide one (spec.md section 4.6).
#[derive(Debug, Clone, Default)]
pub struct GlobalDistribution {
    per_attribute: Vec<HashMap<DictCode, u64, AHashState>>,
    totals: Vec<u64>,
}

impl GlobalDistribution {
    pub fn from_classes(classes: &ClassList, num_sensitive: usize) -> Self {
        let mut per_attribute: Vec<HashMap<DictCode, u64, AHashState>> =
            (0..num_sensitive).map(|_| fixed_hash_map()).collect();
        let mut totals = vec![0u64; num_sensitive];
        for class in classes.iter() {
            for slot in 0..num_sensitive {
                for (&value, &count) in &class.sensitive_distributions[slot] {
                    *per_attribute[slot].entry(value).or_insert(0) += count;
                    totals[slot] += count;
                }
            }
        }
        Self {
            per_attribute,
            totals,
        }
    }

    fn frequency(&self, slot: usize, value: DictCode) -> f64 {
        let total = self.totals[slot];
        if total == 0 {
            return 0.0;
        }
        *self.per_attribute[slot].get(&value).unwrap_or(&0) as f64 / total as f64
    }

    fn values(&self, slot: usize) -> impl Iterator<Item = DictCode> + '_ {
        self.per_attribute[slot].keys().copied()
    }
}

/// Small common interface for privacy criteria (spec.md section 9, design
/// notes: "tagged sums with a small common interface"). `slot` selects
/// which sensitive attribute (by index into `DataView::sensitive_indices`)
/// the criterion applies to.
pub trait CriterionEval {
    fn evaluate(&self, class: &HashGroupifyEntry, global: &GlobalDistribution, slot: usize) -> bool;
}

impl CriterionEval for Criterion {
    fn evaluate(&self, class: &HashGroupifyEntry, global: &GlobalDistribution, slot: usize) -> bool {
        match self {
            Criterion::KAnonymity { k } => class.count >= *k,
            Criterion::DistinctLDiversity { l } => class.distinct_sensitive_values(slot) as u64 >= *l,
            Criterion::RecursiveCLDiversity { c, l } => recursive_cl_diversity(class, slot, *c, *l),
            Criterion::EntropyLDiversity { l } => entropy_l_diversity(class, slot, *l),
            Criterion::TCloseness { t, hierarchical: _ } => {
                // The equal-distance and hierarchical variants share the
                // same ground distance here: spec.md section 3 only
                // defines generalization hierarchies for QI attributes,
                // not a distance model over sensitive values, so there is
                // no hierarchy to weight the hierarchical variant by.
                t_closeness(class, global, slot, *t)
            }
        }
    }
}

/// Standard recursive (c,l)-diversity: the most frequent value's count
/// must be less than `c` times the sum of the `l`-th through least
/// frequent counts. Fewer than `l` distinct values always fails, since
/// the tail sum would be empty.
fn recursive_cl_diversity(class: &HashGroupifyEntry, slot: usize, c: f64, l: u64) -> bool {
    let mut freqs: Vec<u64> = class.sensitive_distributions[slot].values().copied().collect();
    if (freqs.len() as u64) < l || l == 0 {
        return false;
    }
    freqs.sort_unstable_by(|a, b| b.cmp(a));
    let r1 = freqs[0] as f64;
    let tail: u64 = freqs[(l - 1) as usize..].iter().sum();
    r1 < c * tail as f64
}

fn entropy_l_diversity(class: &HashGroupifyEntry, slot: usize, l: u64) -> bool {
    let total: u64 = class.sensitive_distributions[slot].values().sum();
    if total == 0 {
        return false;
    }
    let entropy: f64 = class.sensitive_distributions[slot]
        .values()
        .map(|&count| {
            let p = count as f64 / total as f64;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .sum();
    entropy >= (l as f64).ln()
}

/// EMD between a class's sensitive-value distribution and the dataset-wide
/// one, using total variation distance as the ground distance over
/// unordered categorical values (spec.md section 4.6).
fn t_closeness(class: &HashGroupifyEntry, global: &GlobalDistribution, slot: usize, t: f64) -> bool {
    let class_total: u64 = class.sensitive_distributions[slot].values().sum();
    if class_total == 0 {
        return true;
    }
    let mut emd = 0.0;
    let mut seen: std::collections::HashSet<DictCode> = std::collections::HashSet::new();
    for (&value, &count) in &class.sensitive_distributions[slot] {
        let p = count as f64 / class_total as f64;
        let q = global.frequency(slot, value);
        emd += (p - q).abs();
        seen.insert(value);
    }
    for value in global.values(slot) {
        if !seen.contains(&value) {
            emd += global.frequency(slot, value);
        }
    }
    emd * 0.5 <= t
}

/// Combined privacy verdict for a node (spec.md section 4.6): every class
/// with `count > 0` must satisfy every criterion, and the total count of
/// rows in classes that fail (marked outliers) must not exceed
/// `allowedOutliers * rowCount`. k-anonymity's own verdict is tracked
/// separately so the checker can set `K_ANONYMOUS`/`NOT_K_ANONYMOUS`
/// independently of the aggregate `ANONYMOUS`/`NOT_ANONYMOUS` properties.
pub fn evaluate_node(
    classes: &mut ClassList,
    criteria: &[Criterion],
    allowed_outliers: f64,
    row_count: usize,
) -> (bool, bool) {
    let num_sensitive = classes
        .iter()
        .next()
        .map(|entry| entry.sensitive_distributions.len())
        .unwrap_or(0);
    let global = GlobalDistribution::from_classes(classes, num_sensitive);

    let mut k_anonymous = true;
    let mut outlier_rows: u64 = 0;
    for entry in classes.iter_mut() {
        if entry.count == 0 {
            continue;
        }
        let mut class_ok = true;
        for criterion in criteria {
            let ok = criterion.evaluate(entry, &global, 0);
            if matches!(criterion, Criterion::KAnonymity { .. }) && !ok {
                k_anonymous = false;
            }
            class_ok &= ok;
        }
        if !class_ok {
            entry.is_not_outlier = false;
            outlier_rows += entry.count;
        }
    }

    let outlier_budget = (allowed_outliers * row_count as f64).floor() as u64;
    let anonymous = outlier_rows <= outlier_budget;
    (anonymous, k_anonymous)
}
