//! Universal properties from spec.md section 8 that need more than one
//! module to exercise end to end. Properties 3 (encoding round-trip) and
//! 4 (predecessor/successor duality) are already covered directly against
//! `Lattice` in `lattice::mod::tests`; property 5 (snapshot equivalence)
//! against `snapshot::tests::rederive_matches_fresh_groupify`.

use ndarray::array;
use pretty_assertions::assert_eq;

use anonymizer_types::config::{AnonymizationConfig, Monotonicity};
use anonymizer_types::criteria::Criterion;
use anonymizer_types::metric::{AttackerModel, Metric};

use crate::checker::NodeChecker;
use crate::criteria::evaluate_node;
use crate::data::VecDataView;
use crate::groupify::Groupifier;
use crate::hierarchy::GeneralizationHierarchy;
use crate::lattice::Lattice;

fn two_dim_hierarchies() -> Vec<GeneralizationHierarchy> {
    let codes = array![[0u32, 0], [1, 0], [2, 1], [3, 1]];
    let share = array![[1.0, 0.5], [1.0, 0.5], [1.0, 0.5], [1.0, 0.5]];
    vec![
        GeneralizationHierarchy::new(0, codes.clone(), vec![4, 2], share.clone()).unwrap(),
        GeneralizationHierarchy::new(1, codes, vec![4, 2], share).unwrap(),
    ]
}

/// Property 1: if `check(a).k_anonymous` then `check(b).k_anonymous` for
/// every `b` reachable as a successor of `a`. Checked across every edge
/// of a small lattice rather than a single pair.
#[test]
fn property_1_k_anonymity_monotonic_along_every_edge() {
    let cells = vec![0u32, 0, 1, 1, 2, 2, 3, 3];
    let data = VecDataView::new(4, 2, cells, vec![0, 1], vec![]);
    let hierarchies = two_dim_hierarchies();
    let config = AnonymizationConfig {
        allowed_outliers: 0.0,
        criteria: vec![Criterion::KAnonymity { k: 2 }],
        metric: Metric::EntropyLoss,
        monotonicity: Monotonicity::Full,
        min_levels: vec![0, 0],
        max_levels: vec![1, 1],
        history_size: 200,
        snapshot_size_dataset: 1.0,
        snapshot_size_snapshot: 1.0,
        suppression_marker: '*',
    };
    let mut lattice = Lattice::new(config.min_levels.clone(), config.max_levels.clone(), config.monotonicity).unwrap();
    let mut checker = NodeChecker::new(&data, &hierarchies, &config);

    let mut k_anonymous_at = std::collections::HashMap::new();
    for id in lattice.enumerate_all() {
        let result = checker.check(&mut lattice, id).unwrap();
        k_anonymous_at.insert(id, result.k_anonymous);
    }
    for id in lattice.enumerate_all() {
        if k_anonymous_at[&id] {
            for succ in lattice.successors(id) {
                assert!(k_anonymous_at[&succ], "{succ} should inherit k-anonymity from {id}");
            }
        }
    }
}

/// Property 2: `bound <= realized_loss` for every checked node, under
/// both configured metrics.
#[test]
fn property_2_bound_never_exceeds_loss() {
    let cells = vec![0u32, 0, 1, 1, 2, 2, 3, 3];
    let data = VecDataView::new(4, 2, cells, vec![0, 1], vec![]);
    let hierarchies = two_dim_hierarchies();
    for metric in [
        Metric::EntropyLoss,
        Metric::PublisherPayout {
            attacker_model: AttackerModel::Prosecutor,
            publisher_benefit: 500.0,
            attacker_cost: 2.0,
            gs_factor: 0.3,
            sampling_fraction: None,
        },
    ] {
        let config = AnonymizationConfig {
            allowed_outliers: 0.0,
            criteria: vec![Criterion::KAnonymity { k: 2 }],
            metric,
            monotonicity: Monotonicity::Full,
            min_levels: vec![0, 0],
            max_levels: vec![1, 1],
            history_size: 200,
            snapshot_size_dataset: 1.0,
            snapshot_size_snapshot: 1.0,
            suppression_marker: '*',
        };
        let mut lattice = Lattice::new(config.min_levels.clone(), config.max_levels.clone(), config.monotonicity).unwrap();
        let mut checker = NodeChecker::new(&data, &hierarchies, &config);
        for id in lattice.enumerate_all() {
            let result = checker.check(&mut lattice, id).unwrap();
            assert!(result.bound <= result.loss);
        }
    }
}

/// Property 6: the sum of counts over outlier-marked classes never
/// exceeds `floor(allowedOutliers * rowCount)`.
#[test]
fn property_6_outlier_budget_is_respected() {
    let cells = vec![0u32, 0, 1, 1, 2, 2, 3, 3];
    let data = VecDataView::new(4, 2, cells, vec![0, 1], vec![]);
    let hierarchies = two_dim_hierarchies();
    let config = AnonymizationConfig {
        allowed_outliers: 0.5,
        criteria: vec![Criterion::KAnonymity { k: 4 }],
        metric: Metric::EntropyLoss,
        monotonicity: Monotonicity::Full,
        min_levels: vec![0, 0],
        max_levels: vec![1, 1],
        history_size: 200,
        snapshot_size_dataset: 1.0,
        snapshot_size_snapshot: 1.0,
        suppression_marker: '*',
    };
    let lattice = Lattice::new(config.min_levels.clone(), config.max_levels.clone(), config.monotonicity).unwrap();
    let budget = (config.allowed_outliers * data.rows() as f64).floor() as u64;

    for id in lattice.enumerate_all() {
        let t = lattice.decode(id);
        let mut classes = Groupifier::groupify(&data, &hierarchies, &t);
        evaluate_node(&mut classes, &config.criteria, config.allowed_outliers, data.rows());
        let outlier_rows: u64 = classes.iter().filter(|e| !e.is_not_outlier).map(|e| e.count).sum();
        assert!(outlier_rows <= budget, "node {t:?} exceeds outlier budget: {outlier_rows} > {budget}");
    }
}

/// Property 8: `bound` never decreases along any lattice edge, for
/// every metric — the invariant `INSUFFICIENT_UTILITY` UP-pruning in
/// `search.rs` relies on (see DESIGN.md's note on `EntropyLoss`'s bound).
#[test]
fn property_8_bound_is_monotone_along_every_edge() {
    let cells = vec![0u32, 0, 1, 1, 2, 2, 3, 3];
    let data = VecDataView::new(4, 2, cells, vec![0, 1], vec![]);
    let hierarchies = two_dim_hierarchies();
    for metric in [
        Metric::EntropyLoss,
        Metric::PublisherPayout {
            attacker_model: AttackerModel::Prosecutor,
            publisher_benefit: 500.0,
            attacker_cost: 2.0,
            gs_factor: 0.3,
            sampling_fraction: None,
        },
    ] {
        let config = AnonymizationConfig {
            allowed_outliers: 0.0,
            criteria: vec![Criterion::KAnonymity { k: 2 }],
            metric,
            monotonicity: Monotonicity::Full,
            min_levels: vec![0, 0],
            max_levels: vec![1, 1],
            history_size: 200,
            snapshot_size_dataset: 1.0,
            snapshot_size_snapshot: 1.0,
            suppression_marker: '*',
        };
        let mut lattice = Lattice::new(config.min_levels.clone(), config.max_levels.clone(), config.monotonicity).unwrap();
        let mut checker = NodeChecker::new(&data, &hierarchies, &config);

        let mut bound_at = std::collections::HashMap::new();
        for id in lattice.enumerate_all() {
            let result = checker.check(&mut lattice, id).unwrap();
            bound_at.insert(id, result.bound);
        }
        for id in lattice.enumerate_all() {
            for succ in lattice.successors(id) {
                assert!(
                    bound_at[&succ] >= bound_at[&id],
                    "{succ} should not have a smaller bound than {id}"
                );
            }
        }
    }
}

/// Property 7 (first clause): at `gsFactor=0.5`, no outliers, maximal
/// generalization, publisher-payout loss equals `rowCount * maxPayout`.
#[test]
fn property_7_publisher_payout_boundary_at_maximal_generalization() {
    let codes = array![[0u32, 0], [1, 0]];
    let hierarchies = vec![
        GeneralizationHierarchy::new(0, codes, vec![2, 1], array![[1.0, 0.5], [1.0, 0.5]]).unwrap(),
    ];
    let data = VecDataView::new(2, 1, vec![0, 1], vec![0], vec![]);
    let config = AnonymizationConfig {
        allowed_outliers: 0.0,
        criteria: vec![],
        metric: Metric::PublisherPayout {
            attacker_model: AttackerModel::Prosecutor,
            publisher_benefit: 1200.0,
            attacker_cost: 4.0,
            gs_factor: 0.5,
            sampling_fraction: None,
        },
        monotonicity: Monotonicity::Full,
        min_levels: vec![0],
        max_levels: vec![1],
        history_size: 200,
        snapshot_size_dataset: 1.0,
        snapshot_size_snapshot: 1.0,
        suppression_marker: '*',
    };
    let mut lattice = Lattice::new(config.min_levels.clone(), config.max_levels.clone(), config.monotonicity).unwrap();
    let mut checker = NodeChecker::new(&data, &hierarchies, &config);
    let top = lattice.top();
    let result = checker.check(&mut lattice, top).unwrap();
    assert!((result.loss.value() - 2.0 * 1200.0).abs() < 1e-6);
}
