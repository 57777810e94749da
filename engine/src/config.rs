use anonymizer_types::config::AnonymizationConfig;
use anonymizer_types::criteria::Criterion;
use anonymizer_types::errors::ConfigurationError;

use crate::data::DataView;
use crate::hierarchy::GeneralizationHierarchy;

/// Validates every invariant named in spec.md sections 4.8 and 7, fatal
/// and surfaced to the caller once, up front, before any lattice is built
/// (section 7: "a fatal error aborts the search; no partial result is
/// returned").
#[tracing::instrument(skip(config, data, hierarchies))]
pub fn validate(
    config: &AnonymizationConfig,
    data: &dyn DataView,
    hierarchies: &[GeneralizationHierarchy],
) -> Result<(), ConfigurationError> {
    let qi_count = data.qi_indices().len();
    if qi_count > 15 {
        return Err(ConfigurationError::TooManyQuasiIdentifiers { qi_count });
    }
    if !(0.0..1.0).contains(&config.allowed_outliers) {
        return Err(ConfigurationError::InvalidAllowedOutliers(config.allowed_outliers));
    }
    if !(config.snapshot_size_dataset > 0.0 && config.snapshot_size_dataset < 1.0) {
        return Err(ConfigurationError::InvalidSnapshotThreshold {
            name: "snapshotSizeDataset",
            value: config.snapshot_size_dataset,
        });
    }
    if !(config.snapshot_size_snapshot > 0.0 && config.snapshot_size_snapshot < 1.0) {
        return Err(ConfigurationError::InvalidSnapshotThreshold {
            name: "snapshotSizeSnapshot",
            value: config.snapshot_size_snapshot,
        });
    }

    for dim in 0..hierarchies.len() {
        let min = config.min_levels[dim];
        let max = config.max_levels[dim];
        if min > max {
            return Err(ConfigurationError::MinLevelExceedsMaxLevel {
                dim,
                min_level: min,
                max_level: max,
            });
        }
        let height = hierarchies[dim].height();
        if max > height - 1 {
            return Err(ConfigurationError::MaxLevelExceedsHeight {
                dim,
                max_level: max,
                height,
            });
        }
    }

    let row_count = data.rows();
    for criterion in &config.criteria {
        match criterion {
            Criterion::KAnonymity { k } => {
                if *k as usize > row_count {
                    return Err(ConfigurationError::KExceedsRowCount { k: *k, row_count });
                }
            }
            Criterion::DistinctLDiversity { l } | Criterion::EntropyLDiversity { l } => {
                if *l == 0 {
                    return Err(ConfigurationError::NonPositiveCriterionParameter {
                        criterion: criterion.name(),
                        value: *l as f64,
                    });
                }
            }
            Criterion::RecursiveCLDiversity { c, l } => {
                if *c <= 0.0 {
                    return Err(ConfigurationError::NonPositiveCriterionParameter {
                        criterion: criterion.name(),
                        value: *c,
                    });
                }
                if *l == 0 {
                    return Err(ConfigurationError::NonPositiveCriterionParameter {
                        criterion: criterion.name(),
                        value: *l as f64,
                    });
                }
            }
            Criterion::TCloseness { t, .. } => {
                if *t < 0.0 {
                    return Err(ConfigurationError::NonPositiveCriterionParameter {
                        criterion: criterion.name(),
                        value: *t,
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::VecDataView;
    use anonymizer_types::config::Monotonicity;
    use anonymizer_types::metric::Metric;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    fn base_config() -> AnonymizationConfig {
        AnonymizationConfig {
            allowed_outliers: 0.0,
            criteria: vec![Criterion::KAnonymity { k: 2 }],
            metric: Metric::EntropyLoss,
            monotonicity: Monotonicity::Full,
            min_levels: vec![0],
            max_levels: vec![1],
            history_size: 200,
            snapshot_size_dataset: 0.2,
            snapshot_size_snapshot: 0.8,
            suppression_marker: '*',
        }
    }

    fn single_hierarchy() -> GeneralizationHierarchy {
        let codes = array![[0u32, 0], [1, 0], [2, 1], [3, 1]];
        GeneralizationHierarchy::new(
            0,
            codes,
            vec![4, 2],
            array![[1.0, 0.5], [1.0, 0.5], [1.0, 0.5], [1.0, 0.5]],
        )
        .unwrap()
    }

    #[test]
    fn rejects_more_than_fifteen_quasi_identifiers() {
        // S6 from spec.md section 8: 16 QIs -> ConfigurationError before
        // any lattice is built.
        let config = base_config();
        let qi_indices: Vec<usize> = (0..16).collect();
        let data = VecDataView::new(1, 16, vec![0; 16], qi_indices, vec![]);
        let err = validate(&config, &data, &[]).unwrap_err();
        assert_eq!(err, ConfigurationError::TooManyQuasiIdentifiers { qi_count: 16 });
    }

    #[test]
    fn rejects_k_exceeding_row_count() {
        let mut config = base_config();
        config.criteria = vec![Criterion::KAnonymity { k: 10 }];
        let data = VecDataView::new(4, 1, vec![0, 1, 2, 3], vec![0], vec![]);
        let err = validate(&config, &data, &[single_hierarchy()]).unwrap_err();
        assert_eq!(err, ConfigurationError::KExceedsRowCount { k: 10, row_count: 4 });
    }

    #[test]
    fn rejects_out_of_range_allowed_outliers() {
        let mut config = base_config();
        config.allowed_outliers = 1.0;
        let data = VecDataView::new(4, 1, vec![0, 1, 2, 3], vec![0], vec![]);
        let err = validate(&config, &data, &[single_hierarchy()]).unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidAllowedOutliers(1.0));
    }

    #[test]
    fn rejects_zero_snapshot_thresholds() {
        let mut config = base_config();
        config.snapshot_size_dataset = 0.0;
        let data = VecDataView::new(4, 1, vec![0, 1, 2, 3], vec![0], vec![]);
        let err = validate(&config, &data, &[single_hierarchy()]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidSnapshotThreshold {
                name: "snapshotSizeDataset",
                value: 0.0,
            }
        );
    }

    #[test]
    fn accepts_well_formed_configuration() {
        let config = base_config();
        let data = VecDataView::new(4, 1, vec![0, 1, 2, 3], vec![0], vec![]);
        assert!(validate(&config, &data, &[single_hierarchy()]).is_ok());
    }
}
