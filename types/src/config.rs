use serde::{Deserialize, Serialize};

use crate::criteria::Criterion;
use crate::metric::Metric;
use crate::node::Level;

/// How the combined privacy model behaves along lattice ascents
/// (spec.md section 3, "Predictive Property").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Monotonicity {
    Full,
    Partial,
    None,
}

/// The external configuration input (spec.md section 6). This is a
/// plain struct, not a CLI argument parser: parsing a user-facing
/// command line is explicitly out of scope (spec.md section 1), while
/// validating *this* struct's invariants is an ambient concern the
/// engine always carries (see `anonymizer_engine::config::validate`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    pub allowed_outliers: f64,
    pub criteria: Vec<Criterion>,
    pub metric: Metric,
    pub monotonicity: Monotonicity,
    pub min_levels: Vec<Level>,
    pub max_levels: Vec<Level>,
    pub history_size: usize,
    pub snapshot_size_dataset: f64,
    pub snapshot_size_snapshot: f64,
    /// marker written into suppressed output cells; not consumed by the
    /// core itself (output rendering is an external collaborator) but
    /// carried through so a renderer downstream does not need its own
    /// copy of the configuration.
    pub suppression_marker: char,
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            allowed_outliers: 0.0,
            criteria: Vec::new(),
            metric: Metric::EntropyLoss,
            monotonicity: Monotonicity::Full,
            min_levels: Vec::new(),
            max_levels: Vec::new(),
            history_size: 200,
            snapshot_size_dataset: 0.2,
            snapshot_size_snapshot: 0.8,
            suppression_marker: '*',
        }
    }
}
