use thiserror::Error;

/// Fatal, surfaced-once-up-front configuration faults (spec.md section 7).
#[derive(Error, Debug, Eq, PartialEq)]
pub enum ConfigurationError {
    #[error("{qi_count} quasi-identifiers requested, at most 15 are supported")]
    TooManyQuasiIdentifiers { qi_count: usize },
    #[error("dimension {dim}: minLevel {min_level} exceeds maxLevel {max_level}")]
    MinLevelExceedsMaxLevel {
        dim: usize,
        min_level: u32,
        max_level: u32,
    },
    #[error("dimension {dim}: maxLevel {max_level} exceeds hierarchy height {height}")]
    MaxLevelExceedsHeight {
        dim: usize,
        max_level: u32,
        height: u32,
    },
    #[error("allowedOutliers must be in [0,1), got {0}")]
    InvalidAllowedOutliers(f64),
    #[error("k-anonymity requires k ({k}) <= row count ({row_count})")]
    KExceedsRowCount { k: u64, row_count: usize },
    #[error("criterion {criterion} has non-positive parameter {value}")]
    NonPositiveCriterionParameter { criterion: &'static str, value: f64 },
    #[error("snapshot admission threshold {name} must be in (0,1), got {value}")]
    InvalidSnapshotThreshold { name: &'static str, value: f64 },
    #[error("hierarchy for dimension {dim} is not monotonic at leaf {leaf}, level {level}")]
    NonMonotonicHierarchy { dim: usize, leaf: u32, level: u32 },
    #[error("hierarchy for dimension {dim} has zero height")]
    EmptyHierarchy { dim: usize },
}

/// Raised when an operation's precondition does not hold even though
/// its inputs are otherwise well-formed (spec.md section 7).
#[derive(Error, Debug, Eq, PartialEq)]
pub enum PreconditionError {
    #[error(
        "population-uniques requested for a class with no sample uniques (count={sample_count})"
    )]
    PopulationUniquesWithoutSampleUniques { sample_count: u64 },
}

/// Raised only when the Dankar et al. risk-model fallback chain
/// (Pitman -> Zayatz -> SNB) is exhausted without producing a finite
/// value (spec.md section 7). The chain itself is not an error path.
#[derive(Error, Debug, Eq, PartialEq)]
#[error("no risk model in the fallback chain produced a finite estimate")]
pub struct NumericFallbackError;

/// Errors surfaced from the node checker (spec.md section 4.8).
#[derive(Error, Debug)]
pub enum CheckerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    NumericFallback(#[from] NumericFallbackError),
}
