use serde::{Deserialize, Serialize};

/// Privacy criteria a transformation must satisfy (spec.md section 4.6).
/// This is the plain configuration form; evaluation against an actual
/// equivalence class lives in `anonymizer_engine::criteria` since it
/// needs the class/global-distribution types the engine owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Criterion {
    KAnonymity {
        k: u64,
    },
    DistinctLDiversity {
        l: u64,
    },
    RecursiveCLDiversity {
        c: f64,
        l: u64,
    },
    EntropyLDiversity {
        l: u64,
    },
    TCloseness {
        t: f64,
        hierarchical: bool,
    },
}

impl Criterion {
    /// Human-readable name, used in tracing spans and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Criterion::KAnonymity { .. } => "k-anonymity",
            Criterion::DistinctLDiversity { .. } => "distinct-l-diversity",
            Criterion::RecursiveCLDiversity { .. } => "recursive-cl-diversity",
            Criterion::EntropyLDiversity { .. } => "entropy-l-diversity",
            Criterion::TCloseness { .. } => "t-closeness",
        }
    }
}
