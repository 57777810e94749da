use serde::{Deserialize, Serialize};

/// A single non-negative real loss value (spec.md section 3,
/// "Information Loss"). Multi-dimensional metrics are not exercised by
/// the current metric set (entropy loss and publisher-payout both
/// reduce to a scalar), so a vector variant is not added speculatively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InformationLoss(pub f64);

impl InformationLoss {
    pub const ZERO: InformationLoss = InformationLoss(0.0);

    pub fn new(value: f64) -> Self {
        debug_assert!(value.is_finite() && value >= 0.0, "loss must be finite and non-negative");
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Monotone addition, used to accumulate per-class contributions
    /// into a node-level total.
    pub fn add(self, other: InformationLoss) -> InformationLoss {
        InformationLoss(self.0 + other.0)
    }
}

impl PartialOrd for InformationLoss {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl std::iter::Sum for InformationLoss {
    fn sum<I: Iterator<Item = InformationLoss>>(iter: I) -> Self {
        InformationLoss(iter.map(|l| l.0).sum())
    }
}
