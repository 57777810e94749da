use serde::{Deserialize, Serialize};

/// Attacker model for the publisher-payout metric (spec.md GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackerModel {
    Prosecutor,
    Journalist,
}

/// Utility metric selection (spec.md section 4.7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Metric {
    /// `infoLoss(class) = log10(prod share) / log10(prod domain) + 1`
    EntropyLoss,
    /// Stackelberg publisher-payout game.
    PublisherPayout {
        attacker_model: AttackerModel,
        /// `maxPayout` in the spec.
        publisher_benefit: f64,
        /// `attackerPayout` in the spec.
        attacker_cost: f64,
        gs_factor: f64,
        /// Known sample-to-population ratio, used to estimate a class's
        /// population count under the journalist model when no `pcount`
        /// was supplied (spec.md section 7, Dankar et al. fallback chain).
        /// `None` means fall back directly to the prosecutor probability.
        sampling_fraction: Option<f64>,
    },
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::EntropyLoss => "entropy-loss",
            Metric::PublisherPayout { .. } => "publisher-payout",
        }
    }
}
