//! Core of a data-anonymization engine: given a dictionary-encoded
//! tabular dataset annotated with quasi-identifying attributes, a
//! generalization hierarchy per attribute, a privacy configuration, and
//! a utility metric, searches the generalization lattice for a
//! transformation that satisfies every privacy predicate while
//! minimizing information loss.
//!
//! Input parsing, dictionary encoding, output rendering, and CLI/API
//! wrapping are external collaborators; this crate only defines the
//! interfaces it consumes from them (see [`data::DataView`]).

pub mod checker;
pub mod config;
pub mod criteria;
pub mod data;
pub mod groupify;
pub mod hierarchy;
pub mod lattice;
pub mod metric;
pub mod persistence;
pub mod search;
pub mod snapshot;

pub use checker::{CheckResult, NodeChecker};
pub use data::{DataView, VecDataView};
pub use groupify::{Groupifier, HashGroupifyEntry};
pub use hierarchy::GeneralizationHierarchy;
pub use lattice::{Lattice, PredictiveProperty};
pub use search::{FlashSearch, SearchOutcome};
pub use snapshot::SnapshotCache;

#[cfg(test)]
mod tests;
