use anonymizer_types::config::AnonymizationConfig;
use anonymizer_types::errors::CheckerError;
use anonymizer_types::loss::InformationLoss;
use anonymizer_types::node::{NodeId, Transformation};

use crate::criteria::evaluate_node;
use crate::data::DataView;
use crate::groupify::{ClassList, Groupifier};
use crate::hierarchy::GeneralizationHierarchy;
use crate::lattice::{Lattice, PredictiveProperty};
use crate::metric::loss_and_bound;
use crate::snapshot::{rederive, Snapshot, SnapshotCache};

/// Outcome of checking a single lattice node (spec.md section 4.8).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckResult {
    pub anonymous: bool,
    pub k_anonymous: bool,
    pub loss: InformationLoss,
    pub bound: InformationLoss,
}

/// Drives the six-step node-check flow of spec.md section 4.8: obtain a
/// class list (from a snapshot ancestor when one covers the node, else
/// fresh from the base data), evaluate privacy criteria, compute
/// loss/bound, tag predictive properties on the lattice, and offer the
/// class list to the snapshot cache for admission.
pub struct NodeChecker<'a> {
    data: &'a dyn DataView,
    hierarchies: &'a [GeneralizationHierarchy],
    config: &'a AnonymizationConfig,
    cache: SnapshotCache,
}

impl<'a> NodeChecker<'a> {
    pub fn new(
        data: &'a dyn DataView,
        hierarchies: &'a [GeneralizationHierarchy],
        config: &'a AnonymizationConfig,
    ) -> Self {
        Self {
            data,
            hierarchies,
            config,
            cache: SnapshotCache::new(
                config.history_size,
                config.snapshot_size_dataset,
                config.snapshot_size_snapshot,
            ),
        }
    }

    fn classes_for(&mut self, lattice: &Lattice, id: NodeId, t: &Transformation) -> (ClassList, Option<usize>) {
        if let Some(ancestor) = self.cache.best_ancestor(lattice, id) {
            let source_count = self.cache.get(ancestor).map(|snap| snap.classes.len());
            if let Some(snapshot) = self.cache.get(ancestor) {
                let snapshot = Snapshot {
                    transformation: snapshot.transformation.clone(),
                    classes: snapshot.classes.clone(),
                };
                return (rederive(&snapshot, t, self.hierarchies), source_count);
            }
        }
        (Groupifier::groupify(self.data, self.hierarchies, t), None)
    }

    /// Checks `id`, tagging the lattice with the resulting predictive
    /// properties and returning the node's verdict and utility scores.
    #[tracing::instrument(skip(self, lattice))]
    pub fn check(&mut self, lattice: &mut Lattice, id: NodeId) -> Result<CheckResult, CheckerError> {
        let t = lattice.decode(id);
        let (mut classes, source_class_count) = self.classes_for(lattice, id, &t);

        let (anonymous, k_anonymous) = evaluate_node(
            &mut classes,
            &self.config.criteria,
            self.config.allowed_outliers,
            self.data.rows(),
        );

        let (loss, bound) = loss_and_bound(&self.config.metric, &classes, self.hierarchies, &t)?;

        lattice.put_property(id, PredictiveProperty::Checked);
        lattice.put_property(
            id,
            if k_anonymous {
                PredictiveProperty::KAnonymous
            } else {
                PredictiveProperty::NotKAnonymous
            },
        );
        lattice.put_property(
            id,
            if anonymous {
                PredictiveProperty::Anonymous
            } else {
                PredictiveProperty::NotAnonymous
            },
        );
        lattice.set_loss(id, loss);
        lattice.set_bound(id, bound);

        self.cache
            .maybe_admit(id, &t, classes, self.data.rows(), source_class_count);

        Ok(CheckResult {
            anonymous,
            k_anonymous,
            loss,
            bound,
        })
    }
}
