use serde::{Deserialize, Serialize};

use anonymizer_types::loss::InformationLoss;
use anonymizer_types::node::Transformation;

use crate::lattice::{Lattice, PredictiveProperty};

/// One row of the persisted-state format (spec.md section 6): a
/// transformation's verdict and loss, as previously computed by a
/// search run. `anonymous` is `None` when the source node was never
/// checked (present only to record a materialized-but-unchecked node).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedNode {
    pub transformation: Transformation,
    pub anonymous: Option<bool>,
    pub loss: Option<InformationLoss>,
}

/// Serializes every checked node in visitation order, grounded on the
/// teacher's use of `serde_json::to_writer` for whole-store persistence.
pub fn to_records(lattice: &Lattice) -> Vec<PersistedNode> {
    lattice
        .visited_order()
        .iter()
        .filter(|&&id| lattice.has_property(id, PredictiveProperty::Checked))
        .map(|&id| PersistedNode {
            transformation: lattice.decode(id),
            anonymous: Some(lattice.has_property(id, PredictiveProperty::Anonymous)),
            loss: lattice.loss(id),
        })
        .collect()
}

/// Re-applies `CHECKED`/`ANONYMOUS`/`NOT_ANONYMOUS`/loss onto the
/// matching nodes of `lattice`, skipping records whose transformation no
/// longer maps onto a legal node (e.g. after a `minLevels`/`maxLevels`
/// change between persistence and restore).
pub fn restore(lattice: &mut Lattice, records: &[PersistedNode]) {
    for record in records {
        if record.transformation.dimensions() != lattice.dimensions() {
            continue;
        }
        let id = lattice.encode(&record.transformation);
        lattice.mark_visited(id);
        lattice.put_property(id, PredictiveProperty::Checked);
        if let Some(loss) = record.loss {
            lattice.set_loss(id, loss);
        }
        if let Some(anonymous) = record.anonymous {
            lattice.put_property(
                id,
                if anonymous {
                    PredictiveProperty::Anonymous
                } else {
                    PredictiveProperty::NotAnonymous
                },
            );
        }
    }
}
