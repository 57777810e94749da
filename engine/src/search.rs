use std::cmp::Ordering;

use anonymizer_types::errors::CheckerError;
use anonymizer_types::node::NodeId;
use anonymizer_utils::progress::ProgressSink;

use crate::checker::{CheckResult, NodeChecker};
use crate::hierarchy::GeneralizationHierarchy;
use crate::lattice::{Lattice, PredictiveProperty};

/// Result of a full FLASH run (spec.md section 4.9): the best anonymous
/// node found, if any, and how many nodes were actually checked (as
/// opposed to pruned or skipped on inherited properties).
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best: Option<(NodeId, CheckResult)>,
    pub nodes_checked: u64,
}

/// `Σ heightShare_d(ℓ_d)` ascending, tie-broken by total level then by
/// node id so the ordering is a pure function of the lattice and
/// hierarchies (spec.md section 4.9: "no hash-set iteration order
/// leakage").
fn priority_key(lattice: &Lattice, hierarchies: &[GeneralizationHierarchy], id: NodeId) -> (f64, u64) {
    let t = lattice.decode(id);
    let height_share: f64 = (0..t.dimensions())
        .map(|d| {
            let height = hierarchies[d].height();
            if height > 1 {
                t[d] as f64 / (height - 1) as f64
            } else {
                0.0
            }
        })
        .sum();
    (height_share, lattice.level(id))
}

fn cmp_priority(lattice: &Lattice, hierarchies: &[GeneralizationHierarchy], a: NodeId, b: NodeId) -> Ordering {
    let (ha, la) = priority_key(lattice, hierarchies, a);
    let (hb, lb) = priority_key(lattice, hierarchies, b);
    ha.partial_cmp(&hb)
        .unwrap_or(Ordering::Equal)
        .then(la.cmp(&lb))
        .then(a.cmp(&b))
}

fn enqueue_successors(lattice: &Lattice, frontier: &mut Vec<NodeId>, id: NodeId) {
    for succ in lattice.successors(id) {
        if !lattice.has_property(succ, PredictiveProperty::Visited) {
            frontier.push(succ);
        }
    }
}

/// Best-first search over the generalization lattice (spec.md section
/// 4.9). A single ordered frontier realizes both named phases: early on,
/// the ascending heuristic drives a path from `bottom` toward `top`
/// that locates the anonymous/not-anonymous boundary (phase a); once an
/// anonymous node is found, its loss bounds prune the remaining cones
/// (phase b), so the same loop refines toward the minimum-loss solution
/// without a separate pass.
pub struct FlashSearch;

impl FlashSearch {
    #[tracing::instrument(skip(lattice, checker, hierarchies, progress))]
    pub fn run(
        lattice: &mut Lattice,
        checker: &mut NodeChecker,
        hierarchies: &[GeneralizationHierarchy],
        progress: &mut dyn ProgressSink,
    ) -> Result<SearchOutcome, CheckerError> {
        let mut frontier = vec![lattice.bottom()];
        let mut best: Option<(NodeId, CheckResult)> = None;
        let mut checked = 0u64;

        while !frontier.is_empty() {
            let idx = frontier
                .iter()
                .enumerate()
                .min_by(|&(_, &a), &(_, &b)| cmp_priority(lattice, hierarchies, a, b))
                .map(|(i, _)| i)
                .expect("frontier is non-empty");
            let id = frontier.remove(idx);

            if lattice.has_property(id, PredictiveProperty::Visited) {
                continue;
            }
            lattice.mark_visited(id);

            if lattice.has_property(id, PredictiveProperty::NotKAnonymous) {
                tracing::debug!(?id, "skipping node, not-k-anonymous inherited");
                enqueue_successors(lattice, &mut frontier, id);
                continue;
            }
            if lattice.has_property(id, PredictiveProperty::InsufficientUtility) {
                tracing::debug!(?id, "pruning whole cone, insufficient utility inherited");
                continue;
            }

            let result = checker.check(lattice, id)?;
            checked += 1;
            progress.node_checked(checked);

            if let Some((_, best_result)) = &best {
                if result.bound >= best_result.loss {
                    lattice.put_property(id, PredictiveProperty::InsufficientUtility);
                    continue;
                }
            }

            if result.anonymous {
                let improves = best.as_ref().map_or(true, |(_, b)| result.loss < b.loss);
                if improves {
                    best = Some((id, result));
                    progress.solution_improved(result.loss.value());
                }
            }

            lattice.put_property(id, PredictiveProperty::Expanded);
            enqueue_successors(lattice, &mut frontier, id);
        }

        Ok(SearchOutcome { best, nodes_checked: checked })
    }
}
