/// Capability passed by reference into the search algorithm so it can
/// report progress without any global mutable listener (spec.md
/// section 9, design notes: "Global mutable listener pattern... replaced
/// by an explicit `ProgressSink` capability passed by reference").
pub trait ProgressSink {
    fn node_checked(&mut self, nodes_checked_so_far: u64) {
        let _ = nodes_checked_so_far;
    }

    fn solution_improved(&mut self, loss: f64) {
        let _ = loss;
    }
}

/// Default sink that discards every event; used when a caller has no
/// interest in progress reporting.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {}
