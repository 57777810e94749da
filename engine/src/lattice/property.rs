/// Direction in which a predictive property transitively implies itself
/// across the lattice (spec.md section 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Every ancestor (more generalized node) implicitly has it too.
    Up,
    /// Every descendant (less generalized node) implicitly has it too.
    Down,
    /// Holds only for the node itself.
    None,
}

/// The predictive properties defined in spec.md section 3. Each variant
/// carries a fixed bit position and [`Direction`] used by the lattice's
/// property bitmap and transitive-implication tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PredictiveProperty {
    Checked = 0,
    Visited = 1,
    Expanded = 2,
    KAnonymous = 3,
    NotKAnonymous = 4,
    Anonymous = 5,
    NotAnonymous = 6,
    InsufficientUtility = 7,
    SuccessorsPruned = 8,
    ForceSnapshot = 9,
}

pub const NUM_PROPERTIES: usize = 10;

impl PredictiveProperty {
    pub const ALL: [PredictiveProperty; NUM_PROPERTIES] = [
        PredictiveProperty::Checked,
        PredictiveProperty::Visited,
        PredictiveProperty::Expanded,
        PredictiveProperty::KAnonymous,
        PredictiveProperty::NotKAnonymous,
        PredictiveProperty::Anonymous,
        PredictiveProperty::NotAnonymous,
        PredictiveProperty::InsufficientUtility,
        PredictiveProperty::SuccessorsPruned,
        PredictiveProperty::ForceSnapshot,
    ];

    pub fn bit(self) -> u16 {
        1 << (self as u8)
    }

    /// Direction for a fully monotonic privacy model. `ANONYMOUS`/
    /// `NOT_ANONYMOUS` only get a direction under full monotonicity
    /// (spec.md section 3); the caller downgrades them to `None` for
    /// `Partial`/`None` monotonicity configurations via
    /// [`PredictiveProperty::direction_for`].
    pub fn direction(self) -> Direction {
        match self {
            PredictiveProperty::KAnonymous => Direction::Up,
            PredictiveProperty::NotKAnonymous => Direction::Down,
            PredictiveProperty::Anonymous => Direction::Up,
            PredictiveProperty::NotAnonymous => Direction::Down,
            PredictiveProperty::InsufficientUtility => Direction::Up,
            PredictiveProperty::SuccessorsPruned => Direction::Up,
            PredictiveProperty::Checked
            | PredictiveProperty::Visited
            | PredictiveProperty::Expanded
            | PredictiveProperty::ForceSnapshot => Direction::None,
        }
    }

    /// Resolves direction taking the configured monotonicity of the
    /// aggregate privacy model into account (spec.md section 3: the
    /// `ANONYMOUS`/`NOT_ANONYMOUS` direction is model-dependent).
    pub fn direction_for(self, monotonicity: anonymizer_types::Monotonicity) -> Direction {
        use anonymizer_types::Monotonicity;
        match self {
            PredictiveProperty::Anonymous | PredictiveProperty::NotAnonymous => {
                match monotonicity {
                    Monotonicity::Full => self.direction(),
                    Monotonicity::Partial | Monotonicity::None => Direction::None,
                }
            }
            other => other.direction(),
        }
    }
}
