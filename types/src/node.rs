use serde::{Deserialize, Serialize};

/// A dictionary-encoded cell value, as produced by the (external) input
/// encoding stage. Values are opaque beyond ordering and equality.
pub type DictCode = u32;

/// An index into a generalization hierarchy's levels, `0` being the
/// identity level.
pub type Level = u32;

/// Opaque, mixed-radix encoded identifier for a lattice node. Two
/// transformations compare equal iff their `Transformation` tuples are
/// equal, which the lattice guarantees by construction (section 8,
/// property 3: encoding round-trip).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in the generalization lattice: one level per QI attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transformation(pub Vec<Level>);

impl Transformation {
    pub fn new(levels: Vec<Level>) -> Self {
        Self(levels)
    }

    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    /// Sum of per-dimension levels (spec.md section 3, "Level of t").
    pub fn total_level(&self) -> u64 {
        self.0.iter().map(|&l| l as u64).sum()
    }

    pub fn get(&self, dim: usize) -> Level {
        self.0[dim]
    }
}

impl std::ops::Index<usize> for Transformation {
    type Output = Level;

    fn index(&self, dim: usize) -> &Level {
        &self.0[dim]
    }
}
