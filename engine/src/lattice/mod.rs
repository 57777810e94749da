mod property;

pub use property::{Direction, PredictiveProperty, NUM_PROPERTIES};

use anonymizer_types::errors::ConfigurationError;
use anonymizer_types::loss::InformationLoss;
use anonymizer_types::node::{Level, NodeId, Transformation};
use anonymizer_types::Monotonicity;

/// The solution-space lattice (spec.md section 4.3): a product lattice
/// over per-attribute generalization levels, encoded as mixed-radix
/// 64-bit node identifiers, with monotonic predictive-property
/// propagation and O(1) property lookups.
///
/// Properties are tagged *eagerly*: when [`Lattice::put_property`] sets
/// a directional property on a node, the implied ancestors/descendants
/// are marked immediately (the technique the FLASH algorithm this
/// engine implements relies on for O(1) pruning checks during search).
/// `has_property` therefore only ever inspects the node's own bitmap.
pub struct Lattice {
    min_levels: Vec<Level>,
    max_levels: Vec<Level>,
    radix: Vec<u64>,
    multiplier: Vec<u64>,
    num_nodes: u64,
    monotonicity: Monotonicity,
    properties: Vec<u16>,
    loss: Vec<Option<InformationLoss>>,
    bound: Vec<Option<InformationLoss>>,
    visited_order: Vec<NodeId>,
}

impl Lattice {
    pub fn new(
        min_levels: Vec<Level>,
        max_levels: Vec<Level>,
        monotonicity: Monotonicity,
    ) -> Result<Self, ConfigurationError> {
        assert_eq!(
            min_levels.len(),
            max_levels.len(),
            "minLevels and maxLevels must have one entry per QI dimension"
        );
        let dims = min_levels.len();
        if dims > 15 {
            return Err(ConfigurationError::TooManyQuasiIdentifiers { qi_count: dims });
        }
        let mut radix = Vec::with_capacity(dims);
        for d in 0..dims {
            if min_levels[d] > max_levels[d] {
                return Err(ConfigurationError::MinLevelExceedsMaxLevel {
                    dim: d,
                    min_level: min_levels[d],
                    max_level: max_levels[d],
                });
            }
            radix.push((max_levels[d] - min_levels[d] + 1) as u64);
        }
        let mut multiplier = vec![1u64; dims];
        for d in (0..dims.saturating_sub(1)).rev() {
            multiplier[d] = multiplier[d + 1] * radix[d + 1];
        }
        let num_nodes: u64 = radix.iter().product::<u64>().max(1);
        let num_nodes_usize = usize::try_from(num_nodes).expect("lattice too large to index");

        Ok(Self {
            min_levels,
            max_levels,
            radix,
            multiplier,
            num_nodes,
            monotonicity,
            properties: vec![0u16; num_nodes_usize],
            loss: vec![None; num_nodes_usize],
            bound: vec![None; num_nodes_usize],
            visited_order: Vec::new(),
        })
    }

    pub fn dimensions(&self) -> usize {
        self.min_levels.len()
    }

    pub fn num_nodes(&self) -> u64 {
        self.num_nodes
    }

    pub fn bottom(&self) -> NodeId {
        self.encode(&Transformation::new(self.min_levels.clone()))
    }

    pub fn top(&self) -> NodeId {
        self.encode(&Transformation::new(self.max_levels.clone()))
    }

    /// `t -> id`: `sum (t_d - minLevel_d) * multiplier_d`.
    pub fn encode(&self, t: &Transformation) -> NodeId {
        let mut id: u64 = 0;
        for d in 0..self.dimensions() {
            id += (t[d] - self.min_levels[d]) as u64 * self.multiplier[d];
        }
        NodeId(id)
    }

    /// `id -> t`: right-to-left divmod over the mixed-radix digits.
    pub fn decode(&self, id: NodeId) -> Transformation {
        let mut remaining = id.get();
        let dims = self.dimensions();
        let mut levels = vec![0u32; dims];
        for d in (0..dims).rev() {
            let digit = remaining % self.radix[d];
            levels[d] = self.min_levels[d] + digit as u32;
            remaining /= self.radix[d];
        }
        Transformation::new(levels)
    }

    pub fn level(&self, id: NodeId) -> u64 {
        self.decode(id).total_level()
    }

    pub fn level_of(&self, t: &Transformation) -> u64 {
        t.total_level()
    }

    /// One-step predecessors: any dimension decremented by 1 where legal.
    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        let t = self.decode(id);
        let mut out = Vec::new();
        for d in 0..self.dimensions() {
            if t[d] > self.min_levels[d] {
                let mut levels = t.0.clone();
                levels[d] -= 1;
                out.push(self.encode(&Transformation::new(levels)));
            }
        }
        out
    }

    /// One-step successors: any dimension incremented by 1 where legal,
    /// returned in *reverse* dimensional order. Preserved verbatim per
    /// the open question in spec.md section 9: whether the reversal is
    /// essential to correctness or only to reproduce traces is unclear,
    /// so the reversal is kept rather than "simplified" away.
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        let t = self.decode(id);
        let mut out = Vec::new();
        for d in (0..self.dimensions()).rev() {
            if t[d] < self.max_levels[d] {
                let mut levels = t.0.clone();
                levels[d] += 1;
                out.push(self.encode(&Transformation::new(levels)));
            }
        }
        out
    }

    pub fn is_parent_child_or_equal(&self, parent: NodeId, child: NodeId) -> bool {
        let p = self.decode(parent);
        let c = self.decode(child);
        (0..self.dimensions()).all(|d| p[d] >= c[d])
    }

    pub fn equal_dimensions_bitmask(&self, a: NodeId, b: NodeId) -> u64 {
        let ta = self.decode(a);
        let tb = self.decode(b);
        let mut mask = 0u64;
        for d in 0..self.dimensions() {
            if ta[d] == tb[d] {
                mask |= 1 << d;
            }
        }
        mask
    }

    fn index(&self, id: NodeId) -> usize {
        id.get() as usize
    }

    fn has_bit(&self, id: NodeId, bit: u16) -> bool {
        self.properties[self.index(id)] & bit != 0
    }

    fn set_bit(&mut self, id: NodeId, bit: u16) {
        let idx = self.index(id);
        self.properties[idx] |= bit;
    }

    pub fn has_property(&self, id: NodeId, property: PredictiveProperty) -> bool {
        self.has_bit(id, property.bit())
    }

    /// Sets `property` on `id`, eagerly propagating to every implied
    /// ancestor (UP) or descendant (DOWN), stopping recursion as soon as
    /// a node already carries the bit (monotonic, no retraction: if an
    /// ancestor already has it, its own ancestors were already tagged
    /// when it was set).
    #[tracing::instrument(skip(self))]
    pub fn put_property(&mut self, id: NodeId, property: PredictiveProperty) {
        let bit = property.bit();
        match property.direction_for(self.monotonicity) {
            Direction::None => self.set_bit(id, bit),
            Direction::Up => self.propagate(id, bit, Direction::Up),
            Direction::Down => self.propagate(id, bit, Direction::Down),
        }
    }

    fn propagate(&mut self, start: NodeId, bit: u16, direction: Direction) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if self.has_bit(id, bit) {
                continue;
            }
            self.set_bit(id, bit);
            let next = match direction {
                Direction::Up => self.successors(id),
                Direction::Down => self.predecessors(id),
                Direction::None => Vec::new(),
            };
            stack.extend(next);
        }
    }

    pub fn set_loss(&mut self, id: NodeId, loss: InformationLoss) {
        let idx = self.index(id);
        self.loss[idx] = Some(loss);
    }

    pub fn loss(&self, id: NodeId) -> Option<InformationLoss> {
        self.loss[self.index(id)]
    }

    pub fn set_bound(&mut self, id: NodeId, bound: InformationLoss) {
        let idx = self.index(id);
        self.bound[idx] = Some(bound);
    }

    pub fn bound(&self, id: NodeId) -> Option<InformationLoss> {
        self.bound[self.index(id)]
    }

    /// Records `id` as materialized, in first-visit order.
    pub fn mark_visited(&mut self, id: NodeId) {
        if !self.has_property(id, PredictiveProperty::Visited) {
            self.put_property(id, PredictiveProperty::Visited);
            self.visited_order.push(id);
        }
    }

    /// Materialized nodes in insertion order (spec.md section 4.3).
    pub fn visited_order(&self) -> &[NodeId] {
        &self.visited_order
    }

    /// Full enumeration of every node in the lattice, ordered by level
    /// then by id. Documented in spec.md section 4.3 as an "unsafe" full
    /// enumeration intended only for small spaces.
    pub fn enumerate_all(&self) -> Vec<NodeId> {
        let mut all: Vec<NodeId> = (0..self.num_nodes).map(NodeId).collect();
        all.sort_by_key(|&id| self.level(id));
        all
    }
}
