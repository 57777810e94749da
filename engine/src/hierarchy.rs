use ndarray::Array2;

use anonymizer_types::errors::ConfigurationError;

/// Per-QI-attribute generalization hierarchy (spec.md section 3):
/// `codes[v][l]` maps a leaf dictionary code `v` at level `l` to the
/// generalized code at that level. Column 0 is the identity mapping.
/// `domain_size[l]` is the count of distinct codes at level `l`, and
/// `share[v][l]` is the relative fraction of the level-`l` value's
/// preimage that `v` represents at level 0.
#[derive(Debug, Clone)]
pub struct GeneralizationHierarchy {
    codes: Array2<u32>,
    domain_size: Vec<u32>,
    share: Array2<f64>,
    /// `representative[level][code]`: a leaf mapping to `code` at `level`,
    /// used to re-derive a generalized value at one level from a
    /// generalized value at a lower level (snapshot cache re-derivation,
    /// spec.md section 4.5) without walking back to raw leaf data. Any
    /// leaf in the generalized value's preimage works: monotonicity
    /// guarantees they all carry the same value at every higher level.
    representative: Vec<Vec<u32>>,
}

impl GeneralizationHierarchy {
    /// Builds a hierarchy from dense level-matrices, validating the
    /// monotonicity invariant from spec.md section 3: for every leaf,
    /// the code sequence across levels never "refines" (never maps to
    /// more distinct values as the level increases), and column 0 must
    /// be the identity over leaf codes `0..num_leaves`.
    pub fn new(
        dim: usize,
        codes: Array2<u32>,
        domain_size: Vec<u32>,
        share: Array2<f64>,
    ) -> Result<Self, ConfigurationError> {
        let height = codes.ncols() as u32;
        if height == 0 {
            return Err(ConfigurationError::EmptyHierarchy { dim });
        }
        for (leaf, row) in codes.rows().into_iter().enumerate() {
            if row[0] != leaf as u32 {
                return Err(ConfigurationError::NonMonotonicHierarchy {
                    dim,
                    leaf: leaf as u32,
                    level: 0,
                });
            }
        }
        // Monotonicity: two leaves sharing a generalized value at level l
        // must keep sharing one at every level > l (values may merge
        // going up, never split).
        for level in 1..codes.ncols() {
            let mut group_target: std::collections::HashMap<u32, u32> =
                std::collections::HashMap::new();
            for (leaf, row) in codes.rows().into_iter().enumerate() {
                let prev = row[level - 1];
                let cur = row[level];
                match group_target.entry(prev) {
                    std::collections::hash_map::Entry::Vacant(slot) => {
                        slot.insert(cur);
                    }
                    std::collections::hash_map::Entry::Occupied(slot) => {
                        if *slot.get() != cur {
                            return Err(ConfigurationError::NonMonotonicHierarchy {
                                dim,
                                leaf: leaf as u32,
                                level: level as u32,
                            });
                        }
                    }
                }
            }
        }
        let mut representative: Vec<Vec<u32>> = Vec::with_capacity(height as usize);
        for level in 0..codes.ncols() {
            let dsize = domain_size[level] as usize;
            let mut rep = vec![u32::MAX; dsize];
            for (leaf, row) in codes.rows().into_iter().enumerate() {
                let code = row[level] as usize;
                if let Some(slot) = rep.get_mut(code) {
                    if *slot == u32::MAX {
                        *slot = leaf as u32;
                    }
                }
            }
            representative.push(rep);
        }

        Ok(Self {
            codes,
            domain_size,
            share,
            representative,
        })
    }

    pub fn height(&self) -> u32 {
        self.codes.ncols() as u32
    }

    pub fn num_leaves(&self) -> usize {
        self.codes.nrows()
    }

    /// Generalizes a leaf dictionary code to the given level.
    pub fn generalize(&self, leaf_code: u32, level: u32) -> u32 {
        self.codes[[leaf_code as usize, level as usize]]
    }

    pub fn domain_size(&self, level: u32) -> u32 {
        self.domain_size[level as usize]
    }

    /// `share_d(v, l)`: relative fraction of the level-`l` generalized
    /// value's preimage that leaf `v` represents (spec.md section 3).
    pub fn share(&self, leaf_code: u32, level: u32) -> f64 {
        self.share[[leaf_code as usize, level as usize]]
    }

    /// `share_d(v, l)` for an already-generalized `code` at `level`, found
    /// via a representative leaf rather than a known leaf value. Every
    /// leaf in `code`'s preimage carries the same share, so any
    /// representative gives the correct answer.
    pub fn share_of_code(&self, code: u32, level: u32) -> f64 {
        let leaf = self.representative[level as usize][code as usize];
        self.share(leaf, level)
    }

    /// Re-derives the generalized code at `to_level` for a value already
    /// generalized to `from_level` (spec.md section 4.5: "re-apply the
    /// per-dimension generalization from level l(n) to level l(n')").
    /// `to_level` must be `>= from_level`.
    pub fn generalize_from_level(&self, code_at_level: u32, from_level: u32, to_level: u32) -> u32 {
        if from_level == to_level {
            return code_at_level;
        }
        let leaf = self.representative[from_level as usize][code_at_level as usize];
        self.generalize(leaf, to_level)
    }
}
