/// Read-only row/column access to a dictionary-encoded micro-dataset
/// (spec.md section 6). Parsing the source table and producing the
/// dictionary encoding is an external collaborator; the core only
/// consumes this view.
pub trait DataView: Sync {
    fn rows(&self) -> usize;
    fn cols(&self) -> usize;
    /// The dictionary code of the cell at `(row, col)`.
    fn value(&self, row: usize, col: usize) -> u32;
    /// Indices (into the column space) of quasi-identifying attributes,
    /// in the order the lattice's dimensions are numbered.
    fn qi_indices(&self) -> &[usize];
    /// Indices of sensitive attributes, used by l-diversity/t-closeness.
    fn sensitive_indices(&self) -> &[usize];
}

/// Simple row-major, in-memory `DataView` over a dense `u32` matrix.
/// Used by tests and by callers that already hold a dictionary-encoded
/// matrix in memory.
#[derive(Debug, Clone)]
pub struct VecDataView {
    rows: usize,
    cols: usize,
    cells: Vec<u32>,
    qi_indices: Vec<usize>,
    sensitive_indices: Vec<usize>,
}

impl VecDataView {
    pub fn new(
        rows: usize,
        cols: usize,
        cells: Vec<u32>,
        qi_indices: Vec<usize>,
        sensitive_indices: Vec<usize>,
    ) -> Self {
        assert_eq!(cells.len(), rows * cols, "cell matrix size mismatch");
        Self {
            rows,
            cols,
            cells,
            qi_indices,
            sensitive_indices,
        }
    }
}

impl DataView for VecDataView {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn value(&self, row: usize, col: usize) -> u32 {
        self.cells[row * self.cols + col]
    }

    fn qi_indices(&self) -> &[usize] {
        &self.qi_indices
    }

    fn sensitive_indices(&self) -> &[usize] {
        &self.sensitive_indices
    }
}
