use ndarray::{Array2, ArrayView1, Axis};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Exact (brute force) nearest-neighbour index over fixed-dimension rows.
///
/// Distance is squared Euclidean. Rows are addressed by insertion order.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dim: usize,
    rows: Array2<f32>,
}

impl VectorIndex {
    /// Empty index; the dimension is fixed for its lifetime.
    pub fn new(dim: usize) -> Self {
        Self { dim, rows: Array2::zeros((0, dim)) }
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.rows.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append rows in order. All vectors are checked first, so a mismatch adds nothing.
    pub fn append(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        self.check_dims(vectors)?;
        for v in vectors {
            self.rows
                .push_row(ArrayView1::from(v.as_slice()))
                .map_err(|_| IndexError::DimensionMismatch { expected: self.dim, actual: v.len() })?;
        }
        Ok(())
    }

    /// Up to `k` `(row, distance)` pairs, nearest first; equal distances keep row order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, IndexError> {
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        let q = ArrayView1::from(query);
        let mut scored: Vec<(usize, f32)> = self
            .rows
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(row, v)| {
                let d = &v - &q;
                (row, d.dot(&d))
            })
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    /// A fresh index with this index's dimension holding exactly `vectors`.
    /// `self` is left as it is.
    pub fn rebuild(&self, vectors: &[Vec<f32>]) -> Result<VectorIndex, IndexError> {
        let mut fresh = VectorIndex::new(self.dim);
        fresh.append(vectors)?;
        Ok(fresh)
    }

    pub fn row(&self, row: usize) -> Option<Vec<f32>> {
        (row < self.len()).then(|| self.rows.row(row).to_vec())
    }

    fn check_dims(&self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        match vectors.iter().find(|v| v.len() != self.dim) {
            Some(bad) => Err(IndexError::DimensionMismatch { expected: self.dim, actual: bad.len() }),
            None => Ok(()),
        }
    }
}
