use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum SparsityError {
    #[error("Column index vector has length {actual}, expected {expected}")]
    ColindLength { expected: usize, actual: usize },
    #[error("Column index vector must start at zero and be non-decreasing")]
    ColindNotMonotone,
    #[error("Row index vector has length {actual}, but the column index vector ends at {expected}")]
    RowLength { expected: usize, actual: usize },
    #[error("Row index {row} out of bounds for {nrow} rows")]
    RowOutOfBounds { row: usize, nrow: usize },
    #[error("Row indices of column {0} are not strictly increasing")]
    RowsNotSorted(usize),
    #[error("Triplet vectors have different lengths ({0} rows, {1} columns)")]
    TripletLength(usize, usize),
    #[error("Entry ({row}, {col}) out of bounds for a {nrow}x{ncol} pattern")]
    EntryOutOfBounds {
        row: usize,
        col: usize,
        nrow: usize,
        ncol: usize,
    },
}

/// Compressed column storage pattern of a matrix-valued expression.
///
/// Nonzeros are ordered column by column and by increasing row inside a column,
/// which is the same as ordering them by their column-major linear index.
/// Every buffer in the crate stores exactly `nnz()` elements in that order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sparsity {
    nrow: usize,
    ncol: usize,
    colind: Vec<usize>,
    row: Vec<usize>,
}

impl Sparsity {
    pub fn new(
        nrow: usize,
        ncol: usize,
        colind: Vec<usize>,
        row: Vec<usize>,
    ) -> Result<Self, SparsityError> {
        if colind.len() != ncol + 1 {
            return Err(SparsityError::ColindLength {
                expected: ncol + 1,
                actual: colind.len(),
            });
        }
        if colind[0] != 0 || colind.windows(2).any(|w| w[0] > w[1]) {
            return Err(SparsityError::ColindNotMonotone);
        }
        if colind[ncol] != row.len() {
            return Err(SparsityError::RowLength {
                expected: colind[ncol],
                actual: row.len(),
            });
        }
        for c in 0..ncol {
            let col_rows = &row[colind[c]..colind[c + 1]];
            if let Some(&r) = col_rows.iter().find(|&&r| r >= nrow) {
                return Err(SparsityError::RowOutOfBounds { row: r, nrow });
            }
            if col_rows.windows(2).any(|w| w[0] >= w[1]) {
                return Err(SparsityError::RowsNotSorted(c));
            }
        }
        Ok(Self {
            nrow,
            ncol,
            colind,
            row,
        })
    }

    pub fn dense(nrow: usize, ncol: usize) -> Self {
        Self {
            nrow,
            ncol,
            colind: (0..=ncol).map(|c| c * nrow).collect(),
            row: (0..ncol).flat_map(|_| 0..nrow).collect(),
        }
    }

    /// Pattern without any structural nonzeros.
    pub fn empty(nrow: usize, ncol: usize) -> Self {
        Self {
            nrow,
            ncol,
            colind: vec![0; ncol + 1],
            row: vec![],
        }
    }

    pub fn scalar() -> Self {
        Self::dense(1, 1)
    }

    pub fn column(n: usize) -> Self {
        Self::dense(n, 1)
    }

    pub fn row_vector(n: usize) -> Self {
        Self::dense(1, n)
    }

    pub fn from_triplets(
        nrow: usize,
        ncol: usize,
        rows: &[usize],
        cols: &[usize],
    ) -> Result<Self, SparsityError> {
        if rows.len() != cols.len() {
            return Err(SparsityError::TripletLength(rows.len(), cols.len()));
        }
        let mut linear = Vec::with_capacity(rows.len());
        for (&row, &col) in rows.iter().zip(cols) {
            if row >= nrow || col >= ncol {
                return Err(SparsityError::EntryOutOfBounds {
                    row,
                    col,
                    nrow,
                    ncol,
                });
            }
            linear.push(col * nrow + row);
        }
        linear.sort_unstable();
        linear.dedup();
        Ok(Self::from_linear(nrow, ncol, linear.into_iter()))
    }

    // `linear` must be sorted and in range.
    fn from_linear(nrow: usize, ncol: usize, linear: impl Iterator<Item = usize>) -> Self {
        let mut colind = vec![0; ncol + 1];
        let mut row = vec![];
        for k in linear {
            row.push(k % nrow);
            colind[k / nrow + 1] += 1;
        }
        for c in 0..ncol {
            colind[c + 1] += colind[c];
        }
        Self {
            nrow,
            ncol,
            colind,
            row,
        }
    }

    pub fn nrow(&self) -> usize {
        self.nrow
    }

    pub fn ncol(&self) -> usize {
        self.ncol
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrow, self.ncol)
    }

    pub fn colind(&self) -> &[usize] {
        &self.colind
    }

    pub fn row(&self) -> &[usize] {
        &self.row
    }

    /// Number of structural nonzeros, i.e. the length of any value buffer with this pattern.
    pub fn nnz(&self) -> usize {
        self.row.len()
    }

    pub fn numel(&self) -> usize {
        self.nrow * self.ncol
    }

    pub fn is_scalar(&self) -> bool {
        self.nrow == 1 && self.ncol == 1
    }

    pub fn is_dense(&self) -> bool {
        self.nnz() == self.numel()
    }

    /// Column vectors always qualify; row vectors only when `allow_row` is set.
    pub fn is_vector(&self, allow_row: bool) -> bool {
        self.ncol == 1 || (allow_row && self.nrow == 1)
    }

    /// Column-major linear index of every nonzero, in storage order.
    pub fn linear_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.ncol).flat_map(move |c| {
            self.row[self.colind[c]..self.colind[c + 1]]
                .iter()
                .map(move |&r| c * self.nrow + r)
        })
    }

    /// Same nonzeros at the same linear positions, read with different dimensions.
    pub fn is_reshape(&self, other: &Sparsity) -> bool {
        self.numel() == other.numel()
            && self.nnz() == other.nnz()
            && self.linear_indices().eq(other.linear_indices())
    }

    pub fn reshape(&self, nrow: usize, ncol: usize) -> Sparsity {
        assert_eq!(
            nrow * ncol,
            self.numel(),
            "Cannot reshape a {self} pattern into {nrow}x{ncol}"
        );
        if (nrow, ncol) == self.shape() {
            return self.clone();
        }
        Self::from_linear(nrow, ncol, self.linear_indices())
    }

    pub fn transpose(&self) -> Sparsity {
        self.transpose_mapping().0
    }

    /// Transposed pattern together with, for each of its nonzeros, the index of the
    /// nonzero it came from.
    pub fn transpose_mapping(&self) -> (Sparsity, Vec<usize>) {
        let mut colind = vec![0; self.nrow + 1];
        for &r in &self.row {
            colind[r + 1] += 1;
        }
        for r in 0..self.nrow {
            colind[r + 1] += colind[r];
        }
        let mut next = colind[..self.nrow].to_vec();
        let mut row = vec![0; self.nnz()];
        let mut mapping = vec![0; self.nnz()];
        for c in 0..self.ncol {
            for k in self.colind[c]..self.colind[c + 1] {
                let r = self.row[k];
                let p = next[r];
                next[r] += 1;
                row[p] = c;
                mapping[p] = k;
            }
        }
        (
            Sparsity {
                nrow: self.ncol,
                ncol: self.nrow,
                colind,
                row,
            },
            mapping,
        )
    }

    /// Scatter a nonzero buffer into a dense matrix.
    pub fn to_dense<T: Clone + num_traits::Zero>(&self, nonzeros: &[T]) -> Array2<T> {
        assert_eq!(nonzeros.len(), self.nnz());
        let mut out = Array2::zeros((self.nrow, self.ncol));
        for (value, k) in nonzeros.iter().zip(self.linear_indices()) {
            out[[k % self.nrow, k / self.nrow]] = value.clone();
        }
        out
    }
}

impl fmt::Display for Sparsity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dense() {
            write!(f, "{}x{}", self.nrow, self.ncol)
        } else {
            write!(f, "{}x{},{}nz", self.nrow, self.ncol, self.nnz())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dense_pattern() {
        let sp = Sparsity::dense(2, 3);
        assert_eq!(sp.nnz(), 6);
        assert_eq!(sp.colind(), &[0, 2, 4, 6]);
        assert_eq!(sp.row(), &[0, 1, 0, 1, 0, 1]);
        assert!(sp.is_dense());
        assert_eq!(sp.to_string(), "2x3");
    }

    #[test]
    fn test_reshape_keeps_linear_positions() {
        // 3x3 with nonzeros at (0,0), (2,0), (1,2)
        let sp = Sparsity::from_triplets(3, 3, &[0, 2, 1], &[0, 0, 2]).unwrap();
        let reshaped = sp.reshape(1, 9);
        assert_eq!(reshaped.nnz(), 3);
        assert_eq!(reshaped.linear_indices().collect::<Vec<_>>(), vec![0, 2, 7]);
        assert!(reshaped.is_reshape(&sp));
        assert!(!Sparsity::dense(1, 9).is_reshape(&sp));
    }

    #[test]
    #[should_panic]
    fn test_reshape_wrong_numel() {
        Sparsity::dense(2, 3).reshape(4, 2);
    }

    #[test]
    fn test_transpose_mapping() {
        let sp = Sparsity::from_triplets(2, 3, &[0, 1, 1], &[0, 0, 2]).unwrap();
        let (tr, mapping) = sp.transpose_mapping();
        assert_eq!(tr.shape(), (3, 2));
        // (0,0) -> (0,0), (1,0) -> (0,1), (1,2) -> (2,1)
        assert_eq!(tr.linear_indices().collect::<Vec<_>>(), vec![0, 3, 5]);
        assert_eq!(mapping, vec![0, 1, 2]);
        assert_eq!(tr.transpose(), sp);
    }

    #[test]
    fn test_is_vector() {
        assert!(Sparsity::column(4).is_vector(false));
        assert!(!Sparsity::row_vector(4).is_vector(false));
        assert!(Sparsity::row_vector(4).is_vector(true));
        assert!(Sparsity::scalar().is_vector(false));
        assert!(!Sparsity::dense(2, 2).is_vector(true));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            Sparsity::new(2, 2, vec![0, 1], vec![0]),
            Err(SparsityError::ColindLength { .. })
        ));
        assert!(matches!(
            Sparsity::new(2, 1, vec![0, 2], vec![1, 0]),
            Err(SparsityError::RowsNotSorted(0))
        ));
        assert!(matches!(
            Sparsity::new(2, 1, vec![0, 1], vec![2]),
            Err(SparsityError::RowOutOfBounds { row: 2, nrow: 2 })
        ));
        assert!(matches!(
            Sparsity::from_triplets(2, 2, &[0, 3], &[0, 0]),
            Err(SparsityError::EntryOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_to_dense() {
        let sp = Sparsity::from_triplets(2, 2, &[1, 0], &[0, 1]).unwrap();
        let dense = sp.to_dense(&[3.0, 4.0]);
        assert_eq!(dense, array![[0.0, 4.0], [3.0, 0.0]]);
        assert_eq!(sp.to_string(), "2x2,2nz");
    }
}
