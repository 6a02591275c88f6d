//! COO (coordinate) sparse matrix types.
//!
//! The sketching core consumes sparse data exclusively through borrowed
//! COO triplet views; [`CooMatrix`] is the owned counterpart used to build
//! inputs and test fixtures. Compressed formats are out of scope here --
//! callers convert before or after, the kernels only walk triplets.

use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::scalar::Scalar;

/// Index base of the stored row/column indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexBase {
    /// Indices start at 0 (C convention).
    #[default]
    Zero,
    /// Indices start at 1 (Fortran convention).
    One,
}

impl IndexBase {
    /// Offset to subtract to obtain zero-based indices.
    #[inline(always)]
    pub fn offset(self) -> i64 {
        match self {
            IndexBase::Zero => 0,
            IndexBase::One => 1,
        }
    }
}

/// An owned sparse matrix in COO form.
#[derive(Debug, Clone)]
pub struct CooMatrix<T> {
    pub n_rows: i64,
    pub n_cols: i64,
    pub nnz: i64,
    pub rows: Vec<i64>,
    pub cols: Vec<i64>,
    pub vals: Vec<T>,
    pub index_base: IndexBase,
}

/// A borrowed COO view: the shape kernels and operator adapters trade in.
#[derive(Debug, Clone, Copy)]
pub struct CooRef<'a, T> {
    pub n_rows: i64,
    pub n_cols: i64,
    pub nnz: i64,
    pub rows: &'a [i64],
    pub cols: &'a [i64],
    pub vals: &'a [T],
    pub index_base: IndexBase,
}

impl<T: Scalar> CooMatrix<T> {
    /// Build a COO matrix from parallel triplet arrays, validating lengths
    /// and index bounds up front.
    pub fn from_triplets(
        n_rows: i64,
        n_cols: i64,
        rows: Vec<i64>,
        cols: Vec<i64>,
        vals: Vec<T>,
    ) -> Result<Self> {
        if n_rows <= 0 || n_cols <= 0 {
            return Err(Error::invalid_argument(
                "n_rows/n_cols",
                format!("matrix dimensions must be positive, got {} x {}", n_rows, n_cols),
            ));
        }
        if rows.len() != vals.len() || cols.len() != vals.len() {
            return Err(Error::invalid_argument(
                "rows/cols/vals",
                format!(
                    "triplet arrays must have equal lengths, got {}/{}/{}",
                    rows.len(),
                    cols.len(),
                    vals.len()
                ),
            ));
        }
        for (&r, &c) in rows.iter().zip(cols.iter()) {
            if r < 0 || r >= n_rows || c < 0 || c >= n_cols {
                return Err(Error::invalid_argument(
                    "rows/cols",
                    format!("index ({}, {}) outside a {} x {} matrix", r, c, n_rows, n_cols),
                ));
            }
        }
        let nnz = vals.len() as i64;
        Ok(Self {
            n_rows,
            n_cols,
            nnz,
            rows,
            cols,
            vals,
            index_base: IndexBase::Zero,
        })
    }

    /// Borrow this matrix as a kernel-ready view.
    #[inline]
    pub fn view(&self) -> CooRef<'_, T> {
        CooRef {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            nnz: self.nnz,
            rows: &self.rows,
            cols: &self.cols,
            vals: &self.vals,
            index_base: self.index_base,
        }
    }

    /// Densify into a freshly allocated buffer in the requested layout.
    pub fn to_dense(&self, layout: Layout) -> Vec<T> {
        self.view().to_dense(layout)
    }
}

impl<'a, T: Scalar> CooRef<'a, T> {
    /// Densify into a freshly allocated buffer in the requested layout.
    /// Duplicate entries accumulate.
    pub fn to_dense(&self, layout: Layout) -> Vec<T> {
        let ld = layout.leading_dim(self.n_rows as usize, self.n_cols as usize);
        let mut out = vec![T::zero(); (self.n_rows * self.n_cols) as usize];
        let base = self.index_base.offset();
        for idx in 0..self.nnz as usize {
            let i = (self.rows[idx] - base) as usize;
            let j = (self.cols[idx] - base) as usize;
            out[layout.index(i, j, ld)] += self.vals[idx];
        }
        out
    }
}
