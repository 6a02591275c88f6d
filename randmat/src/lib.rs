//! # randmat
//!
//! Randomized sketching operators for dense and sparse data.
//!
//! A sketching operator is a random matrix S whose product with a data
//! matrix A compresses or lifts A along one dimension while approximately
//! preserving geometric structure. This crate provides:
//!
//! - **Dense operators** ([`DenseSkOp`]): iid Gaussian or uniform entries
//!   drawn from a counter-indexed sample stream, realized lazily, applied
//!   through GEMM ([`lskge3`] / [`rskge3`]).
//! - **Sparse operators** ([`SparseSkOp`]): fixed sparsity per axis with
//!   +/-1 values, sampled by a repeated Fisher-Yates shuffle into COO
//!   triplets.
//! - **Sparse-data sketching** ([`lsksp3`] / [`rsksp3`]): dense operators
//!   applied to COO data through SpMM kernels.
//!
//! Everything is reproducible from a seed state: any submatrix of any
//! operator can be realized in isolation, bit-identical to slicing a full
//! realization, independent of thread count.
//!
//! ```
//! use randmat::{lskge3, DenseDist, DenseSkOp, Layout, Op, RNGState};
//!
//! // Sketch the 6x6 identity down to 3 rows: B = S * I = S.
//! let dist = DenseDist::gaussian(3, 6);
//! let s = DenseSkOp::<f64>::new(dist, RNGState::new(42)).unwrap();
//! let mut eye = vec![0.0; 36];
//! for i in 0..6 {
//!     eye[i * 6 + i] = 1.0;
//! }
//! let mut b = vec![0.0; 18];
//! lskge3(
//!     Layout::RowMajor, Op::NoTrans, Op::NoTrans,
//!     3, 6, 6,
//!     1.0, &s, 0, 0, &eye, 6,
//!     0.0, &mut b, 6,
//! )
//! .unwrap();
//! ```

pub mod dense;
pub mod sksp;
pub mod sparse;

// Re-export the substrate types callers need at the API surface.
pub use randmat_core::coo::{CooMatrix, CooRef, IndexBase};
pub use randmat_core::error::{Error, Result};
pub use randmat_core::layout::{Layout, MajorAxis, Op};
pub use randmat_core::rng::{boxmul, uneg11, RNGState, BLOCK_WIDTH};
pub use randmat_core::scalar::Scalar;

pub use dense::{
    dist_to_layout, fill_dense, fill_dense_submat, lskge3, major_axis_length, realize_full,
    rskge3, DenseDist, DenseDistName, DenseSkOp,
};
pub use sksp::{lsksp3, rsksp3, sketch_sparse_left, sketch_sparse_right};
pub use sparse::{
    compute_next_state, fill_sparse, has_fixed_nnz_per_col, isometry_scale_factor, nnz_count,
    repeated_fisher_yates, sample_index_subsets, SparseDist, SparseSkOp, SparseSkOpView,
};
