//! # randmat-blas
//!
//! The level-3 collaborators of the randmat workspace: a dense GEMM and a
//! pair of COO SpMM kernels, behind CBLAS-shaped signatures.
//!
//! The sketching layer in `randmat` never does its own matrix arithmetic;
//! every apply routine validates, translates offsets, and then issues
//! exactly one call into this crate.

pub mod gemm;
pub mod spmm;

// Re-export layout types for convenience
pub use randmat_core::layout::{Layout, Op};

pub use gemm::{dgemm, sgemm, GemmScalar};
pub use spmm::{left_spmm, right_spmm};
