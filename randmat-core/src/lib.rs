//! # randmat-core
//!
//! Shared substrate for the randmat workspace.
//!
//! This crate provides:
//! - **Counter-based RNG**: the Philox-4x32 block generator, the
//!   `(counter, key)` state type, and the transforms that map raw blocks to
//!   Gaussian or uniform samples. Stream position is absolute, so any slice
//!   of any random matrix can be regenerated in isolation.
//! - **CBLAS layout types**: row-major / column-major and transpose
//!   enumerations shared by every kernel and apply routine.
//! - **COO sparse types**: owned matrices and zero-copy triplet views.
//! - **Parallel execution**: scoped-thread utilities for data-parallel
//!   fills.
//! - **Errors**: one structured error enum for the whole workspace.

pub mod coo;
pub mod error;
pub mod layout;
pub mod parallel;
pub mod rng;
pub mod scalar;

pub use coo::{CooMatrix, CooRef, IndexBase};
pub use error::{Error, Result};
pub use layout::{Layout, MajorAxis, Op};
pub use parallel::parallel_for_chunks;
pub use rng::{boxmul, philox4x32, uneg11, BlockOp, RNGState, BLOCK_WIDTH};
pub use scalar::Scalar;
