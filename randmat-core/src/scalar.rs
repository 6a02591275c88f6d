//! Real scalar abstraction shared by fills and kernels.

use num_traits::{Float, NumAssign};
use std::fmt::Debug;

/// Real element types the library can sketch with.
///
/// The sample stream is produced in f64 and narrowed at the destination,
/// so both precisions observe the same underlying draws.
pub trait Scalar: Float + NumAssign + Copy + Debug + Send + Sync + 'static {
    /// Narrowing conversion from the f64 sample stream.
    fn from_f64(x: f64) -> Self;
}

impl Scalar for f32 {
    #[inline(always)]
    fn from_f64(x: f64) -> f32 {
        x as f32
    }
}

impl Scalar for f64 {
    #[inline(always)]
    fn from_f64(x: f64) -> f64 {
        x
    }
}
