//! Dense level-3 GEMM: C := alpha * op(A) * op(B) + beta * C.
//!
//! CBLAS-style signatures over both layouts and both transposes. The
//! strategy is gather-then-dot: B columns (and strided A rows) are copied
//! into contiguous buffers once, so every inner product streams through
//! sequential memory. Good enough for the sketch sizes this workspace
//! targets; swap in a tuned BLAS behind the same signatures if you need
//! large-matrix throughput.

// GEMM signatures match CBLAS -- many parameters are inherent to the API.
// Index loops over packed arrays read better than iterator chains here.
#![allow(clippy::too_many_arguments, clippy::needless_range_loop)]

use randmat_core::layout::{Layout, Op};
use randmat_core::scalar::Scalar;

#[inline]
fn dot<T: Scalar>(x: &[T], y: &[T]) -> T {
    x.iter()
        .zip(y.iter())
        .fold(T::zero(), |acc, (&a, &b)| acc + a * b)
}

/// Layout- and transpose-aware GEMM over any `Scalar`, the shared body of
/// [`sgemm`] and [`dgemm`].
fn gemm_ref<T: Scalar>(
    layout: Layout,
    trans_a: Op,
    trans_b: Op,
    m: usize,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    b: &[T],
    ldb: usize,
    beta: T,
    c: &mut [T],
    ldc: usize,
) {
    // Scale C by beta
    if beta == T::zero() {
        for i in 0..m {
            for j in 0..n {
                c[layout.index(i, j, ldc)] = T::zero();
            }
        }
    } else if beta != T::one() {
        for i in 0..m {
            for j in 0..n {
                let idx = layout.index(i, j, ldc);
                c[idx] *= beta;
            }
        }
    }

    if alpha == T::zero() || m == 0 || n == 0 || k == 0 {
        return;
    }

    // Pre-gather B columns into contiguous storage (k elements per column).
    // Strided column reads become sequential cache-line-filling reads and
    // the gathered column is reused across all A rows.
    let mut b_cols = vec![T::zero(); n * k];
    for j in 0..n {
        for p in 0..k {
            b_cols[j * k + p] = match (layout, trans_b) {
                (Layout::RowMajor, Op::NoTrans) => b[p * ldb + j],
                (Layout::RowMajor, Op::Trans) => b[j * ldb + p],
                (Layout::ColMajor, Op::NoTrans) => b[j * ldb + p],
                (Layout::ColMajor, Op::Trans) => b[p * ldb + j],
            };
        }
    }

    let a_row_contiguous = matches!(
        (layout, trans_a),
        (Layout::RowMajor, Op::NoTrans) | (Layout::ColMajor, Op::Trans)
    );

    let mut a_gather = vec![T::zero(); k];
    for i in 0..m {
        let a_row: &[T] = if a_row_contiguous {
            &a[i * lda..i * lda + k]
        } else {
            for p in 0..k {
                a_gather[p] = match (layout, trans_a) {
                    (Layout::RowMajor, Op::Trans) => a[p * lda + i],
                    (Layout::ColMajor, Op::NoTrans) => a[p * lda + i],
                    // contiguous cases handled above
                    _ => unreachable!(),
                };
            }
            &a_gather
        };
        for j in 0..n {
            let d = dot(a_row, &b_cols[j * k..(j + 1) * k]);
            let idx = layout.index(i, j, ldc);
            c[idx] += alpha * d;
        }
    }
}

/// Single-precision GEMM: C := alpha * op(A) * op(B) + beta * C
pub fn sgemm(
    layout: Layout,
    trans_a: Op,
    trans_b: Op,
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    lda: usize,
    b: &[f32],
    ldb: usize,
    beta: f32,
    c: &mut [f32],
    ldc: usize,
) {
    gemm_ref(
        layout, trans_a, trans_b, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc,
    );
}

/// Double-precision GEMM: C := alpha * op(A) * op(B) + beta * C
pub fn dgemm(
    layout: Layout,
    trans_a: Op,
    trans_b: Op,
    m: usize,
    n: usize,
    k: usize,
    alpha: f64,
    a: &[f64],
    lda: usize,
    b: &[f64],
    ldb: usize,
    beta: f64,
    c: &mut [f64],
    ldc: usize,
) {
    gemm_ref(
        layout, trans_a, trans_b, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc,
    );
}

/// Static dispatch from a scalar type to its GEMM entry point, so generic
/// apply routines can issue exactly one kernel call.
pub trait GemmScalar: Scalar {
    #[allow(clippy::too_many_arguments)]
    fn gemm(
        layout: Layout,
        trans_a: Op,
        trans_b: Op,
        m: usize,
        n: usize,
        k: usize,
        alpha: Self,
        a: &[Self],
        lda: usize,
        b: &[Self],
        ldb: usize,
        beta: Self,
        c: &mut [Self],
        ldc: usize,
    );
}

impl GemmScalar for f32 {
    #[inline]
    fn gemm(
        layout: Layout,
        trans_a: Op,
        trans_b: Op,
        m: usize,
        n: usize,
        k: usize,
        alpha: f32,
        a: &[f32],
        lda: usize,
        b: &[f32],
        ldb: usize,
        beta: f32,
        c: &mut [f32],
        ldc: usize,
    ) {
        sgemm(
            layout, trans_a, trans_b, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc,
        );
    }
}

impl GemmScalar for f64 {
    #[inline]
    fn gemm(
        layout: Layout,
        trans_a: Op,
        trans_b: Op,
        m: usize,
        n: usize,
        k: usize,
        alpha: f64,
        a: &[f64],
        lda: usize,
        b: &[f64],
        ldb: usize,
        beta: f64,
        c: &mut [f64],
        ldc: usize,
    ) {
        dgemm(
            layout, trans_a, trans_b, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc,
        );
    }
}
