//! Sparse level-3 kernels over COO views.
//!
//! Naming follows the operand position: `left_spmm` has the sparse matrix
//! on the left of the product, `right_spmm` on the right. Both accept a
//! submatrix window `(ro, co)` into the sparse operand: triplets outside
//! the window are skipped, triplets inside are re-anchored to the window
//! origin. The dense operand and the output follow CBLAS layout/ld rules.

#![allow(clippy::too_many_arguments)]

use randmat_core::coo::CooRef;
use randmat_core::layout::{Layout, Op};
use randmat_core::scalar::Scalar;

#[inline]
fn scale_by_beta<T: Scalar>(layout: Layout, m: usize, n: usize, beta: T, c: &mut [T], ldc: usize) {
    if beta == T::one() {
        return;
    }
    for i in 0..m {
        for j in 0..n {
            let idx = layout.index(i, j, ldc);
            c[idx] = if beta == T::zero() {
                T::zero()
            } else {
                c[idx] * beta
            };
        }
    }
}

/// C := alpha * op(submat(A)) * op(B) + beta * C, with A sparse.
///
/// `op(submat(A))` is m x k, `op(B)` is k x n, C is m x n. The window into
/// A is the pre-op `(ro_a, co_a)`-anchored block sized to match `op_a`.
/// When `alpha` is zero, A is never read.
pub fn left_spmm<T: Scalar>(
    layout: Layout,
    op_a: Op,
    op_b: Op,
    m: i64,
    n: i64,
    k: i64,
    alpha: T,
    a: CooRef<'_, T>,
    ro_a: i64,
    co_a: i64,
    b: &[T],
    ldb: i64,
    beta: T,
    c: &mut [T],
    ldc: i64,
) {
    let (ldb, ldc) = (ldb as usize, ldc as usize);
    scale_by_beta(layout, m as usize, n as usize, beta, c, ldc);
    if alpha == T::zero() || m == 0 || n == 0 || k == 0 {
        return;
    }

    // Window dimensions of submat(A) before op is applied.
    let (rows_a, cols_a) = match op_a {
        Op::NoTrans => (m, k),
        Op::Trans => (k, m),
    };
    let base = a.index_base.offset();
    for idx in 0..a.nnz as usize {
        let r = a.rows[idx] - base - ro_a;
        let s = a.cols[idx] - base - co_a;
        if r < 0 || r >= rows_a || s < 0 || s >= cols_a {
            continue;
        }
        let (i, kk) = match op_a {
            Op::NoTrans => (r as usize, s as usize),
            Op::Trans => (s as usize, r as usize),
        };
        let v = alpha * a.vals[idx];
        for j in 0..n as usize {
            let b_val = match op_b {
                Op::NoTrans => b[layout.index(kk, j, ldb)],
                Op::Trans => b[layout.index(j, kk, ldb)],
            };
            c[layout.index(i, j, ldc)] += v * b_val;
        }
    }
}

/// C := alpha * op(A) * op(submat(B)) + beta * C, with B sparse.
///
/// `op(A)` is m x k, `op(submat(B))` is k x n, C is m x n. When `alpha` is
/// zero, B is never read.
pub fn right_spmm<T: Scalar>(
    layout: Layout,
    op_a: Op,
    op_b: Op,
    m: i64,
    n: i64,
    k: i64,
    alpha: T,
    a: &[T],
    lda: i64,
    b: CooRef<'_, T>,
    ro_b: i64,
    co_b: i64,
    beta: T,
    c: &mut [T],
    ldc: i64,
) {
    let (lda, ldc) = (lda as usize, ldc as usize);
    scale_by_beta(layout, m as usize, n as usize, beta, c, ldc);
    if alpha == T::zero() || m == 0 || n == 0 || k == 0 {
        return;
    }

    let (rows_b, cols_b) = match op_b {
        Op::NoTrans => (k, n),
        Op::Trans => (n, k),
    };
    let base = b.index_base.offset();
    for idx in 0..b.nnz as usize {
        let r = b.rows[idx] - base - ro_b;
        let s = b.cols[idx] - base - co_b;
        if r < 0 || r >= rows_b || s < 0 || s >= cols_b {
            continue;
        }
        let (kk, j) = match op_b {
            Op::NoTrans => (r as usize, s as usize),
            Op::Trans => (s as usize, r as usize),
        };
        let v = alpha * b.vals[idx];
        for i in 0..m as usize {
            let a_val = match op_a {
                Op::NoTrans => a[layout.index(i, kk, lda)],
                Op::Trans => a[layout.index(kk, i, lda)],
            };
            c[layout.index(i, j, ldc)] += v * a_val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemm::dgemm;
    use randmat_core::coo::CooMatrix;

    // A = [[1, 0, 2],
    //      [0, 3, 0]]
    fn fixture() -> CooMatrix<f64> {
        CooMatrix::from_triplets(2, 3, vec![0, 0, 1], vec![0, 2, 1], vec![1.0, 2.0, 3.0]).unwrap()
    }

    fn dense_reference(
        layout: Layout,
        op_a: Op,
        op_b: Op,
        m: i64,
        n: i64,
        k: i64,
        alpha: f64,
        a_dense: &[f64],
        lda: i64,
        b: &[f64],
        ldb: i64,
        beta: f64,
        c: &mut [f64],
        ldc: i64,
    ) {
        dgemm(
            layout,
            op_a,
            op_b,
            m as usize,
            n as usize,
            k as usize,
            alpha,
            a_dense,
            lda as usize,
            b,
            ldb as usize,
            beta,
            c,
            ldc as usize,
        );
    }

    #[test]
    fn test_left_spmm_matches_gemm() {
        let a = fixture();
        let b = vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0]; // 3x2 row-major
        for layout in [Layout::RowMajor, Layout::ColMajor] {
            let (b_buf, ldb) = if layout == Layout::RowMajor {
                (b.clone(), 2)
            } else {
                (vec![1.0, 3.0, 5.0, 2.0, 4.0, 6.0], 3)
            };
            let ldc = 2;
            let mut c = vec![0.5f64; 4];
            let mut c_ref = c.clone();
            left_spmm(
                layout,
                Op::NoTrans,
                Op::NoTrans,
                2,
                2,
                3,
                2.0,
                a.view(),
                0,
                0,
                &b_buf,
                ldb,
                0.25,
                &mut c,
                ldc,
            );
            let a_dense = a.to_dense(layout);
            let lda = if layout == Layout::RowMajor { 3 } else { 2 };
            dense_reference(
                layout,
                Op::NoTrans,
                Op::NoTrans,
                2,
                2,
                3,
                2.0,
                &a_dense,
                lda,
                &b_buf,
                ldb,
                0.25,
                &mut c_ref,
                ldc,
            );
            assert_eq!(c, c_ref, "layout {:?}", layout);
        }
    }

    #[test]
    fn test_left_spmm_transposed_sparse() {
        // C(3x2) = A^T(3x2) * B(2x2)
        let a = fixture();
        let b = vec![1.0f64, -1.0, 2.0, 0.5]; // 2x2 row-major
        let mut c = vec![0.0f64; 6];
        left_spmm(
            Layout::RowMajor,
            Op::Trans,
            Op::NoTrans,
            3,
            2,
            2,
            1.0,
            a.view(),
            0,
            0,
            &b,
            2,
            0.0,
            &mut c,
            2,
        );
        let a_dense = a.to_dense(Layout::RowMajor);
        let mut c_ref = vec![0.0f64; 6];
        dense_reference(
            Layout::RowMajor,
            Op::Trans,
            Op::NoTrans,
            3,
            2,
            2,
            1.0,
            &a_dense,
            3,
            &b,
            2,
            0.0,
            &mut c_ref,
            2,
        );
        assert_eq!(c, c_ref);
    }

    #[test]
    fn test_left_spmm_window() {
        // Take the 1x2 window of A anchored at (0, 1): [[0, 2]].
        let a = fixture();
        let b = vec![10.0f64, 20.0]; // 2x1
        let mut c = vec![0.0f64; 1];
        left_spmm(
            Layout::RowMajor,
            Op::NoTrans,
            Op::NoTrans,
            1,
            1,
            2,
            1.0,
            a.view(),
            0,
            1,
            &b,
            1,
            0.0,
            &mut c,
            1,
        );
        // [0, 2] . [10, 20] = 40
        assert_eq!(c, vec![40.0]);
    }

    #[test]
    fn test_right_spmm_matches_gemm() {
        // C(2x2) = B_dense(2x3) * A_sp(3x2) with A_sp = fixture^T contents
        let sp =
            CooMatrix::from_triplets(3, 2, vec![0, 2, 1], vec![0, 0, 1], vec![1.0, 2.0, 3.0])
                .unwrap();
        let dense = vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0]; // 2x3 row-major
        let mut c = vec![0.0f64; 4];
        right_spmm(
            Layout::RowMajor,
            Op::NoTrans,
            Op::NoTrans,
            2,
            2,
            3,
            1.0,
            &dense,
            3,
            sp.view(),
            0,
            0,
            0.0,
            &mut c,
            2,
        );
        let sp_dense = sp.to_dense(Layout::RowMajor);
        let mut c_ref = vec![0.0f64; 4];
        dense_reference(
            Layout::RowMajor,
            Op::NoTrans,
            Op::NoTrans,
            2,
            2,
            3,
            1.0,
            &dense,
            3,
            &sp_dense,
            2,
            0.0,
            &mut c_ref,
            2,
        );
        assert_eq!(c, c_ref);
    }

    #[test]
    fn test_alpha_zero_never_reads_sparse() {
        // Out-of-range indices would panic if the kernel walked them.
        let a = CooRef::<f64> {
            n_rows: 2,
            n_cols: 2,
            nnz: 1,
            rows: &[100],
            cols: &[100],
            vals: &[f64::NAN],
            index_base: randmat_core::IndexBase::Zero,
        };
        let b = vec![1.0f64; 4];
        let mut c = vec![3.0f64; 4];
        left_spmm(
            Layout::RowMajor,
            Op::NoTrans,
            Op::NoTrans,
            2,
            2,
            2,
            0.0,
            a,
            0,
            0,
            &b,
            2,
            0.0,
            &mut c,
            2,
        );
        assert_eq!(c, vec![0.0; 4]);
    }
}
