//! Sketching sparse data with dense operators.
//!
//! `lsksp3` and `rsksp3` are the SpMM-flavored analogues of the GEMM apply
//! routines: a dense sketching operator meets a sparse COO data matrix,
//! and both sides may be submatrices. After validation and layout
//! reconciliation each routine issues exactly one kernel call -- the
//! sparse operand sits on the *right* inside the kernel for `lsksp3` and
//! on the *left* for `rsksp3`, hence the crossed-looking dispatch.

#![allow(clippy::too_many_arguments)]

use randmat_blas::spmm::{left_spmm, right_spmm};
use randmat_core::coo::CooRef;
use randmat_core::error::{Error, Result};
use randmat_core::layout::{Layout, Op};
use randmat_core::scalar::Scalar;

use crate::dense::{dims_before_op, offset_and_ldim, submatrix_as_blackbox, DenseSkOp};

/// LSKSP3: mat(B) = alpha * op(submat(S)) * op(submat(A)) + beta * mat(B)
///
/// where op(submat(S)) is d x m, op(submat(A)) is m x n, S is a dense
/// sketching operator, and A is sparse data in COO form. Unrealized
/// operators contribute only the minimal tile, which is dropped on return.
pub fn lsksp3<T: Scalar>(
    layout: Layout,
    op_s: Op,
    op_a: Op,
    d: i64,
    n: i64,
    m: i64,
    alpha: T,
    s: &DenseSkOp<T>,
    ro_s: i64,
    co_s: i64,
    a: CooRef<'_, T>,
    ro_a: i64,
    co_a: i64,
    beta: T,
    b: &mut [T],
    ldb: i64,
) -> Result<()> {
    let (rows_submat_s, cols_submat_s) = dims_before_op(d, m, op_s);
    let Some(s_buff) = s.buffer() else {
        let tile = submatrix_as_blackbox(s, rows_submat_s, cols_submat_s, ro_s, co_s)?;
        return lsksp3(
            layout, op_s, op_a, d, n, m, alpha, &tile, 0, 0, a, ro_a, co_a, beta, b, ldb,
        );
    };

    let (rows_submat_a, cols_submat_a) = dims_before_op(m, n, op_a);
    if a.n_rows < rows_submat_a + ro_a {
        return Err(Error::dimension_mismatch(
            "A.n_rows",
            rows_submat_a + ro_a,
            a.n_rows,
        ));
    }
    if a.n_cols < cols_submat_a + co_a {
        return Err(Error::dimension_mismatch(
            "A.n_cols",
            cols_submat_a + co_a,
            a.n_cols,
        ));
    }
    if s.dist.n_rows < rows_submat_s + ro_s {
        return Err(Error::dimension_mismatch(
            "S.dist.n_rows",
            rows_submat_s + ro_s,
            s.dist.n_rows,
        ));
    }
    if s.dist.n_cols < cols_submat_s + co_s {
        return Err(Error::dimension_mismatch(
            "S.dist.n_cols",
            cols_submat_s + co_s,
            s.dist.n_cols,
        ));
    }
    let min_ldb = if layout == Layout::ColMajor { d } else { n };
    if ldb < min_ldb {
        return Err(Error::dimension_mismatch("ldb", min_ldb, ldb));
    }

    let (pos, lds) = offset_and_ldim(s.layout, s.dist.n_rows, s.dist.n_cols, ro_s, co_s);
    let op_s = if s.layout == layout { op_s } else { op_s.flip() };

    right_spmm(
        layout,
        op_s,
        op_a,
        d,
        n,
        m,
        alpha,
        &s_buff[pos as usize..],
        lds,
        a,
        ro_a,
        co_a,
        beta,
        b,
        ldb,
    );
    Ok(())
}

/// RSKSP3: mat(B) = alpha * op(submat(A)) * op(submat(S)) + beta * mat(B)
///
/// where op(submat(A)) is m x n, op(submat(S)) is n x d, A is sparse data
/// in COO form, and S is a dense sketching operator. The
/// right-multiplication analogue of [`lsksp3`].
pub fn rsksp3<T: Scalar>(
    layout: Layout,
    op_a: Op,
    op_s: Op,
    m: i64,
    d: i64,
    n: i64,
    alpha: T,
    a: CooRef<'_, T>,
    ro_a: i64,
    co_a: i64,
    s: &DenseSkOp<T>,
    ro_s: i64,
    co_s: i64,
    beta: T,
    b: &mut [T],
    ldb: i64,
) -> Result<()> {
    let (rows_submat_s, cols_submat_s) = dims_before_op(n, d, op_s);
    let Some(s_buff) = s.buffer() else {
        let tile = submatrix_as_blackbox(s, rows_submat_s, cols_submat_s, ro_s, co_s)?;
        return rsksp3(
            layout, op_a, op_s, m, d, n, alpha, a, ro_a, co_a, &tile, 0, 0, beta, b, ldb,
        );
    };

    let (rows_submat_a, cols_submat_a) = dims_before_op(m, n, op_a);
    if a.n_rows < rows_submat_a + ro_a {
        return Err(Error::dimension_mismatch(
            "A.n_rows",
            rows_submat_a + ro_a,
            a.n_rows,
        ));
    }
    if a.n_cols < cols_submat_a + co_a {
        return Err(Error::dimension_mismatch(
            "A.n_cols",
            cols_submat_a + co_a,
            a.n_cols,
        ));
    }
    if s.dist.n_rows < rows_submat_s + ro_s {
        return Err(Error::dimension_mismatch(
            "S.dist.n_rows",
            rows_submat_s + ro_s,
            s.dist.n_rows,
        ));
    }
    if s.dist.n_cols < cols_submat_s + co_s {
        return Err(Error::dimension_mismatch(
            "S.dist.n_cols",
            cols_submat_s + co_s,
            s.dist.n_cols,
        ));
    }
    let min_ldb = if layout == Layout::ColMajor { m } else { d };
    if ldb < min_ldb {
        return Err(Error::dimension_mismatch("ldb", min_ldb, ldb));
    }

    let (pos, lds) = offset_and_ldim(s.layout, s.dist.n_rows, s.dist.n_cols, ro_s, co_s);
    let op_s = if s.layout == layout { op_s } else { op_s.flip() };

    left_spmm(
        layout,
        op_a,
        op_s,
        m,
        d,
        n,
        alpha,
        a,
        ro_a,
        co_a,
        &s_buff[pos as usize..],
        lds,
        beta,
        b,
        ldb,
    );
    Ok(())
}

/// Sketch sparse data from the left: alias of [`lsksp3`].
pub fn sketch_sparse_left<T: Scalar>(
    layout: Layout,
    op_s: Op,
    op_a: Op,
    d: i64,
    n: i64,
    m: i64,
    alpha: T,
    s: &DenseSkOp<T>,
    ro_s: i64,
    co_s: i64,
    a: CooRef<'_, T>,
    ro_a: i64,
    co_a: i64,
    beta: T,
    b: &mut [T],
    ldb: i64,
) -> Result<()> {
    lsksp3(
        layout, op_s, op_a, d, n, m, alpha, s, ro_s, co_s, a, ro_a, co_a, beta, b, ldb,
    )
}

/// Sketch sparse data from the right: alias of [`rsksp3`].
pub fn sketch_sparse_right<T: Scalar>(
    layout: Layout,
    op_a: Op,
    op_s: Op,
    m: i64,
    d: i64,
    n: i64,
    alpha: T,
    a: CooRef<'_, T>,
    ro_a: i64,
    co_a: i64,
    s: &DenseSkOp<T>,
    ro_s: i64,
    co_s: i64,
    beta: T,
    b: &mut [T],
    ldb: i64,
) -> Result<()> {
    rsksp3(
        layout, op_a, op_s, m, d, n, alpha, a, ro_a, co_a, s, ro_s, co_s, beta, b, ldb,
    )
}
