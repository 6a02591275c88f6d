//! Dense sketching operators.
//!
//! A dense operator is described by a [`DenseDist`] and realized lazily
//! from a counter-based seed state. Entries come from one conceptual
//! row-major "parent stream" whose row length is the major-axis length of
//! the distribution; every element's generator counter is derived from its
//! absolute position in that stream. Consequences:
//!
//! - realizing a submatrix directly equals slicing a full realization,
//! - the bytes written never depend on worker count or assignment,
//! - column-major operators are just the transposed view of the stream.
//!
//! `lskge3` / `rskge3` sketch a dense data matrix from the left or right,
//! lowering onto a single GEMM call after layout reconciliation.

#![allow(clippy::too_many_arguments)]

use randmat_blas::gemm::GemmScalar;
use randmat_core::error::{Error, Result};
use randmat_core::layout::{Layout, MajorAxis, Op};
use randmat_core::parallel::parallel_for_chunks;
use randmat_core::rng::{boxmul, uneg11, BlockOp, RNGState, BLOCK_WIDTH};
use randmat_core::scalar::Scalar;

/// Entry distribution of a dense sketching operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DenseDistName {
    /// Gaussian with mean 0 and standard deviation 1.
    #[default]
    Gaussian,
    /// Uniform over [-1, 1).
    Uniform,
    /// Entries defined only by a user-provided buffer.
    BlackBox,
}

impl DenseDistName {
    pub fn as_char(self) -> char {
        match self {
            DenseDistName::Gaussian => 'G',
            DenseDistName::Uniform => 'U',
            DenseDistName::BlackBox => 'B',
        }
    }

    /// Parse a distribution tag character.
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'G' => Ok(DenseDistName::Gaussian),
            'U' => Ok(DenseDistName::Uniform),
            'B' => Ok(DenseDistName::BlackBox),
            other => Err(Error::UnrecognizedDistribution(other)),
        }
    }
}

/// A distribution over dense sketching operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenseDist {
    /// Matrices drawn from this distribution have this many rows.
    pub n_rows: i64,
    /// Matrices drawn from this distribution have this many columns.
    pub n_cols: i64,
    /// The distribution of the entries.
    pub family: DenseDistName,
    /// The order in which the buffer is populated when sampling iid.
    pub major_axis: MajorAxis,
}

impl DenseDist {
    /// Standard Gaussian entries, long-axis major.
    pub fn gaussian(n_rows: i64, n_cols: i64) -> Self {
        Self {
            n_rows,
            n_cols,
            family: DenseDistName::Gaussian,
            major_axis: MajorAxis::Long,
        }
    }

    /// Uniform [-1, 1) entries, long-axis major.
    pub fn uniform(n_rows: i64, n_cols: i64) -> Self {
        Self {
            n_rows,
            n_cols,
            family: DenseDistName::Uniform,
            major_axis: MajorAxis::Long,
        }
    }
}

fn validate_dense_dist(dist: &DenseDist) -> Result<()> {
    if dist.n_rows <= 0 || dist.n_cols <= 0 {
        return Err(Error::invalid_distribution(format!(
            "dimensions must be positive, got {} x {}",
            dist.n_rows, dist.n_cols
        )));
    }
    Ok(())
}

/// Storage order that keeps the distribution's major axis contiguous.
pub fn dist_to_layout(dist: &DenseDist) -> Layout {
    let is_wide = dist.n_rows < dist.n_cols;
    let fa_long = dist.major_axis == MajorAxis::Long;
    match (is_wide, fa_long) {
        (true, true) => Layout::RowMajor,
        (true, false) => Layout::ColMajor,
        (false, true) => Layout::ColMajor,
        (false, false) => Layout::RowMajor,
    }
}

/// Row length of the implicit parent sample stream.
pub fn major_axis_length(dist: &DenseDist) -> i64 {
    match dist.major_axis {
        MajorAxis::Long => dist.n_rows.max(dist.n_cols),
        MajorAxis::Short => dist.n_rows.min(dist.n_cols),
    }
}

/// Wrapper to send a raw mutable pointer across thread boundaries.
/// Safety: the caller must ensure non-overlapping access between threads.
#[derive(Clone, Copy)]
struct SendMutPtr<T> {
    ptr: *mut T,
    len: usize,
}
unsafe impl<T> Send for SendMutPtr<T> {}
unsafe impl<T> Sync for SendMutPtr<T> {}

impl<T> SendMutPtr<T> {
    fn new(slice: &mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
        }
    }

    /// Get a mutable slice. Safety: caller ensures no aliasing.
    #[allow(clippy::mut_from_ref)]
    unsafe fn as_mut_slice(&self) -> &mut [T] {
        std::slice::from_raw_parts_mut(self.ptr, self.len)
    }
}

/// Fill `smat` with the `n_srows x n_scols` row-major submatrix that
/// starts at linear offset `ptr` of an implicit row-major parent whose row
/// length is `n_cols_parent`.
///
/// Rows are dispatched to workers independently; every row's counter is
/// derived from its absolute start block, so the output is bit-identical
/// for any thread count. `lda` is the destination row stride.
pub fn fill_dense_submat<T: Scalar>(
    n_cols_parent: i64,
    smat: &mut [T],
    n_srows: i64,
    n_scols: i64,
    ptr: i64,
    state: &RNGState,
    lda: i64,
    op: BlockOp,
) -> Result<()> {
    if n_srows <= 0 || n_scols <= 0 {
        return Err(Error::invalid_argument(
            "n_srows/n_scols",
            format!("submatrix dimensions must be positive, got {} x {}", n_srows, n_scols),
        ));
    }
    if n_scols > n_cols_parent {
        return Err(Error::dimension_mismatch("n_cols_parent", n_scols, n_cols_parent));
    }
    if lda < n_scols {
        return Err(Error::dimension_mismatch("lda", n_scols, lda));
    }
    let needed = ((n_srows - 1) * lda + n_scols) as usize;
    if smat.len() < needed {
        return Err(Error::dimension_mismatch("smat.len()", needed as i64, smat.len() as i64));
    }
    fill_dense_submat_impl(n_cols_parent, smat, n_srows, n_scols, ptr, state, lda, op);
    Ok(())
}

fn fill_dense_submat_impl<T: Scalar>(
    n_cols_parent: i64,
    smat: &mut [T],
    n_srows: i64,
    n_scols: i64,
    ptr: i64,
    state: &RNGState,
    lda: i64,
    op: BlockOp,
) {
    let w = BLOCK_WIDTH as i64;
    let dst = SendMutPtr::new(smat);
    let state = *state;
    // A handful of rows is not worth a thread spawn.
    const MIN_ROWS_PER_WORKER: usize = 4;
    parallel_for_chunks(0, n_srows as usize, MIN_ROWS_PER_WORKER, |row_start, row_end| {
        // Safety: each row writes only [row * lda, row * lda + n_scols),
        // and lda >= n_scols, so chunks touch disjoint ranges.
        let smat = unsafe { dst.as_mut_slice() };
        for row in row_start..row_end {
            let i0 = ptr + row as i64 * n_cols_parent; // first parent index of this row
            let i1 = i0 + n_scols - 1; // last parent index of this row
            let r0 = i0 / w; // first block
            let r1 = i1 / w; // last block
            let s0 = (i0 % w) as usize;
            let e1 = (i1 % w) as usize;

            // Absolute counter for this row: the same bytes come out no
            // matter which worker runs it.
            let mut ctr = state.incr(r0 as u64);
            let mut vals = op(ctr.generate());
            let mut ind = row * lda as usize;
            let head_end = if r1 > r0 { BLOCK_WIDTH - 1 } else { e1 };
            for &v in &vals[s0..=head_end] {
                smat[ind] = T::from_f64(v);
                ind += 1;
            }
            for _ in (r0 + 1)..r1 {
                ctr = ctr.incr(1);
                vals = op(ctr.generate());
                for &v in &vals {
                    smat[ind] = T::from_f64(v);
                    ind += 1;
                }
            }
            if r1 > r0 {
                ctr = ctr.incr(1);
                vals = op(ctr.generate());
                for &v in &vals[..=e1] {
                    smat[ind] = T::from_f64(v);
                    ind += 1;
                }
            }
        }
    });
}

/// Materialize the `n_rows x n_cols` block of the parent stream anchored
/// at `(i_off, j_off)` into `buff`.
///
/// The block is written in the distribution's natural storage order
/// (column-major parents are filled through their transposed view, so the
/// flat filler only ever sees a row-major stream). Returns that layout and
/// the state whose counter sits strictly after every block the tile
/// consumed.
pub fn fill_dense<T: Scalar>(
    dist: &DenseDist,
    n_rows: i64,
    n_cols: i64,
    i_off: i64,
    j_off: i64,
    buff: &mut [T],
    seed: &RNGState,
) -> Result<(Layout, RNGState)> {
    validate_dense_dist(dist)?;
    let op: BlockOp = match dist.family {
        DenseDistName::Gaussian => boxmul,
        DenseDistName::Uniform => uneg11,
        DenseDistName::BlackBox => {
            return Err(Error::invalid_argument(
                "dist",
                "fill_dense cannot sample a BlackBox distribution",
            ))
        }
    };
    if n_rows <= 0 || n_cols <= 0 || i_off < 0 || j_off < 0 {
        return Err(Error::invalid_argument(
            "n_rows/n_cols/i_off/j_off",
            format!(
                "block must be positive-sized at a nonnegative anchor, got {} x {} at ({}, {})",
                n_rows, n_cols, i_off, j_off
            ),
        ));
    }
    if dist.n_rows < n_rows + i_off {
        return Err(Error::dimension_mismatch("dist.n_rows", n_rows + i_off, dist.n_rows));
    }
    if dist.n_cols < n_cols + j_off {
        return Err(Error::dimension_mismatch("dist.n_cols", n_cols + j_off, dist.n_cols));
    }
    if buff.len() < (n_rows * n_cols) as usize {
        return Err(Error::dimension_mismatch(
            "buff.len()",
            n_rows * n_cols,
            buff.len() as i64,
        ));
    }

    let ma_len = major_axis_length(dist);
    let layout = dist_to_layout(dist);
    // The filler works on a row-major stream; a column-major destination
    // is the transposed view of the same block.
    let (nr, nc, ro, co) = match layout {
        Layout::RowMajor => (n_rows, n_cols, i_off, j_off),
        Layout::ColMajor => (n_cols, n_rows, j_off, i_off),
    };
    let ptr = ro * ma_len + co;
    fill_dense_submat_impl(ma_len, buff, nr, nc, ptr, seed, nc, op);

    let last = ptr + (nr - 1) * ma_len + nc - 1;
    let next_state = seed.incr((last / BLOCK_WIDTH as i64 + 1) as u64);
    Ok((layout, next_state))
}

/// A sample from a prescribed distribution over dense sketching operators.
///
/// Construction records the seed; entries are not sampled until
/// [`realize_full`] or until an apply routine needs them (in which case a
/// temporary minimal tile is realized and dropped without touching the
/// operator). `next_state` is populated only by explicit realization.
#[derive(Debug, Clone)]
pub struct DenseSkOp<T> {
    /// The distribution this operator is sampled from.
    pub dist: DenseDist,
    /// State handed to the generator when sampling from scratch.
    pub seed_state: RNGState,
    /// State for the next consumer of the stream, once realized.
    pub next_state: Option<RNGState>,
    /// Storage order of the realized buffer, derived from `dist`.
    pub layout: Layout,
    buff: Option<Vec<T>>,
}

impl<T: Scalar> DenseSkOp<T> {
    /// An unrealized operator. `BlackBox` distributions have no sampling
    /// rule, so they must come in through [`DenseSkOp::with_buffer`].
    pub fn new(dist: DenseDist, state: RNGState) -> Result<Self> {
        validate_dense_dist(&dist)?;
        if dist.family == DenseDistName::BlackBox {
            return Err(Error::invalid_distribution(
                "BlackBox requires a user-provided buffer",
            ));
        }
        Ok(Self {
            dist,
            seed_state: state,
            next_state: None,
            layout: dist_to_layout(&dist),
            buff: None,
        })
    }

    /// An operator whose entries are already in `buff`, stored in
    /// `dist_to_layout(&dist)` order.
    pub fn with_buffer(dist: DenseDist, state: RNGState, buff: Vec<T>) -> Result<Self> {
        validate_dense_dist(&dist)?;
        let expected = (dist.n_rows * dist.n_cols) as usize;
        if buff.len() != expected {
            return Err(Error::dimension_mismatch(
                "buff.len()",
                expected as i64,
                buff.len() as i64,
            ));
        }
        Ok(Self {
            dist,
            seed_state: state,
            next_state: None,
            layout: dist_to_layout(&dist),
            buff: Some(buff),
        })
    }

    pub(crate) fn from_parts(
        dist: DenseDist,
        seed_state: RNGState,
        layout: Layout,
        buff: Vec<T>,
    ) -> Self {
        Self {
            dist,
            seed_state,
            next_state: None,
            layout,
            buff: Some(buff),
        }
    }

    /// The realized entries, if any.
    #[inline]
    pub fn buffer(&self) -> Option<&[T]> {
        self.buff.as_deref()
    }
}

/// Sample the full operator into a freshly allocated buffer and record its
/// successor state. Fails if a buffer is already attached.
pub fn realize_full<T: Scalar>(s: &mut DenseSkOp<T>) -> Result<RNGState> {
    if s.buff.is_some() {
        return Err(Error::invalid_argument(
            "s",
            "operator already has a buffer attached",
        ));
    }
    let mut buff = vec![T::zero(); (s.dist.n_rows * s.dist.n_cols) as usize];
    let (_, next_state) = fill_dense(
        &s.dist,
        s.dist.n_rows,
        s.dist.n_cols,
        0,
        0,
        &mut buff,
        &s.seed_state,
    )?;
    s.buff = Some(buff);
    s.next_state = Some(next_state);
    Ok(next_state)
}

/// Pre-op dimensions of a matrix whose post-op shape is rows x cols.
#[inline]
pub(crate) fn dims_before_op(rows: i64, cols: i64, op: Op) -> (i64, i64) {
    match op {
        Op::NoTrans => (rows, cols),
        Op::Trans => (cols, rows),
    }
}

/// Linear anchor and leading dimension of the `(i_off, j_off)` submatrix
/// inside a parent buffer of the given layout and shape.
#[inline]
pub(crate) fn offset_and_ldim(
    layout: Layout,
    n_rows: i64,
    n_cols: i64,
    i_off: i64,
    j_off: i64,
) -> (i64, i64) {
    match layout {
        Layout::ColMajor => (i_off + n_rows * j_off, n_rows),
        Layout::RowMajor => (i_off * n_cols + j_off, n_cols),
    }
}

/// Realize only the `(n_rows x n_cols)`-at-`(i_off, j_off)` tile of `s`
/// into a temporary black-box operator anchored at (0, 0).
pub(crate) fn submatrix_as_blackbox<T: Scalar>(
    s: &DenseSkOp<T>,
    n_rows: i64,
    n_cols: i64,
    i_off: i64,
    j_off: i64,
) -> Result<DenseSkOp<T>> {
    let mut buff = vec![T::zero(); (n_rows * n_cols) as usize];
    let (layout, _) = fill_dense(&s.dist, n_rows, n_cols, i_off, j_off, &mut buff, &s.seed_state)?;
    let dist = DenseDist {
        n_rows,
        n_cols,
        family: DenseDistName::BlackBox,
        major_axis: s.dist.major_axis,
    };
    Ok(DenseSkOp::from_parts(dist, s.seed_state, layout, buff))
}

/// LSKGE3: mat(B) = alpha * op(submat(S)) * op(mat(A)) + beta * mat(B)
///
/// where op(submat(S)) is d x m, op(mat(A)) is m x n, and mat(B) is d x n.
/// `submat(S)` is anchored at `(i_off, j_off)` of S; if the operator is
/// unrealized, only that tile is sampled, used, and dropped. When the
/// operator's storage order differs from `layout`, the transpose flag on S
/// is flipped instead of copying the buffer. Exactly one GEMM call is
/// issued.
pub fn lskge3<T: GemmScalar>(
    layout: Layout,
    op_s: Op,
    op_a: Op,
    d: i64,
    n: i64,
    m: i64,
    alpha: T,
    s: &DenseSkOp<T>,
    i_off: i64,
    j_off: i64,
    a: &[T],
    lda: i64,
    beta: T,
    b: &mut [T],
    ldb: i64,
) -> Result<()> {
    let (rows_submat_s, cols_submat_s) = dims_before_op(d, m, op_s);
    let Some(s_buff) = s.buffer() else {
        let tile = submatrix_as_blackbox(s, rows_submat_s, cols_submat_s, i_off, j_off)?;
        return lskge3(layout, op_s, op_a, d, n, m, alpha, &tile, 0, 0, a, lda, beta, b, ldb);
    };

    if s.dist.n_rows < rows_submat_s + i_off {
        return Err(Error::dimension_mismatch(
            "S.dist.n_rows",
            rows_submat_s + i_off,
            s.dist.n_rows,
        ));
    }
    if s.dist.n_cols < cols_submat_s + j_off {
        return Err(Error::dimension_mismatch(
            "S.dist.n_cols",
            cols_submat_s + j_off,
            s.dist.n_cols,
        ));
    }
    let (rows_a, cols_a) = dims_before_op(m, n, op_a);
    if layout == Layout::ColMajor {
        if lda < rows_a {
            return Err(Error::dimension_mismatch("lda", rows_a, lda));
        }
        if ldb < d {
            return Err(Error::dimension_mismatch("ldb", d, ldb));
        }
    } else {
        if lda < cols_a {
            return Err(Error::dimension_mismatch("lda", cols_a, lda));
        }
        if ldb < n {
            return Err(Error::dimension_mismatch("ldb", n, ldb));
        }
    }

    let op_s = if s.layout == layout { op_s } else { op_s.flip() };
    let (pos, lds) = offset_and_ldim(s.layout, s.dist.n_rows, s.dist.n_cols, i_off, j_off);

    T::gemm(
        layout,
        op_s,
        op_a,
        d as usize,
        n as usize,
        m as usize,
        alpha,
        &s_buff[pos as usize..],
        lds as usize,
        a,
        lda as usize,
        beta,
        b,
        ldb as usize,
    );
    Ok(())
}

/// RSKGE3: mat(B) = alpha * op(mat(A)) * op(submat(S)) + beta * mat(B)
///
/// where op(mat(A)) is m x n, op(submat(S)) is n x d, and mat(B) is m x d.
/// The right-multiplication analogue of [`lskge3`].
pub fn rskge3<T: GemmScalar>(
    layout: Layout,
    op_a: Op,
    op_s: Op,
    m: i64,
    d: i64,
    n: i64,
    alpha: T,
    a: &[T],
    lda: i64,
    s: &DenseSkOp<T>,
    i_off: i64,
    j_off: i64,
    beta: T,
    b: &mut [T],
    ldb: i64,
) -> Result<()> {
    let (rows_submat_s, cols_submat_s) = dims_before_op(n, d, op_s);
    let Some(s_buff) = s.buffer() else {
        let tile = submatrix_as_blackbox(s, rows_submat_s, cols_submat_s, i_off, j_off)?;
        return rskge3(layout, op_a, op_s, m, d, n, alpha, a, lda, &tile, 0, 0, beta, b, ldb);
    };

    if s.dist.n_rows < rows_submat_s + i_off {
        return Err(Error::dimension_mismatch(
            "S.dist.n_rows",
            rows_submat_s + i_off,
            s.dist.n_rows,
        ));
    }
    if s.dist.n_cols < cols_submat_s + j_off {
        return Err(Error::dimension_mismatch(
            "S.dist.n_cols",
            cols_submat_s + j_off,
            s.dist.n_cols,
        ));
    }
    let (rows_a, cols_a) = dims_before_op(m, n, op_a);
    if layout == Layout::ColMajor {
        if lda < rows_a {
            return Err(Error::dimension_mismatch("lda", rows_a, lda));
        }
        if ldb < m {
            return Err(Error::dimension_mismatch("ldb", m, ldb));
        }
    } else {
        if lda < cols_a {
            return Err(Error::dimension_mismatch("lda", cols_a, lda));
        }
        if ldb < d {
            return Err(Error::dimension_mismatch("ldb", d, ldb));
        }
    }

    let op_s = if s.layout == layout { op_s } else { op_s.flip() };
    let (pos, lds) = offset_and_ldim(s.layout, s.dist.n_rows, s.dist.n_cols, i_off, j_off);

    T::gemm(
        layout,
        op_a,
        op_s,
        m as usize,
        d as usize,
        n as usize,
        alpha,
        a,
        lda as usize,
        &s_buff[pos as usize..],
        lds as usize,
        beta,
        b,
        ldb as usize,
    );
    Ok(())
}
