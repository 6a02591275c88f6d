//! Sparse sketching operators.
//!
//! A sparse operator places a fixed number of +/-1 entries in every
//! minor-axis slice, sampled without replacement by a repeated
//! Fisher-Yates shuffle. Slice `i` consumes exactly the counters
//! `seed.counter + i * vec_nnz ..`, and the working permutation is
//! restored after every slice, so any slice can be regenerated in
//! isolation. Storage is COO; transposition is a borrowed view that swaps
//! the row and column slices.

use randmat_core::coo::{CooRef, IndexBase};
use randmat_core::error::{Error, Result};
use randmat_core::layout::MajorAxis;
use randmat_core::rng::RNGState;
use randmat_core::scalar::Scalar;
use smallvec::{smallvec, SmallVec};

/// A distribution over sparse sketching operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseDist {
    /// Matrices drawn from this distribution have this many rows.
    pub n_rows: i64,
    /// Matrices drawn from this distribution have this many columns.
    pub n_cols: i64,
    /// Nonzeros per major-axis vector: exact for short-axis major, an
    /// upper bound in the long-axis wording (the sampler still emits
    /// exactly this many distinct indices per slice).
    pub vec_nnz: i64,
    /// Which axis carries the fixed sparsity pattern.
    pub major_axis: MajorAxis,
}

impl SparseDist {
    /// Short-axis-sparse distribution (a SASO): `vec_nnz` nonzeros in
    /// every short-axis vector.
    pub fn saso(n_rows: i64, n_cols: i64, vec_nnz: i64) -> Self {
        Self {
            n_rows,
            n_cols,
            vec_nnz,
            major_axis: MajorAxis::Short,
        }
    }

    /// Long-axis-sparse distribution (a LASO).
    pub fn laso(n_rows: i64, n_cols: i64, vec_nnz: i64) -> Self {
        Self {
            n_rows,
            n_cols,
            vec_nnz,
            major_axis: MajorAxis::Long,
        }
    }

    #[inline]
    fn short_len(&self) -> i64 {
        self.n_rows.min(self.n_cols)
    }

    #[inline]
    fn long_len(&self) -> i64 {
        self.n_rows.max(self.n_cols)
    }
}

fn validate_sparse_dist(dist: &SparseDist) -> Result<()> {
    if dist.n_rows <= 0 || dist.n_cols <= 0 {
        return Err(Error::invalid_distribution(format!(
            "dimensions must be positive, got {} x {}",
            dist.n_rows, dist.n_cols
        )));
    }
    if dist.vec_nnz <= 0 {
        return Err(Error::invalid_distribution(format!(
            "vec_nnz must be positive, got {}",
            dist.vec_nnz
        )));
    }
    if dist.vec_nnz > dist.short_len() {
        return Err(Error::invalid_distribution(format!(
            "vec_nnz ({}) exceeds the short-axis length ({})",
            dist.vec_nnz,
            dist.short_len()
        )));
    }
    Ok(())
}

/// Number of stored entries of an operator drawn from `dist`: one group of
/// `vec_nnz` per minor-axis slice.
pub fn nnz_count(dist: &SparseDist) -> i64 {
    match dist.major_axis {
        MajorAxis::Short => dist.vec_nnz * dist.long_len(),
        MajorAxis::Long => dist.vec_nnz * dist.short_len(),
    }
}

/// Whether every column of an operator drawn from `dist` has exactly
/// `vec_nnz` nonzeros.
pub fn has_fixed_nnz_per_col(dist: &SparseDist) -> bool {
    match dist.major_axis {
        MajorAxis::Short => dist.n_rows < dist.n_cols,
        MajorAxis::Long => dist.n_cols < dist.n_rows,
    }
}

/// Scale that makes the operator an isometry in expectation. Exposed for
/// callers; never applied internally.
pub fn isometry_scale_factor<T: Scalar>(dist: &SparseDist) -> T {
    let vec_nnz = dist.vec_nnz as f64;
    let scale = match dist.major_axis {
        MajorAxis::Short => vec_nnz.powf(-0.5),
        MajorAxis::Long => {
            let minor = dist.short_len() as f64;
            let major = dist.long_len() as f64;
            (major / (vec_nnz * minor)).sqrt()
        }
    };
    T::from_f64(scale)
}

/// Sample `dim_minor` independent size-`vec_nnz` subsets of
/// `{0, .., dim_major - 1}` without replacement.
///
/// Subset `i` lands in `idxs_major[i * vec_nnz ..][.. vec_nnz]`; when
/// provided, `idxs_minor` receives the slice index and `vals` a +/-1 sign
/// per draw. Slice `i` reads only counters `state.counter + i * vec_nnz`
/// onward, and the working permutation is restored between slices, so
/// slices are regenerable in isolation. Returns the input state unchanged;
/// use [`compute_next_state`] for chaining.
pub fn repeated_fisher_yates<T: Scalar>(
    state: &RNGState,
    vec_nnz: i64,
    dim_major: i64,
    dim_minor: i64,
    idxs_major: &mut [i64],
    mut idxs_minor: Option<&mut [i64]>,
    mut vals: Option<&mut [T]>,
) -> Result<RNGState> {
    if vec_nnz <= 0 || dim_major <= 0 || dim_minor < 0 {
        return Err(Error::invalid_argument(
            "vec_nnz/dim_major/dim_minor",
            format!("got {} / {} / {}", vec_nnz, dim_major, dim_minor),
        ));
    }
    if vec_nnz > dim_major {
        return Err(Error::invalid_distribution(format!(
            "cannot sample {} distinct indices from a set of {}",
            vec_nnz, dim_major
        )));
    }
    let k = vec_nnz as usize;
    let n = dim_major as usize;
    let total = k * dim_minor as usize;
    if idxs_major.len() < total {
        return Err(Error::dimension_mismatch(
            "idxs_major.len()",
            total as i64,
            idxs_major.len() as i64,
        ));
    }

    let mut vec_work: Vec<i64> = (0..dim_major).collect();
    let mut pivots: SmallVec<[usize; 8]> = smallvec![0; k];
    for i in 0..dim_minor as usize {
        let offset = i * k;
        let mut ctr = state.incr(offset as u64);
        for j in 0..k {
            // one step of Fisher-Yates shuffling
            let rv = ctr.generate();
            let ell = j + (rv[0] as usize) % (n - j);
            pivots[j] = ell;
            let drawn = vec_work[ell];
            vec_work[ell] = vec_work[j];
            vec_work[j] = drawn;
            idxs_major[offset + j] = drawn;
            if let Some(vals) = vals.as_deref_mut() {
                vals[offset + j] = if rv[1] % 2 == 0 { T::one() } else { -T::one() };
            }
            if let Some(minor) = idxs_minor.as_deref_mut() {
                minor[offset + j] = i as i64;
            }
            ctr = ctr.incr(1);
        }
        // Undo the swaps so the next slice shuffles the identity
        // permutation again; this is what lets any slice be regenerated
        // from its base counter alone.
        for j in (0..k).rev() {
            let ell = pivots[j];
            let drawn = idxs_major[offset + j];
            vec_work[j] = vec_work[ell];
            vec_work[ell] = drawn;
        }
    }
    Ok(*state)
}

/// Index-only convenience: `dim_minor` sampled index subsets, no signs, no
/// minor indices.
pub fn sample_index_subsets(
    state: &RNGState,
    vec_nnz: i64,
    dim_major: i64,
    dim_minor: i64,
    idxs: &mut [i64],
) -> Result<RNGState> {
    repeated_fisher_yates::<f64>(state, vec_nnz, dim_major, dim_minor, idxs, None, None)
}

/// State for the next consumer of the stream after an operator drawn from
/// `dist` has been sampled.
pub fn compute_next_state(dist: &SparseDist, state: RNGState) -> RNGState {
    let minor_len = match dist.major_axis {
        MajorAxis::Short => dist.short_len(),
        MajorAxis::Long => dist.long_len(),
    };
    state.incr((minor_len * dist.vec_nnz) as u64)
}

/// A sample from a prescribed distribution over sparse matrices, stored as
/// COO triplets.
#[derive(Debug, Clone)]
pub struct SparseSkOp<T> {
    /// The distribution this operator is sampled from.
    pub dist: SparseDist,
    /// State handed to the generator when sampling from scratch.
    pub seed_state: RNGState,
    /// State for the next consumer of the stream. A pure function of
    /// `(dist, seed_state)`, so it is available before filling.
    pub next_state: RNGState,
    /// Sufficient condition that the triplet arrays hold sampled data.
    pub known_filled: bool,
    rows: Vec<i64>,
    cols: Vec<i64>,
    vals: Vec<T>,
}

/// A borrowed, shallow view of a sparse operator. Transposition swaps the
/// row and column slices without copying.
#[derive(Debug, Clone, Copy)]
pub struct SparseSkOpView<'a, T> {
    pub dist: SparseDist,
    pub seed_state: RNGState,
    pub next_state: RNGState,
    pub rows: &'a [i64],
    pub cols: &'a [i64],
    pub vals: &'a [T],
}

impl<T: Scalar> SparseSkOp<T> {
    /// An unfilled operator owning zeroed triplet storage sized for its
    /// distribution.
    pub fn new(dist: SparseDist, state: RNGState) -> Result<Self> {
        validate_sparse_dist(&dist)?;
        let nnz = nnz_count(&dist) as usize;
        Ok(Self {
            dist,
            seed_state: state,
            next_state: compute_next_state(&dist, state),
            known_filled: false,
            rows: vec![0; nnz],
            cols: vec![0; nnz],
            vals: vec![T::zero(); nnz],
        })
    }

    /// An operator over caller-provided triplet storage. Set
    /// `known_filled` when the arrays already hold sampled data.
    pub fn from_triplets(
        dist: SparseDist,
        state: RNGState,
        rows: Vec<i64>,
        cols: Vec<i64>,
        vals: Vec<T>,
        known_filled: bool,
    ) -> Result<Self> {
        validate_sparse_dist(&dist)?;
        let nnz = nnz_count(&dist) as usize;
        if rows.len() != nnz || cols.len() != nnz || vals.len() != nnz {
            return Err(Error::dimension_mismatch(
                "rows/cols/vals lengths",
                nnz as i64,
                rows.len().min(cols.len()).min(vals.len()) as i64,
            ));
        }
        Ok(Self {
            dist,
            seed_state: state,
            next_state: compute_next_state(&dist, state),
            known_filled,
            rows,
            cols,
            vals,
        })
    }

    /// Stored entry count (one group of `vec_nnz` per minor-axis slice).
    #[inline]
    pub fn nnz(&self) -> i64 {
        nnz_count(&self.dist)
    }

    pub fn rows(&self) -> &[i64] {
        &self.rows
    }

    pub fn cols(&self) -> &[i64] {
        &self.cols
    }

    pub fn vals(&self) -> &[T] {
        &self.vals
    }

    /// Borrow as a shallow view.
    pub fn view(&self) -> SparseSkOpView<'_, T> {
        SparseSkOpView {
            dist: self.dist,
            seed_state: self.seed_state,
            next_state: self.next_state,
            rows: &self.rows,
            cols: &self.cols,
            vals: &self.vals,
        }
    }

    /// The transposed view: same memory, rows and cols swapped. The
    /// operator must have been filled; an unfilled transpose would
    /// silently detach from the sampling rule.
    pub fn transpose(&self) -> Result<SparseSkOpView<'_, T>> {
        if !self.known_filled {
            return Err(Error::invalid_argument(
                "self",
                "cannot transpose an unfilled sparse operator",
            ));
        }
        Ok(self.view().transpose())
    }

    /// Zero-copy COO view of the sampled data.
    pub fn coo_view(&self) -> Result<CooRef<'_, T>> {
        if !self.known_filled {
            return Err(Error::invalid_argument(
                "self",
                "sparse operator has not been filled",
            ));
        }
        Ok(self.view().coo_view())
    }
}

impl<'a, T: Scalar> SparseSkOpView<'a, T> {
    /// Swap rows with cols and the dimensions with each other. An
    /// involution: transposing twice gives back the original view.
    #[must_use]
    pub fn transpose(self) -> SparseSkOpView<'a, T> {
        SparseSkOpView {
            dist: SparseDist {
                n_rows: self.dist.n_cols,
                n_cols: self.dist.n_rows,
                ..self.dist
            },
            rows: self.cols,
            cols: self.rows,
            ..self
        }
    }

    /// Zero-copy COO view over the same triplet arrays.
    pub fn coo_view(&self) -> CooRef<'a, T> {
        CooRef {
            n_rows: self.dist.n_rows,
            n_cols: self.dist.n_cols,
            nnz: nnz_count(&self.dist),
            rows: self.rows,
            cols: self.cols,
            vals: self.vals,
            index_base: IndexBase::Zero,
        }
    }
}

/// Sample the operator's triplets from its distribution.
///
/// Short-axis major: the sampler draws short-axis indices, one subset per
/// long-axis slice. Long-axis major swaps the two roles. Wide operators
/// write short-axis indices to `rows`; tall operators to `cols`.
pub fn fill_sparse<T: Scalar>(s: &mut SparseSkOp<T>) -> Result<()> {
    let short_len = s.dist.short_len();
    let long_len = s.dist.long_len();
    let is_wide = s.dist.n_rows == short_len;
    let vec_nnz = s.dist.vec_nnz;
    let major_axis = s.dist.major_axis;
    let seed = s.seed_state;

    let SparseSkOp { rows, cols, vals, .. } = s;
    let (short_idxs, long_idxs) = if is_wide { (rows, cols) } else { (cols, rows) };

    match major_axis {
        MajorAxis::Short => repeated_fisher_yates(
            &seed,
            vec_nnz,
            short_len,
            long_len,
            short_idxs,
            Some(&mut long_idxs[..]),
            Some(&mut vals[..]),
        )?,
        MajorAxis::Long => repeated_fisher_yates(
            &seed,
            vec_nnz,
            long_len,
            short_len,
            long_idxs,
            Some(&mut short_idxs[..]),
            Some(&mut vals[..]),
        )?,
    };
    s.known_filled = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fisher_yates_subsets_are_distinct() {
        let state = RNGState::new(42);
        let (k, n, r) = (3usize, 7usize, 5usize);
        let mut idxs = vec![0i64; k * r];
        let mut minor = vec![0i64; k * r];
        let mut vals = vec![0.0f64; k * r];
        repeated_fisher_yates(
            &state,
            k as i64,
            n as i64,
            r as i64,
            &mut idxs,
            Some(&mut minor[..]),
            Some(&mut vals[..]),
        )
        .unwrap();

        for slice in 0..r {
            let group = &idxs[slice * k..(slice + 1) * k];
            for (a, &x) in group.iter().enumerate() {
                assert!((0..n as i64).contains(&x));
                for &y in &group[a + 1..] {
                    assert_ne!(x, y, "duplicate index in slice {}", slice);
                }
            }
            for &m in &minor[slice * k..(slice + 1) * k] {
                assert_eq!(m, slice as i64);
            }
        }
        for &v in &vals {
            assert!(v == 1.0 || v == -1.0);
        }
    }

    #[test]
    fn test_fisher_yates_slice_independence() {
        // Slice i regenerated alone, from the advanced counter, matches
        // the batch output.
        let state = RNGState::new(9);
        let (k, n, r) = (2i64, 11i64, 6i64);
        let mut batch = vec![0i64; (k * r) as usize];
        sample_index_subsets(&state, k, n, r, &mut batch).unwrap();

        for i in 0..r {
            let mut single = vec![0i64; k as usize];
            let shifted = state.incr((i * k) as u64);
            sample_index_subsets(&shifted, k, n, 1, &mut single).unwrap();
            assert_eq!(
                &batch[(i * k) as usize..((i + 1) * k) as usize],
                &single[..],
                "slice {} depends on earlier slices",
                i
            );
        }
    }

    #[test]
    fn test_fisher_yates_rejects_oversampling() {
        let state = RNGState::new(0);
        let mut idxs = vec![0i64; 8];
        assert!(sample_index_subsets(&state, 4, 3, 2, &mut idxs).is_err());
    }

    #[test]
    fn test_sparse_dist_validation() {
        assert!(SparseSkOp::<f64>::new(SparseDist::saso(0, 5, 1), RNGState::new(0)).is_err());
        assert!(SparseSkOp::<f64>::new(SparseDist::saso(4, 5, 0), RNGState::new(0)).is_err());
        assert!(SparseSkOp::<f64>::new(SparseDist::saso(4, 5, 5), RNGState::new(0)).is_err());
        assert!(SparseSkOp::<f64>::new(SparseDist::saso(4, 5, 4), RNGState::new(0)).is_ok());
    }

    #[test]
    fn test_nnz_count_table() {
        // wide SASO: vec_nnz per column
        assert_eq!(nnz_count(&SparseDist::saso(7, 20, 3)), 60);
        // tall SASO: vec_nnz per row
        assert_eq!(nnz_count(&SparseDist::saso(20, 7, 3)), 60);
        // wide LASO: groups along rows
        assert_eq!(nnz_count(&SparseDist::laso(7, 20, 3)), 21);
        // tall LASO: groups along columns
        assert_eq!(nnz_count(&SparseDist::laso(20, 7, 3)), 21);
    }

    #[test]
    fn test_compute_next_state() {
        let state = RNGState::new(1);
        let saso = SparseDist::saso(7, 20, 3);
        assert_eq!(compute_next_state(&saso, state), state.incr(21));
        let laso = SparseDist::laso(7, 20, 3);
        assert_eq!(compute_next_state(&laso, state), state.incr(60));
    }

    #[test]
    fn test_transpose_round_trip() {
        let mut s = SparseSkOp::<f64>::new(SparseDist::saso(5, 9, 2), RNGState::new(3)).unwrap();
        assert!(s.transpose().is_err());
        fill_sparse(&mut s).unwrap();

        let t = s.transpose().unwrap();
        assert_eq!(t.dist.n_rows, 9);
        assert_eq!(t.dist.n_cols, 5);
        assert_eq!(t.rows, s.cols());
        assert_eq!(t.cols, s.rows());

        let tt = t.transpose();
        assert_eq!(tt.dist, s.dist);
        assert_eq!(tt.rows, s.rows());
        assert_eq!(tt.cols, s.cols());
        assert_eq!(tt.vals, s.vals());
    }

    #[test]
    fn test_isometry_scale_factors() {
        let saso = SparseDist::saso(8, 32, 4);
        let got: f64 = isometry_scale_factor(&saso);
        assert!((got - 0.5).abs() < 1e-15);

        let laso = SparseDist::laso(8, 32, 4);
        let got: f64 = isometry_scale_factor(&laso);
        let expect = (32.0f64 / (4.0 * 8.0)).sqrt();
        assert!((got - expect).abs() < 1e-15);
    }

    #[test]
    fn test_fill_sparse_marks_filled() {
        let mut s = SparseSkOp::<f32>::new(SparseDist::saso(3, 10, 2), RNGState::new(7)).unwrap();
        assert!(!s.known_filled);
        fill_sparse(&mut s).unwrap();
        assert!(s.known_filled);
        // wide: short-axis indices are row indices
        for &r in s.rows() {
            assert!((0..3).contains(&r));
        }
        for &c in s.cols() {
            assert!((0..10).contains(&c));
        }
        let coo = s.coo_view().unwrap();
        assert_eq!(coo.nnz, 20);
    }
}
