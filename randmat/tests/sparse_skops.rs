//! Sparse operator construction: fixed sparsity per axis, distinct
//! indices within every sampled group, +/-1 values, reproducible slices.

use randmat::{
    compute_next_state, fill_sparse, has_fixed_nnz_per_col, sample_index_subsets, Layout,
    MajorAxis, RNGState, SparseDist, SparseSkOp,
};
use std::collections::HashSet;

const KEYS: [u32; 3] = [42, 0, 1];
const VEC_NNZS: [i64; 4] = [1, 2, 3, 7];

/// Every group of `vec_nnz` consecutive triplets must carry distinct
/// major-axis indices and a constant minor-axis index.
fn check_groups(major_idxs: &[i64], minor_idxs: &[i64], vec_nnz: i64, dim_major: i64) {
    let k = vec_nnz as usize;
    let mut seen = HashSet::new();
    for (group_no, (major, minor)) in major_idxs
        .chunks(k)
        .zip(minor_idxs.chunks(k))
        .enumerate()
    {
        seen.clear();
        for &idx in major {
            assert!(
                (0..dim_major).contains(&idx),
                "index {} out of range in group {}",
                idx,
                group_no
            );
            assert!(seen.insert(idx), "index {} duplicated in group {}", idx, group_no);
        }
        for &m in minor {
            assert_eq!(m, group_no as i64, "minor index wrong in group {}", group_no);
        }
    }
}

fn check_saso(d: i64, m: i64, key: u32, vec_nnz: i64) {
    let dist = SparseDist::saso(d, m, vec_nnz);
    let mut s = SparseSkOp::<f32>::new(dist, RNGState::new(key)).unwrap();
    fill_sparse(&mut s).unwrap();
    if d < m {
        // wide: every column gets vec_nnz distinct row indices
        assert!(has_fixed_nnz_per_col(&dist));
        check_groups(s.rows(), s.cols(), vec_nnz, d);
    } else {
        check_groups(s.cols(), s.rows(), vec_nnz, m);
    }
    for &v in s.vals() {
        assert!(v == 1.0 || v == -1.0, "value {} is not a sign", v);
    }
}

fn check_laso(d: i64, m: i64, key: u32, vec_nnz: i64) {
    let dist = SparseDist::laso(d, m, vec_nnz);
    let mut s = SparseSkOp::<f32>::new(dist, RNGState::new(key)).unwrap();
    fill_sparse(&mut s).unwrap();
    if d < m {
        // wide: groups run along rows, sampling column indices
        check_groups(s.cols(), s.rows(), vec_nnz, m);
    } else {
        check_groups(s.rows(), s.cols(), vec_nnz, d);
    }
}

#[test]
fn test_saso_7x20() {
    for key in KEYS {
        for vec_nnz in VEC_NNZS {
            check_saso(7, 20, key, vec_nnz);
        }
    }
}

#[test]
fn test_saso_tall_15x7() {
    for key in KEYS {
        for vec_nnz in VEC_NNZS {
            check_saso(15, 7, key, vec_nnz);
        }
    }
}

#[test]
fn test_laso_15x7_full_rows() {
    // vec_nnz equals the short-axis length: each column group draws 7
    // distinct row indices out of 15.
    for key in KEYS {
        check_laso(15, 7, key, 7);
    }
}

#[test]
fn test_laso_7x20() {
    for key in KEYS {
        for vec_nnz in VEC_NNZS {
            check_laso(7, 20, key, vec_nnz);
        }
    }
}

/// Densified column mass of a wide SASO: every column holds exactly
/// `vec_nnz` signed units.
#[test]
fn test_saso_column_mass() {
    let dist = SparseDist::saso(7, 20, 3);
    let mut s = SparseSkOp::<f64>::new(dist, RNGState::new(2)).unwrap();
    fill_sparse(&mut s).unwrap();
    let dense = s.coo_view().unwrap().to_dense(Layout::ColMajor);
    for j in 0..20 {
        let col = &dense[j * 7..(j + 1) * 7];
        let mass: f64 = col.iter().map(|v| v.abs()).sum();
        assert_eq!(mass, 3.0, "column {} mass", j);
    }
}

/// An operator's slice `i` depends only on `seed.counter + i * vec_nnz`:
/// a second operator seeded at that counter reproduces the slice as its
/// first group.
#[test]
fn test_operator_slice_independence() {
    let dist = SparseDist::saso(5, 13, 3);
    let seed = RNGState::new(77);
    let mut s = SparseSkOp::<f64>::new(dist, seed).unwrap();
    fill_sparse(&mut s).unwrap();

    let k = dist.vec_nnz as usize;
    for slice in [0usize, 4, 12] {
        let shifted = seed.incr((slice * k) as u64);
        let mut idxs = vec![0i64; k];
        sample_index_subsets(&shifted, dist.vec_nnz, 5, 1, &mut idxs).unwrap();
        assert_eq!(
            &s.rows()[slice * k..(slice + 1) * k],
            &idxs[..],
            "slice {} not independent",
            slice
        );
    }
}

#[test]
fn test_next_state_chains_operators() {
    let dist = SparseDist::laso(6, 9, 2);
    let seed = RNGState::new(11);
    let s = SparseSkOp::<f64>::new(dist, seed).unwrap();
    assert_eq!(s.next_state, compute_next_state(&dist, seed));
    assert_eq!(s.next_state, seed.incr(18));
    assert_eq!(dist.major_axis, MajorAxis::Long);
}
