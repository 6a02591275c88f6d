//! CBLAS-style layout and transpose enumerations.
//!
//! Both row-major and column-major storage are supported throughout the
//! workspace; every kernel and apply routine takes a `Layout` parameter,
//! matching the CBLAS API convention.

/// Memory layout for matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Layout {
    /// Row-major (C-style): elements in a row are contiguous.
    #[default]
    RowMajor = 101,
    /// Column-major (Fortran-style): elements in a column are contiguous.
    ColMajor = 102,
}

/// Transpose operation for matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Op {
    /// No transpose.
    #[default]
    NoTrans = 111,
    /// Transpose.
    Trans = 112,
}

impl Layout {
    /// Leading dimension stride for an M x N matrix.
    #[inline(always)]
    pub fn leading_dim(self, rows: usize, cols: usize) -> usize {
        match self {
            Layout::RowMajor => cols,
            Layout::ColMajor => rows,
        }
    }

    /// Linear index into a flat array for element (i, j).
    #[inline(always)]
    pub fn index(self, i: usize, j: usize, ld: usize) -> usize {
        match self {
            Layout::RowMajor => i * ld + j,
            Layout::ColMajor => j * ld + i,
        }
    }

    /// The other storage order.
    #[inline(always)]
    #[must_use]
    pub fn flip(self) -> Layout {
        match self {
            Layout::RowMajor => Layout::ColMajor,
            Layout::ColMajor => Layout::RowMajor,
        }
    }
}

impl Op {
    /// NoTrans <-> Trans. Reading a buffer through the opposite layout
    /// transposes it, so layout reconciliation flips this flag instead of
    /// copying data.
    #[inline(always)]
    #[must_use]
    pub fn flip(self) -> Op {
        match self {
            Op::NoTrans => Op::Trans,
            Op::Trans => Op::NoTrans,
        }
    }
}

/// Which family of vectors a distribution treats as contiguous: the short
/// axis (columns of a wide matrix, rows of a tall one) or the long axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MajorAxis {
    Short,
    Long,
}

impl MajorAxis {
    pub fn as_char(self) -> char {
        match self {
            MajorAxis::Short => 'S',
            MajorAxis::Long => 'L',
        }
    }
}
