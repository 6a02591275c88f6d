//! Thread-parallel execution utilities for data-parallel fills.
//!
//! Scoped threads only: no pool, no runtime, and the scope join is the
//! only suspension point. Callers derive all randomness from absolute
//! chunk positions, so how the range gets split never affects results.

/// Execute `f` over contiguous chunks of `[start, end)`, in parallel when
/// the range is large enough to pay for thread spawns.
///
/// `min_chunk` is the smallest range worth handing to a worker; anything
/// smaller runs inline on the caller's thread. `f` receives
/// `(chunk_start, chunk_end)`.
pub fn parallel_for_chunks<F>(start: usize, end: usize, min_chunk: usize, f: F)
where
    F: Fn(usize, usize) + Sync + Send + Copy,
{
    if start >= end {
        return;
    }
    let total = end - start;
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(total.div_ceil(min_chunk.max(1)));
    if workers <= 1 {
        f(start, end);
        return;
    }
    let chunk = total.div_ceil(workers);
    std::thread::scope(|s| {
        for chunk_start in (start..end).step_by(chunk) {
            let chunk_end = (chunk_start + chunk).min(end);
            s.spawn(move || f(chunk_start, chunk_end));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_covers_range_exactly_once() {
        let counter = AtomicUsize::new(0);
        parallel_for_chunks(0, 1000, 16, |start, end| {
            counter.fetch_add(end - start, Ordering::Relaxed);
        });
        assert_eq!(counter.load(Ordering::Relaxed), 1000);
    }

    #[test]
    fn test_small_range_runs_inline() {
        // A range below min_chunk arrives as one piece.
        let calls = AtomicUsize::new(0);
        parallel_for_chunks(10, 13, 64, |start, end| {
            calls.fetch_add(1, Ordering::Relaxed);
            assert_eq!((start, end), (10, 13));
        });
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_empty_range() {
        let counter = AtomicUsize::new(0);
        parallel_for_chunks(5, 5, 1, |_, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }
}
