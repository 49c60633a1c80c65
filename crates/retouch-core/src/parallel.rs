//! Row and batch iteration shared by the per-pixel stages.
//!
//! With the `parallel` feature (default) rows are processed with rayon;
//! without it (the WASM build) the same closure runs sequentially. Output is
//! identical in both modes because every row is computed independently.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Call `f(y, row)` for each `row_len`-sized row of `data`.
#[cfg(feature = "parallel")]
pub(crate) fn for_each_row<T, F>(data: &mut [T], row_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    if row_len == 0 {
        return;
    }
    data.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

/// Call `f(y, row)` for each `row_len`-sized row of `data` (single-threaded).
#[cfg(not(feature = "parallel"))]
pub(crate) fn for_each_row<T, F>(data: &mut [T], row_len: usize, f: F)
where
    F: Fn(usize, &mut [T]),
{
    if row_len == 0 {
        return;
    }
    data.chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

/// Map `f` over paired items, in parallel across the batch.
#[cfg(feature = "parallel")]
pub(crate) fn map_pairs<A, B, R, F>(a: &[A], b: &[B], f: F) -> Vec<R>
where
    A: Sync,
    B: Sync,
    R: Send,
    F: Fn(usize, &A, &B) -> R + Sync + Send,
{
    a.par_iter()
        .zip(b.par_iter())
        .enumerate()
        .map(|(i, (x, y))| f(i, x, y))
        .collect()
}

/// Map `f` over paired items, one after another.
#[cfg(not(feature = "parallel"))]
pub(crate) fn map_pairs<A, B, R, F>(a: &[A], b: &[B], f: F) -> Vec<R>
where
    F: Fn(usize, &A, &B) -> R,
{
    a.iter()
        .zip(b.iter())
        .enumerate()
        .map(|(i, (x, y))| f(i, x, y))
        .collect()
}
