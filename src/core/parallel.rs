//! Portable parallel iteration
//!
//! Data-parallel loops over panels and wake nodes go through these helpers:
//! with the `parallel` feature they use Rayon's work-stealing pool, otherwise
//! they fall back to sequential iteration. Every call is an independent
//! fork/join barrier; callers only write disjoint slots of pre-sized buffers.

/// Check whether parallel execution is compiled in
#[inline]
pub fn is_parallel_available() -> bool {
    cfg!(feature = "parallel")
}

/// Parallel map over a range of indices
#[cfg(feature = "parallel")]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    use rayon::prelude::*;
    (0..count).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    F: Fn(usize) -> U,
{
    (0..count).map(f).collect()
}

/// Parallel in-place update of a slice, one element per task
#[cfg(feature = "parallel")]
pub fn parallel_for_each_mut<T, F>(data: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    use rayon::prelude::*;
    data.par_iter_mut().enumerate().for_each(|(i, x)| f(i, x));
}

#[cfg(not(feature = "parallel"))]
pub fn parallel_for_each_mut<T, F>(data: &mut [T], f: F)
where
    F: Fn(usize, &mut T),
{
    data.iter_mut().enumerate().for_each(|(i, x)| f(i, x));
}
