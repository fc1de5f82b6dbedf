use std::sync::OnceLock;

use rayon::prelude::*;

use super::addressing::PlaneWindow;

/// Upper bound on conversion threads; row conversion is memory bound and
/// stops scaling well before this.
pub(crate) const CONVERSION_MAX_WORKERS: usize = 8;

/// Rows handed to one worker should carry at least this many pixels.
const MIN_CHUNK_PIXELS: usize = 65_536;

/// Pre-initialize the conversion thread pool so the first large upload
/// doesn't pay the pool-creation cost. Safe to call multiple times.
pub(crate) fn warmup_pool() {
    install_conversion_pool(|| {});
}

#[inline(always)]
pub(crate) fn should_parallelize(pixel_count: usize, min_pixels: usize) -> bool {
    let workers = conversion_workers();
    if workers <= 1 {
        return false;
    }
    let min_chunk_total = MIN_CHUNK_PIXELS.saturating_mul(workers);
    pixel_count >= min_pixels.max(min_chunk_total)
}

#[inline]
pub(crate) fn conversion_workers() -> usize {
    static WORKERS: OnceLock<usize> = OnceLock::new();
    (*WORKERS.get_or_init(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }))
    .min(CONVERSION_MAX_WORKERS)
}

#[inline]
pub(crate) fn install_conversion_pool<F>(job: F)
where
    F: FnOnce() + Send,
{
    static POOL: OnceLock<Option<rayon::ThreadPool>> = OnceLock::new();
    if let Some(pool) = POOL
        .get_or_init(|| {
            let workers = conversion_workers();
            if workers <= 1 {
                return None;
            }
            rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|index| format!("surface-convert-{index}"))
                .build()
                .ok()
        })
        .as_ref()
    {
        pool.install(job);
    } else {
        job();
    }
}

/// Run `row_fn(row_index, row_bytes)` over every row of a validated
/// destination window, on the conversion pool when `parallel` is set.
///
/// Rows never alias, so the closure may read-modify-write its own row.
pub(crate) fn for_each_row_mut<F>(bytes: &mut [u8], window: PlaneWindow, parallel: bool, row_fn: F)
where
    F: Fn(usize, &mut [u8]) + Send + Sync,
{
    if window.rows == 0 || window.row_bytes == 0 {
        return;
    }
    let region = &mut bytes[window.offset..];
    let row_bytes = window.row_bytes;

    if parallel {
        install_conversion_pool(|| {
            region
                .par_chunks_mut(window.stride)
                .take(window.rows)
                .enumerate()
                .for_each(|(row, chunk)| row_fn(row, &mut chunk[..row_bytes]));
        });
        return;
    }

    for (row, chunk) in region.chunks_mut(window.stride).take(window.rows).enumerate() {
        row_fn(row, &mut chunk[..row_bytes]);
    }
}
