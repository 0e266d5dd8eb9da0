// Rust guideline compliant 2026-10-14

//! Positional partitioning of the payment log across workers.

use std::ops::Range;

/// Largest worker count the aggregation operations accept.
pub const MAX_WORKERS: usize = 4_096;

/// Split `[0, total)` into `workers` contiguous, non-overlapping ranges.
///
/// The first `workers - 1` ranges hold exactly `total / workers` records each;
/// the last range absorbs the remainder. `workers == 0` is treated as one
/// partition and counts above [`MAX_WORKERS`] are clamped to it. When
/// `workers > total` every leading range is empty and the last range holds the
/// whole log.
///
/// The returned vector always has `workers.clamp(1, MAX_WORKERS)` entries.
#[must_use]
pub fn partition(total: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.clamp(1, MAX_WORKERS);
    let chunk = total / workers;

    let mut ranges: Vec<Range<usize>> = (0..workers - 1)
        .map(|i| i * chunk..(i + 1) * chunk)
        .collect();
    ranges.push((workers - 1) * chunk..total);
    ranges
}
