//! Pairwise dissimilarity with an optional pivot cache.
//!
//! The cache memoizes distances against a small set of "pivot" rows: the
//! first `m` entries of the per-fit permutation, with
//! `m = min(n, ceil(cache_multiplier * log10(n)))`. Lookups are keyed by a
//! reverse map from dataset index to pivot slot, so only the pivot axis is
//! ever consulted; all other pairs fall through to direct evaluation.
//!
//! Slots hold `f64` bit patterns in relaxed atomics. A slot is either the
//! sentinel or the final value, and recomputation is idempotent (same pair,
//! same value), so concurrent readers and writers of the same slot converge
//! without locks. This relies on full-width scalar stores being atomic,
//! which `AtomicU64` guarantees on every supported target.

use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::ArrayView2;

use crate::metric::Metric;

/// Sentinel bit pattern marking an unfilled slot. A cached value that is
/// exactly `-1.0` (possible only under the cosine loss) is indistinguishable
/// from an empty slot and is recomputed on every lookup, which is wasteful
/// but correct.
const EMPTY: u64 = (-1.0f64).to_bits();

/// Flat `n x m` store of distances to pivot rows.
pub(crate) struct PivotCache {
    slots: Vec<AtomicU64>,
    /// Dataset index -> pivot slot; `None` for non-pivot rows.
    reindex: Vec<Option<usize>>,
    width: usize,
}

impl PivotCache {
    /// Allocate an empty cache for `n` points against the given pivot rows.
    pub fn new(n: usize, pivots: &[usize]) -> Self {
        let width = pivots.len();
        let mut slots = Vec::new();
        slots.resize_with(n * width, || AtomicU64::new(EMPTY));
        let mut reindex = vec![None; n];
        for (slot, &j) in pivots.iter().enumerate() {
            reindex[j] = Some(slot);
        }
        Self {
            slots,
            reindex,
            width,
        }
    }
}

/// Computes point-to-point dissimilarity over a borrowed dataset,
/// memoizing the pivot axis when a cache is attached.
///
/// Rows are points. The second index of [`DistanceOracle::cached_dist`] is
/// the one checked against the pivot set; callers pass the reference point
/// there.
pub(crate) struct DistanceOracle<'a> {
    data: ArrayView2<'a, f64>,
    metric: Metric,
    cache: Option<PivotCache>,
}

impl<'a> DistanceOracle<'a> {
    pub fn new(data: ArrayView2<'a, f64>, metric: Metric, cache: Option<PivotCache>) -> Self {
        Self {
            data,
            metric,
            cache,
        }
    }

    /// Direct metric evaluation between rows `i` and `j`.
    pub fn dist(&self, i: usize, j: usize) -> f64 {
        self.metric.eval(self.data.row(i), self.data.row(j))
    }

    /// Dissimilarity with pivot memoization.
    ///
    /// Falls through to [`DistanceOracle::dist`] when no cache is attached
    /// or `j` is not a pivot row.
    pub fn cached_dist(&self, i: usize, j: usize) -> f64 {
        let Some(cache) = &self.cache else {
            return self.dist(i, j);
        };
        let Some(slot) = cache.reindex[j] else {
            return self.dist(i, j);
        };
        let cell = &cache.slots[i * cache.width + slot];
        let bits = cell.load(Ordering::Relaxed);
        if bits != EMPTY {
            return f64::from_bits(bits);
        }
        let d = self.dist(i, j);
        cell.store(d.to_bits(), Ordering::Relaxed);
        d
    }
}
