//! Exact PAM baseline: greedy seeding plus full swap scans.
//!
//! Every candidate exchange is scored over the entire dataset, so one swap
//! iteration costs O(k * n^2) distance evaluations. The loss-change formula
//! is the same one the bandit phase samples; here it is simply evaluated in
//! full.

use rayon::prelude::*;

use crate::bandit::argmin_by;
use crate::oracle::DistanceOracle;
use crate::swap::{calc_best_distances, SwapOutcome};

/// Greedy exact seeding: each step adds the point minimizing the total
/// clamped distance `sum_j min(dist(i, j), best[j])`.
///
/// Shared by the exact solvers; with `k = 1` this is the exact 1-medoid.
pub(crate) fn run_build_exact(
    oracle: &DistanceOracle<'_>,
    n: usize,
    k: usize,
) -> (Vec<usize>, Vec<f64>) {
    let mut medoids: Vec<usize> = Vec::with_capacity(k);
    let mut best = vec![f64::INFINITY; n];

    for _ in 0..k {
        let totals: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|i| (0..n).map(|j| oracle.cached_dist(i, j).min(best[j])).sum())
            .collect();
        let Some(choice) = argmin_by(&totals, |i| !medoids.contains(&i)) else {
            break;
        };
        medoids.push(choice);
        best.par_iter_mut().enumerate().for_each(|(j, b)| {
            let cost = oracle.cached_dist(j, choice);
            if cost < *b {
                *b = cost;
            }
        });
    }
    (medoids, best)
}

/// Iterate full swap scans, applying the single best strictly improving
/// exchange per iteration, until none remains or `max_iter` is reached.
pub(crate) fn run_swap_exact(
    oracle: &DistanceOracle<'_>,
    n: usize,
    medoids: &mut [usize],
    max_iter: usize,
) -> SwapOutcome {
    let k = medoids.len();
    let mut best = vec![0.0; n];
    let mut second = vec![0.0; n];
    let mut assignments = vec![0usize; n];
    let mut steps = 0usize;

    for _ in 0..max_iter {
        calc_best_distances(oracle, medoids, &mut best, &mut second, &mut assignments);

        let deltas: Vec<f64> = (0..k * n)
            .into_par_iter()
            .map(|arm| {
                let candidate = arm / k;
                let position = arm % k;
                (0..n)
                    .map(|j| {
                        let cost = oracle.cached_dist(candidate, j);
                        let fallback = if assignments[j] == position {
                            second[j]
                        } else {
                            best[j]
                        };
                        cost.min(fallback) - best[j]
                    })
                    .sum()
            })
            .collect();

        let Some(arm) = argmin_by(&deltas, |_| true) else {
            break;
        };
        if deltas[arm] >= 0.0 {
            break;
        }
        let position = arm % k;
        let candidate = arm / k;
        tracing::debug!(
            removed = medoids[position],
            added = candidate,
            delta = deltas[arm],
            "exact swap"
        );
        medoids[position] = candidate;
        steps += 1;
    }

    calc_best_distances(oracle, medoids, &mut best, &mut second, &mut assignments);
    SwapOutcome {
        assignments,
        best,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Metric;
    use ndarray::array;

    #[test]
    fn one_medoid_is_the_distance_sum_minimizer() {
        let data = array![[0.0], [1.0], [2.0], [7.0]];
        let oracle = DistanceOracle::new(data.view(), Metric::L2, None);
        let (medoids, best) = run_build_exact(&oracle, 4, 1);
        // Sums: 10, 8, 8 (tie, lower index), 18.
        assert_eq!(medoids, vec![1]);
        assert_eq!(best, vec![1.0, 0.0, 1.0, 6.0]);
    }

    #[test]
    fn swap_scan_reaches_the_optimal_two_clustering() {
        let data = array![[0.0], [0.5], [1.0], [10.0], [10.5], [11.0]];
        let oracle = DistanceOracle::new(data.view(), Metric::L2, None);
        let mut medoids = vec![0usize, 1usize];
        let outcome = run_swap_exact(&oracle, 6, &mut medoids, 100);
        let loss: f64 = outcome.best.iter().sum();
        assert!((loss - 2.0).abs() < 1e-9, "loss {loss}");
        let mut sorted = medoids.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 4]);
    }

    #[test]
    fn degenerate_data_yields_distinct_medoids_and_no_swaps() {
        let data = ndarray::Array2::<f64>::zeros((5, 3));
        let oracle = DistanceOracle::new(data.view(), Metric::L1, None);
        let (mut medoids, _) = run_build_exact(&oracle, 5, 3);
        assert_eq!(medoids, vec![0, 1, 2]);
        let outcome = run_swap_exact(&oracle, 5, &mut medoids, 100);
        assert_eq!(outcome.steps, 0);
        assert_eq!(medoids, vec![0, 1, 2]);
    }
}
