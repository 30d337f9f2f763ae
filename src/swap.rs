//! SWAP phase: confidence-bound search over medoid/candidate exchanges.
//!
//! Every (medoid position, candidate point) pair is an arm whose reward is
//! the expected loss change of the exchange, estimated over reference
//! batches. A reference point currently owned by the outgoing medoid falls
//! back to its second-best distance, which is what the second-best
//! bookkeeping exists for; everyone else can only improve.
//!
//! The best/second-best/assignment pass lives here and is shared by the
//! exact solvers as well.

use rayon::prelude::*;

use crate::bandit::{argmin_by, sample_stddev, BanditSearch};
use crate::oracle::DistanceOracle;
use crate::sampler::ReferenceSampler;

/// Result of an iterated swap loop, whichever solver ran it.
pub(crate) struct SwapOutcome {
    /// Position in the medoid set of each point's nearest medoid.
    pub assignments: Vec<usize>,
    /// Distance from each point to its nearest medoid.
    pub best: Vec<f64>,
    /// Number of swaps applied.
    pub steps: usize,
}

/// One parallel pass over all points: record the nearest and second-nearest
/// medoid distances and the position of the nearest.
///
/// With a single medoid the second-best distance stays infinite, which makes
/// the owned-point fallback in the reward formulas a no-op.
pub(crate) fn calc_best_distances(
    oracle: &DistanceOracle<'_>,
    medoids: &[usize],
    best: &mut [f64],
    second: &mut [f64],
    assignments: &mut [usize],
) {
    best.par_iter_mut()
        .zip(second.par_iter_mut())
        .zip(assignments.par_iter_mut())
        .enumerate()
        .for_each(|(i, ((b, s), a))| {
            let mut nearest = f64::INFINITY;
            let mut runner_up = f64::INFINITY;
            let mut owner = 0usize;
            for (pos, &m) in medoids.iter().enumerate() {
                let cost = oracle.cached_dist(i, m);
                if cost < nearest {
                    runner_up = nearest;
                    nearest = cost;
                    owner = pos;
                } else if cost < runner_up {
                    runner_up = cost;
                }
            }
            *b = nearest;
            *s = runner_up;
            *a = owner;
        });
}

/// Iterate bandit-guided swaps until the proposal is a no-op or `max_iter`
/// is reached. `medoids` is updated in place.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_swap(
    oracle: &DistanceOracle<'_>,
    sampler: &mut ReferenceSampler,
    n: usize,
    medoids: &mut [usize],
    batch_size: usize,
    swap_confidence: usize,
    precision_floor: f64,
    max_iter: usize,
) -> SwapOutcome {
    let k = medoids.len();
    let p = (swap_confidence * k * n) as f64;
    let search = BanditSearch {
        n_refs: n,
        batch_size,
        log_p: p.ln(),
        precision_floor,
    };

    let mut best = vec![0.0; n];
    let mut second = vec![0.0; n];
    let mut assignments = vec![0usize; n];
    let mut steps = 0usize;

    for _ in 0..max_iter {
        sampler.reset();
        calc_best_distances(oracle, medoids, &mut best, &mut second, &mut assignments);
        let sigma = swap_sigma(
            oracle,
            sampler,
            n,
            k,
            batch_size,
            &best,
            &second,
            &assignments,
        );
        let lcbs = search.run(k * n, &sigma, |targets, exact| {
            swap_target(
                oracle,
                sampler,
                n,
                k,
                batch_size,
                &best,
                &second,
                &assignments,
                targets,
                exact,
            )
        });

        let Some(arm) = argmin_by(&lcbs, |_| true) else {
            break;
        };
        let position = arm % k;
        let candidate = arm / k;
        // An exchange that re-proposes a point already in the set never
        // improves the loss; it is the convergence signal.
        if medoids.contains(&candidate) {
            tracing::debug!(candidate, "swap proposed an existing medoid; stopping");
            break;
        }
        tracing::debug!(removed = medoids[position], added = candidate, "swap");
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

/// Reward standard deviation for every (position, candidate) arm over one
/// reference batch. Arm id encodes `candidate * k + position`.
#[allow(clippy::too_many_arguments)]
fn swap_sigma(
    oracle: &DistanceOracle<'_>,
    sampler: &mut ReferenceSampler,
    n: usize,
    k: usize,
    batch_size: usize,
    best: &[f64],
    second: &[f64],
    assignments: &[usize],
) -> Vec<f64> {
    let refs = sampler.next_batch(batch_size);
    (0..k * n)
        .into_par_iter()
        .map(|arm| {
            let candidate = arm / k;
            let position = arm % k;
            let sample: Vec<f64> = refs
                .iter()
                .map(|&j| swap_reward(oracle, best, second, assignments, position, candidate, j))
                .collect();
            sample_stddev(&sample)
        })
        .collect()
}

/// Mean reward for each target arm over one fresh reference batch
/// (the full reference set when `exact`).
#[allow(clippy::too_many_arguments)]
fn swap_target(
    oracle: &DistanceOracle<'_>,
    sampler: &mut ReferenceSampler,
    n: usize,
    k: usize,
    batch_size: usize,
    best: &[f64],
    second: &[f64],
    assignments: &[usize],
    targets: &[usize],
    exact: bool,
) -> Vec<f64> {
    let size = if exact { n } else { batch_size };
    let refs = sampler.next_batch(size);
    targets
        .par_iter()
        .map(|&arm| {
            let candidate = arm / k;
            let position = arm % k;
            let total: f64 = refs
                .iter()
                .map(|&j| swap_reward(oracle, best, second, assignments, position, candidate, j))
                .sum();
            total / size as f64
        })
        .collect()
}

/// Loss change at reference `j` of replacing the medoid at `position` with
/// `candidate`.
#[inline]
fn swap_reward(
    oracle: &DistanceOracle<'_>,
    best: &[f64],
    second: &[f64],
    assignments: &[usize],
    position: usize,
    candidate: usize,
    j: usize,
) -> f64 {
    let cost = oracle.cached_dist(candidate, j);
    let fallback = if assignments[j] == position {
        second[j]
    } else {
        best[j]
    };
    cost.min(fallback) - best[j]
}
