//! BUILD phase: seed the medoid set one exemplar at a time.
//!
//! Each step treats every point as an arm whose reward is the marginal loss
//! change from adding it to the current medoid set, and narrows the field
//! with the confidence-bound kernel. The first step has no incumbent
//! medoids, so it scores absolute cost instead of a marginal.

use rayon::prelude::*;

use crate::bandit::{argmin_by, sample_stddev, BanditSearch};
use crate::oracle::DistanceOracle;
use crate::sampler::ReferenceSampler;

/// Select `k` medoids and return them with the per-point best distances.
pub(crate) fn run_build(
    oracle: &DistanceOracle<'_>,
    sampler: &mut ReferenceSampler,
    n: usize,
    k: usize,
    batch_size: usize,
    build_confidence: usize,
    precision_floor: f64,
) -> (Vec<usize>, Vec<f64>) {
    let p = (build_confidence * n) as f64;
    let search = BanditSearch {
        n_refs: n,
        batch_size,
        log_p: p.ln(),
        precision_floor,
    };

    let mut medoids: Vec<usize> = Vec::with_capacity(k);
    let mut best = vec![f64::INFINITY; n];
    let mut use_absolute = true;

    for _ in 0..k {
        sampler.reset();
        let sigma = build_sigma(oracle, sampler, n, batch_size, &best, use_absolute);
        let lcbs = search.run(n, &sigma, |targets, exact| {
            build_target(
                oracle,
                sampler,
                n,
                batch_size,
                &best,
                use_absolute,
                targets,
                exact,
            )
        });

        // A point already in the set always scores a zero marginal, so it can
        // only win when nothing improves; keep the set duplicate-free.
        let Some(choice) = argmin_by(&lcbs, |a| !medoids.contains(&a)) else {
            break;
        };
        tracing::debug!(medoid = choice, step = medoids.len(), "build step");
        medoids.push(choice);

        // Fold the new medoid into the running best distances.
        best.par_iter_mut().enumerate().for_each(|(i, b)| {
            let cost = oracle.cached_dist(i, choice);
            if cost < *b {
                *b = cost;
            }
        });
        use_absolute = false;
    }
    (medoids, best)
}

/// Per-arm reward standard deviation over one reference batch.
fn build_sigma(
    oracle: &DistanceOracle<'_>,
    sampler: &mut ReferenceSampler,
    n: usize,
    batch_size: usize,
    best: &[f64],
    use_absolute: bool,
) -> Vec<f64> {
    let refs = sampler.next_batch(batch_size);
    (0..n)
        .into_par_iter()
        .map(|i| {
            let sample: Vec<f64> = refs
                .iter()
                .map(|&j| {
                    let cost = oracle.cached_dist(i, j);
                    if use_absolute {
                        cost
                    } else {
                        cost.min(best[j]) - best[j]
                    }
                })
                .collect();
            sample_stddev(&sample)
        })
        .collect()
}

/// Mean reward for each target arm over one fresh reference batch
/// (the full reference set when `exact`).
#[allow(clippy::too_many_arguments)]
fn build_target(
    oracle: &DistanceOracle<'_>,
    sampler: &mut ReferenceSampler,
    n: usize,
    batch_size: usize,
    best: &[f64],
    use_absolute: bool,
    targets: &[usize],
    exact: bool,
) -> Vec<f64> {
    let size = if exact { n } else { batch_size };
    let refs = sampler.next_batch(size);
    targets
        .par_iter()
        .map(|&i| {
            let mut total = 0.0;
            for &j in &refs {
                let cost = oracle.cached_dist(i, j);
                total += if use_absolute {
                    cost
                } else {
                    cost.min(best[j]) - best[j]
                };
            }
            total / size as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Metric;
    use ndarray::array;

    #[test]
    fn first_medoid_minimizes_total_distance() {
        // Three collinear points; the middle one minimizes the distance sum.
        let data = array![[0.0], [1.0], [10.0]];
        let oracle = DistanceOracle::new(data.view(), Metric::L2, None);
        let perm: Vec<usize> = (0..3).collect();
        let mut sampler = ReferenceSampler::new(perm, true, 0);

        let (medoids, best) = run_build(&oracle, &mut sampler, 3, 1, 3, 1000, 0.5);
        assert_eq!(medoids, vec![1]);
        assert_eq!(best, vec![1.0, 0.0, 9.0]);
    }

    #[test]
    fn build_never_repeats_a_medoid_on_degenerate_data() {
        let data = ndarray::Array2::<f64>::zeros((6, 2));
        let oracle = DistanceOracle::new(data.view(), Metric::L2, None);
        let perm: Vec<usize> = (0..6).collect();
        let mut sampler = ReferenceSampler::new(perm, true, 0);

        let (medoids, best) = run_build(&oracle, &mut sampler, 6, 3, 6, 1000, 0.5);
        assert_eq!(medoids.len(), 3);
        let mut uniq = medoids.clone();
        uniq.sort_unstable();
        uniq.dedup();
        assert_eq!(uniq.len(), 3);
        assert!(best.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn second_medoid_lands_in_the_other_cluster() {
        let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 10.0], [10.0, 11.0]];
        let oracle = DistanceOracle::new(data.view(), Metric::L2, None);
        let perm: Vec<usize> = (0..4).collect();
        let mut sampler = ReferenceSampler::new(perm, true, 0);

        let (medoids, _) = run_build(&oracle, &mut sampler, 4, 2, 4, 1000, 0.5);
        assert_eq!(medoids.len(), 2);
        let sides: Vec<bool> = medoids.iter().map(|&m| m >= 2).collect();
        assert_ne!(sides[0], sides[1]);
    }
}
