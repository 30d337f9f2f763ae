//! Shared confidence-bound search kernel.
//!
//! BUILD and SWAP both reduce to the same procedure: a set of arms with an
//! unknown mean reward, an evaluation function that averages rewards over a
//! reference batch, and per-arm confidence bounds that tighten as samples
//! accumulate. An arm whose lower bound reaches the smallest upper bound
//! cannot be the minimizer and stops being sampled; an arm whose next batch
//! would run past the reference set is promoted to one exact evaluation and
//! resolved definitively.
//!
//! The kernel is sequential; parallelism lives inside the caller's
//! `evaluate`, which fans the target arms out across worker threads.

pub(crate) struct BanditSearch {
    /// Total number of reference points (the exact-evaluation batch size).
    pub n_refs: usize,
    /// References per batched pull.
    pub batch_size: usize,
    /// `ln` of the confidence parameter `p`.
    pub log_p: f64,
    /// Stop narrowing once the candidate count drops below this.
    pub precision_floor: f64,
}

impl BanditSearch {
    /// Run the elimination loop and return the final per-arm lower bounds.
    ///
    /// `evaluate(targets, exact)` returns one mean-reward estimate per
    /// target arm; `exact` requests an average over all `n_refs` references
    /// instead of one batch. `sigma` is indexed by arm id.
    ///
    /// Every arm is evaluated at least once before the loop can end, so
    /// every returned bound is meaningful; callers select with
    /// [`argmin_by`], which breaks ties toward the lowest arm id.
    pub fn run<F>(&self, n_arms: usize, sigma: &[f64], mut evaluate: F) -> Vec<f64>
    where
        F: FnMut(&[usize], bool) -> Vec<f64>,
    {
        let n = self.n_refs as f64;
        let batch = self.batch_size as f64;
        let mut estimates = vec![0.0; n_arms];
        let mut num_samples = vec![0.0; n_arms];
        let mut ucbs = vec![f64::INFINITY; n_arms];
        let mut lcbs = vec![f64::INFINITY; n_arms];
        let mut exact = vec![false; n_arms];
        let mut candidates = vec![true; n_arms];
        let mut n_candidates = n_arms;

        while n_candidates as f64 > self.precision_floor {
            // Promote arms whose next batch would exceed the reference set.
            let promote: Vec<usize> = (0..n_arms)
                .filter(|&a| (num_samples[a] + batch >= n) != exact[a])
                .collect();
            if !promote.is_empty() {
                let result = evaluate(&promote, true);
                for (&a, &r) in promote.iter().zip(&result) {
                    estimates[a] = r;
                    ucbs[a] = r;
                    lcbs[a] = r;
                    exact[a] = true;
                    num_samples[a] += n;
                    if candidates[a] {
                        candidates[a] = false;
                        n_candidates -= 1;
                    }
                }
            }
            if (n_candidates as f64) < self.precision_floor {
                break;
            }

            let targets: Vec<usize> = (0..n_arms).filter(|&a| candidates[a]).collect();
            let result = evaluate(&targets, false);
            for (&a, &r) in targets.iter().zip(&result) {
                estimates[a] =
                    (num_samples[a] * estimates[a] + batch * r) / (num_samples[a] + batch);
                num_samples[a] += batch;
                let delta = sigma[a] * (self.log_p / num_samples[a]).sqrt();
                ucbs[a] = estimates[a] + delta;
                lcbs[a] = estimates[a] - delta;
            }

            // An arm stays a candidate only while its LCB undercuts the best
            // UCB over *all* arms, exact ones included.
            let best_ucb = ucbs.iter().fold(f64::INFINITY, |m, &u| m.min(u));
            n_candidates = 0;
            for a in 0..n_arms {
                candidates[a] = lcbs[a] < best_ucb && !exact[a];
                if candidates[a] {
                    n_candidates += 1;
                }
            }
        }
        lcbs
    }
}

/// Index of the smallest eligible value; first index wins ties.
pub(crate) fn argmin_by<F>(values: &[f64], eligible: F) -> Option<usize>
where
    F: Fn(usize) -> bool,
{
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if !eligible(i) {
            continue;
        }
        let better = match best {
            None => true,
            Some(b) => v.total_cmp(&values[b]).is_lt(),
        };
        if better {
            best = Some(i);
        }
    }
    best
}

/// Sample standard deviation (n-1 normalization); 0 for fewer than two
/// samples, so a degenerate batch yields a zero confidence radius instead
/// of a division by zero.
pub(crate) fn sample_stddev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sigma_resolves_in_one_round() {
        // With exact per-arm means and no noise, the first elimination pass
        // clears every candidate and the best arm wins outright.
        let means = [0.5, -0.25, 0.1, 0.0];
        let search = BanditSearch {
            n_refs: 1000,
            batch_size: 10,
            log_p: (1000.0f64).ln(),
            precision_floor: 0.5,
        };
        let mut calls = 0;
        let lcbs = search.run(means.len(), &[0.0; 4], |targets, _exact| {
            calls += 1;
            targets.iter().map(|&a| means[a]).collect()
        });
        assert_eq!(calls, 1);
        assert_eq!(argmin_by(&lcbs, |_| true), Some(1));
    }

    #[test]
    fn batch_covering_all_references_promotes_everything_exactly() {
        let means = [3.0, 1.0, 2.0];
        let search = BanditSearch {
            n_refs: 8,
            batch_size: 8,
            log_p: (8000.0f64).ln(),
            precision_floor: 0.5,
        };
        let mut exact_calls = 0;
        let lcbs = search.run(means.len(), &[1.0; 3], |targets, exact| {
            assert!(exact);
            exact_calls += 1;
            targets.iter().map(|&a| means[a]).collect()
        });
        assert_eq!(exact_calls, 1);
        // Exact promotion pins both bounds to the mean.
        assert_eq!(lcbs, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn noisy_arms_converge_to_the_true_minimum() {
        // Deterministic "noise": each pull returns the true mean plus a
        // shrinking perturbation, distinct per arm.
        let means = [0.0, -0.4, -0.35, 0.2];
        let search = BanditSearch {
            n_refs: 10_000,
            batch_size: 100,
            log_p: (10_000_000.0f64).ln(),
            precision_floor: 0.5,
        };
        let mut round = 0u32;
        let lcbs = search.run(means.len(), &[0.5; 4], |targets, exact| {
            round += 1;
            targets
                .iter()
                .map(|&a| {
                    if exact {
                        means[a]
                    } else {
                        means[a] + 0.01 / f64::from(round) * if a % 2 == 0 { 1.0 } else { -1.0 }
                    }
                })
                .collect()
        });
        assert_eq!(argmin_by(&lcbs, |_| true), Some(1));
    }

    #[test]
    fn argmin_by_skips_ineligible_and_breaks_ties_low() {
        let values = [1.0, 0.0, 0.0, 2.0];
        assert_eq!(argmin_by(&values, |_| true), Some(1));
        assert_eq!(argmin_by(&values, |i| i != 1), Some(2));
        assert_eq!(argmin_by(&values, |_| false), None);
    }

    #[test]
    fn sample_stddev_handles_degenerate_inputs() {
        assert_eq!(sample_stddev(&[]), 0.0);
        assert_eq!(sample_stddev(&[4.2]), 0.0);
        assert_eq!(sample_stddev(&[1.0, 1.0, 1.0]), 0.0);
        assert!((sample_stddev(&[1.0, 3.0]) - (2.0f64).sqrt()).abs() < 1e-12);
    }
}
