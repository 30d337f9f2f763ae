//! Clustering engine shell: configuration, dispatch, and outputs.
//!
//! [`KMedoids`] holds an immutable-after-validation option set plus the
//! outputs of the last `fit` call. Options are deterministic by default:
//! the same dataset, options, and seed reproduce the same medoids.

use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;

use crate::build;
use crate::error::{Error, Result};
use crate::fastpam1;
use crate::metric::Metric;
use crate::oracle::{DistanceOracle, PivotCache};
use crate::pam;
use crate::sampler::ReferenceSampler;
use crate::swap::{self, SwapOutcome};

/// Solver selection, dispatched once at `fit` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    /// Confidence-bound accelerated BUILD and SWAP.
    #[default]
    BanditPam,
    /// Exact greedy seeding plus full O(k * n^2) swap scans.
    Pam,
    /// Exact greedy seeding plus FastPAM1 swap iterations.
    FastPam1,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::BanditPam => write!(f, "BanditPAM"),
            Algorithm::Pam => write!(f, "naive"),
            Algorithm::FastPam1 => write!(f, "FastPAM1"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "banditpam" => Ok(Algorithm::BanditPam),
            "naive" | "pam" => Ok(Algorithm::Pam),
            "fastpam1" => Ok(Algorithm::FastPam1),
            other => Err(Error::InvalidConfig(format!("unknown algorithm '{other}'"))),
        }
    }
}

/// K-medoids solver.
///
/// Construct with [`KMedoids::new`], adjust options with the `with_*`
/// builders (or the name-based setters for algorithm and loss), then call
/// [`KMedoids::fit`]. Output getters return empty slices and zeros until a
/// fit has completed.
///
/// # Example
///
/// ```rust
/// use medoids::KMedoids;
/// use ndarray::array;
///
/// let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 10.0], [10.0, 11.0]];
/// let mut model = KMedoids::new(2);
/// model.fit(data.view()).unwrap();
/// assert_eq!(model.medoids().len(), 2);
/// assert_eq!(model.labels().len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct KMedoids {
    n_medoids: usize,
    algorithm: Algorithm,
    metric: Metric,
    max_iter: usize,
    batch_size: usize,
    build_confidence: usize,
    swap_confidence: usize,
    use_cache: bool,
    use_perm: bool,
    cache_multiplier: usize,
    precision_floor: f64,
    seed: u64,

    medoids_build: Vec<usize>,
    medoids_final: Vec<usize>,
    labels: Vec<usize>,
    steps: usize,
    loss: f64,
}

impl KMedoids {
    /// Create a solver for `n_medoids` clusters with default options.
    pub fn new(n_medoids: usize) -> Self {
        Self {
            n_medoids,
            algorithm: Algorithm::default(),
            metric: Metric::default(),
            max_iter: 1000,
            batch_size: 100,
            build_confidence: 1000,
            swap_confidence: 1000,
            use_cache: true,
            use_perm: true,
            cache_multiplier: 1000,
            precision_floor: 0.5,
            seed: 0,
            medoids_build: Vec::new(),
            medoids_final: Vec::new(),
            labels: Vec::new(),
            steps: 0,
            loss: 0.0,
        }
    }

    /// Solver to run.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Dissimilarity to cluster under.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Cap on SWAP outer iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// References per bandit batch (clamped to the dataset size at fit).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Reciprocal of the BUILD error tolerance.
    pub fn with_build_confidence(mut self, build_confidence: usize) -> Self {
        self.build_confidence = build_confidence;
        self
    }

    /// Reciprocal of the SWAP error tolerance.
    pub fn with_swap_confidence(mut self, swap_confidence: usize) -> Self {
        self.swap_confidence = swap_confidence;
        self
    }

    /// Enable or disable the pivot distance cache.
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Enable or disable the deterministic permutation-walk sampler.
    pub fn with_perm(mut self, use_perm: bool) -> Self {
        self.use_perm = use_perm;
        self
    }

    /// Multiplier on `log10(n)` for the pivot count.
    pub fn with_cache_multiplier(mut self, cache_multiplier: usize) -> Self {
        self.cache_multiplier = cache_multiplier;
        self
    }

    /// Candidate-count threshold that ends the bandit narrowing loop.
    pub fn with_precision_floor(mut self, precision_floor: f64) -> Self {
        self.precision_floor = precision_floor;
        self
    }

    /// Seed for the permutation and the uniform sampler.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Select the solver by name (`"BanditPAM"`, `"naive"`, `"FastPAM1"`).
    pub fn set_algorithm(&mut self, name: &str) -> Result<()> {
        self.algorithm = name.parse()?;
        Ok(())
    }

    /// Select the loss by name (`"L1"`, `"L2"`, `"cos"`, `"manhattan"`).
    pub fn set_loss(&mut self, name: &str) -> Result<()> {
        self.metric = name.parse()?;
        Ok(())
    }

    pub fn n_medoids(&self) -> usize {
        self.n_medoids
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn build_confidence(&self) -> usize {
        self.build_confidence
    }

    pub fn swap_confidence(&self) -> usize {
        self.swap_confidence
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    pub fn use_perm(&self) -> bool {
        self.use_perm
    }

    pub fn cache_multiplier(&self) -> usize {
        self.cache_multiplier
    }

    pub fn precision_floor(&self) -> f64 {
        self.precision_floor
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Medoid indices after seeding, before any swap.
    pub fn medoids_build(&self) -> &[usize] {
        &self.medoids_build
    }

    /// Final medoid indices.
    pub fn medoids(&self) -> &[usize] {
        &self.medoids_final
    }

    /// Per-point position (into [`KMedoids::medoids`]) of the nearest medoid.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of swaps applied.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Total deviation: sum over points of the distance to their medoid.
    pub fn loss(&self) -> f64 {
        self.loss
    }

    /// Mean per-point deviation.
    pub fn average_loss(&self) -> f64 {
        if self.labels.is_empty() {
            0.0
        } else {
            self.loss / self.labels.len() as f64
        }
    }

    /// Cluster the dataset (rows are points) and populate the outputs.
    ///
    /// Fails with [`Error::DimensionMismatch`] on an empty dataset or when
    /// `n_medoids` exceeds the point count, and with
    /// [`Error::InvalidConfig`] on unusable option values. On error no
    /// output is produced.
    pub fn fit(&mut self, data: ArrayView2<'_, f64>) -> Result<()> {
        let n = data.nrows();
        if n == 0 || data.ncols() == 0 {
            return Err(Error::DimensionMismatch("dataset is empty".into()));
        }
        if self.n_medoids == 0 {
            return Err(Error::InvalidConfig("n_medoids must be at least 1".into()));
        }
        if self.n_medoids > n {
            return Err(Error::DimensionMismatch(format!(
                "cannot place {} medoids among {n} points",
                self.n_medoids
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
        }

        // Contiguous rows regardless of the caller's layout, so row views
        // iterate without strides.
        let data = data.as_standard_layout();
        let batch = self.batch_size.min(n);

        // One permutation per fit drives both the pivot choice and the
        // deterministic reference walk.
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut permutation: Vec<usize> = (0..n).collect();
        permutation.shuffle(&mut rng);
        let sampler_seed: u64 = rng.random();

        let cache = if self.use_cache {
            let m = pivot_count(n, self.cache_multiplier);
            Some(PivotCache::new(n, &permutation[..m]))
        } else {
            None
        };
        let oracle = DistanceOracle::new(data.view(), self.metric, cache);
        let mut sampler = ReferenceSampler::new(permutation, self.use_perm, sampler_seed);

        tracing::debug!(
            n,
            k = self.n_medoids,
            algorithm = %self.algorithm,
            loss = %self.metric,
            "fit start"
        );

        let (medoids, outcome) = match self.algorithm {
            Algorithm::BanditPam => {
                let (mut medoids, _) = build::run_build(
                    &oracle,
                    &mut sampler,
                    n,
                    self.n_medoids,
                    batch,
                    self.build_confidence,
                    self.precision_floor,
                );
                self.medoids_build = medoids.clone();
                let outcome = swap::run_swap(
                    &oracle,
                    &mut sampler,
                    n,
                    &mut medoids,
                    batch,
                    self.swap_confidence,
                    self.precision_floor,
                    self.max_iter,
                );
                (medoids, outcome)
            }
            Algorithm::Pam => {
                let (mut medoids, _) = pam::run_build_exact(&oracle, n, self.n_medoids);
                self.medoids_build = medoids.clone();
                let outcome = pam::run_swap_exact(&oracle, n, &mut medoids, self.max_iter);
                (medoids, outcome)
            }
            Algorithm::FastPam1 => {
                let (mut medoids, _) = pam::run_build_exact(&oracle, n, self.n_medoids);
                self.medoids_build = medoids.clone();
                let outcome = fastpam1::run_swap_fastpam1(&oracle, n, &mut medoids, self.max_iter);
                (medoids, outcome)
            }
        };

        self.finish(medoids, outcome);
        Ok(())
    }

    fn finish(&mut self, medoids: Vec<usize>, outcome: SwapOutcome) {
        self.loss = outcome.best.iter().sum();
        self.labels = outcome.assignments;
        self.steps = outcome.steps;
        self.medoids_final = medoids;
        tracing::debug!(loss = self.loss, steps = self.steps, "fit complete");
    }
}

/// Pivot count: `min(n, ceil(cache_multiplier * log10(n)))`.
fn pivot_count(n: usize, cache_multiplier: usize) -> usize {
    let m = ((n as f64).log10() * cache_multiplier as f64).ceil() as usize;
    m.min(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_clusters() -> ndarray::Array2<f64> {
        array![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [10.0, 10.0],
            [10.0, 11.0],
            [11.0, 10.0]
        ]
    }

    #[test]
    fn unknown_names_are_rejected_at_set_time() {
        let mut model = KMedoids::new(2);
        assert!(model.set_algorithm("simulated-annealing").is_err());
        assert!(model.set_loss("hamming").is_err());
        assert!(model.set_algorithm("naive").is_ok());
        assert_eq!(model.algorithm(), Algorithm::Pam);
        assert!(model.set_loss("manhattan").is_ok());
        assert_eq!(model.metric(), Metric::Manhattan);
    }

    #[test]
    fn fit_rejects_bad_shapes() {
        let empty = ndarray::Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            KMedoids::new(1).fit(empty.view()),
            Err(Error::DimensionMismatch(_))
        ));

        let data = two_clusters();
        assert!(matches!(
            KMedoids::new(7).fit(data.view()),
            Err(Error::DimensionMismatch(_))
        ));
        assert!(matches!(
            KMedoids::new(0).fit(data.view()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn outputs_are_consistent_after_fit() {
        let data = two_clusters();
        let mut model = KMedoids::new(2);
        model.fit(data.view()).unwrap();

        assert_eq!(model.medoids().len(), 2);
        assert_eq!(model.medoids_build().len(), 2);
        assert_eq!(model.labels().len(), 6);
        assert!(model.labels().iter().all(|&l| l < 2));
        let expected: f64 = model
            .labels()
            .iter()
            .enumerate()
            .map(|(i, &l)| {
                let m = model.medoids()[l];
                Metric::L2.eval(data.row(i), data.row(m))
            })
            .sum();
        assert!((model.loss() - expected).abs() < 1e-9);
        assert!((model.average_loss() - model.loss() / 6.0).abs() < 1e-12);
    }

    #[test]
    fn every_algorithm_separates_the_clusters() {
        let data = two_clusters();
        for algorithm in [Algorithm::BanditPam, Algorithm::Pam, Algorithm::FastPam1] {
            let mut model = KMedoids::new(2).with_algorithm(algorithm);
            model.fit(data.view()).unwrap();
            let sides: Vec<bool> = model.medoids().iter().map(|&m| m >= 3).collect();
            assert_ne!(sides[0], sides[1], "{algorithm}");
            assert!(model.loss() <= 4.0 + 1e-9, "{algorithm}: {}", model.loss());
        }
    }

    #[test]
    fn k_equals_n_makes_every_point_a_medoid() {
        let data = two_clusters();
        let mut model = KMedoids::new(6);
        model.fit(data.view()).unwrap();

        let mut sorted = model.medoids().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(model.loss(), 0.0);
        // Labels invert the medoid list.
        for (i, &l) in model.labels().iter().enumerate() {
            assert_eq!(model.medoids()[l], i);
        }
    }

    #[test]
    fn pivot_count_is_clamped_to_n() {
        assert_eq!(pivot_count(1, 1000), 0);
        assert_eq!(pivot_count(10, 1000), 10);
        assert_eq!(pivot_count(100_000, 1000), 5000);
    }
}
