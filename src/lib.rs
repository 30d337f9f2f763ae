//! `medoids`: bandit-accelerated k-medoids clustering.
//!
//! This crate finds `k` exemplar points (medoids) in a dataset under an
//! arbitrary dissimilarity. Unlike a centroid, a medoid is always an actual
//! input point, which makes the result robust to outliers and meaningful for
//! any metric.
//!
//! The workhorse solver treats every candidate medoid as an arm of a
//! multi-armed bandit: rewards are sampled over small reference batches,
//! per-arm confidence bounds narrow the field, and only the survivors are
//! ever evaluated exactly. That takes each iteration from the classical
//! O(n^2) distance evaluations down to roughly O(n log n) expected, while
//! returning the same medoids with high probability. Two exact solvers
//! (classical PAM and FastPAM1) run behind the same interface.
//!
//! Goals:
//! - **Deterministic by default**: same data + options + seed → same medoids.
//! - **Parallel inner loops**: reward and assignment passes fan out across
//!   worker threads; outer iterations stay sequential.
//! - **One shared shell**: all solvers use the same dissimilarity oracle,
//!   distance cache, and assignment bookkeeping.
//!
//! # Example
//!
//! ```rust
//! use medoids::{Algorithm, KMedoids, Metric};
//! use ndarray::array;
//!
//! let data = array![
//!     [0.0, 0.0],
//!     [0.0, 1.0],
//!     [1.0, 0.0],
//!     [10.0, 10.0],
//!     [10.0, 11.0],
//!     [11.0, 10.0],
//! ];
//! let mut model = KMedoids::new(2)
//!     .with_algorithm(Algorithm::BanditPam)
//!     .with_metric(Metric::L2)
//!     .with_seed(7);
//! model.fit(data.view()).unwrap();
//!
//! assert_eq!(model.medoids().len(), 2);
//! assert_eq!(model.labels().len(), 6);
//! ```
//!
//! Non-goals: streaming input, incremental re-clustering, distributed
//! execution, and persistence of solver state across fits.

#![forbid(unsafe_code)]

mod bandit;
mod build;
mod fastpam1;
mod oracle;
mod pam;
mod sampler;
mod swap;

mod engine;
pub use engine::*;

mod error;
pub use error::*;

mod metric;
pub use metric::*;
