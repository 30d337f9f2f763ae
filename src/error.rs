//! Error types for configuration and fitting.

use thiserror::Error;

/// Error type used by operations in this crate.
///
/// Every error is fatal to the `fit` call that raised it; no partial results
/// are produced and nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// An option value is unusable: unknown algorithm or loss name, zero
    /// `n_medoids`, zero `batch_size`.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The dataset shape cannot support the requested clustering
    /// (empty dataset, or more medoids than points).
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

/// Convenient alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;
