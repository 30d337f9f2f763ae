//! Dissimilarity metrics.
//!
//! A `Metric` is a small tagged variant with a single evaluation method;
//! every solver in this crate receives one by value and never branches on it
//! anywhere else. All metrics are symmetric.

use std::fmt;
use std::str::FromStr;

use ndarray::ArrayView1;

use crate::error::Error;

/// Pointwise dissimilarity between two data rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Metric {
    /// Sum of absolute coordinate differences.
    L1,
    /// Euclidean distance.
    #[default]
    L2,
    /// Inner product scaled by both norms.
    ///
    /// Note: this is the raw normalized inner product, **not** `1 - cos`.
    /// It is nonnegative only when the caller guarantees consistently
    /// oriented vectors, and callers treating it as a distance may observe
    /// non-monotone behavior. Zero-norm inputs evaluate to 0.
    Cosine,
    /// Alias of [`Metric::L1`].
    Manhattan,
}

impl Metric {
    /// Dissimilarity between two points.
    pub fn eval(&self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        match self {
            Metric::L1 | Metric::Manhattan => {
                a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
            }
            Metric::L2 => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt(),
            Metric::Cosine => {
                let mut dot = 0.0;
                let mut na = 0.0;
                let mut nb = 0.0;
                for (x, y) in a.iter().zip(b.iter()) {
                    dot += x * y;
                    na += x * x;
                    nb += y * y;
                }
                if na == 0.0 || nb == 0.0 {
                    0.0
                } else {
                    dot / (na.sqrt() * nb.sqrt())
                }
            }
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::L1 => write!(f, "L1"),
            Metric::L2 => write!(f, "L2"),
            Metric::Cosine => write!(f, "cos"),
            Metric::Manhattan => write!(f, "manhattan"),
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "l1" => Ok(Metric::L1),
            "l2" | "euclidean" => Ok(Metric::L2),
            "cos" | "cosine" => Ok(Metric::Cosine),
            "manhattan" => Ok(Metric::Manhattan),
            other => Err(Error::InvalidConfig(format!("unknown loss '{other}'"))),
        }
    }
}
