//! Reference-point batch sampling.
//!
//! Both bandit phases estimate arm rewards over small batches of reference
//! points. Two modes are supported:
//!
//! - **Uniform**: `size` indices drawn uniformly without replacement, from a
//!   seeded RNG.
//! - **Permutation walk**: consume a fixed permutation sequentially, so the
//!   whole fit reads a reproducible reference stream. When a draw would run
//!   past the end of the permutation the cursor resets to the start and the
//!   partial tail is dropped rather than wrapped, so a batch never straddles
//!   the restart.
//!
//! The sampler has cursor state and must only be driven by the coordinating
//! thread; each batch is drawn once and broadcast to workers.

use rand::rngs::StdRng;
use rand::SeedableRng;

pub(crate) struct ReferenceSampler {
    permutation: Vec<usize>,
    cursor: usize,
    use_perm: bool,
    rng: StdRng,
}

impl ReferenceSampler {
    /// Create a sampler over `permutation.len()` points.
    ///
    /// `permutation` is walked in order when `use_perm` is set; otherwise it
    /// only fixes the population size and draws come from `seed`.
    pub fn new(permutation: Vec<usize>, use_perm: bool, seed: u64) -> Self {
        Self {
            permutation,
            cursor: 0,
            use_perm,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Restart the permutation walk. Called at the start of every BUILD
    /// medoid step and every SWAP outer iteration.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Draw `size` distinct reference indices. `size` must not exceed the
    /// population size.
    pub fn next_batch(&mut self, size: usize) -> Vec<usize> {
        let n = self.permutation.len();
        if self.use_perm {
            if self.cursor + size - 1 >= n {
                self.cursor = 0;
            }
            let batch = self.permutation[self.cursor..self.cursor + size].to_vec();
            self.cursor += size;
            batch
        } else {
            rand::seq::index::sample(&mut self.rng, n, size).into_vec()
        }
    }
}
