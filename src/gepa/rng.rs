//! A single PRNG bound to a run, so that every random choice the scheduler
//! makes (subsampling, weighted parent selection, failure/tool picking)
//! routes through one reproducible source. Two runs seeded identically
//! against a deterministic gateway produce identical archives.

use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

pub struct RunRng {
    inner: StdRng,
}

impl RunRng {
    pub fn from_seed(seed: u64) -> Self {
        RunRng { inner: StdRng::seed_from_u64(seed) }
    }

    /// Uniformly pick one element, or `None` if `items` is empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }

    /// Sample `k` distinct elements without replacement (fewer if `items`
    /// is smaller than `k`), preserving no particular order guarantee.
    pub fn sample_without_replacement<'a, T>(&mut self, items: &'a [T], k: usize) -> Vec<&'a T> {
        items.choose_multiple(&mut self.inner, k).collect()
    }

    /// Pick an index proportional to `weights`, or `None` if every weight
    /// is zero or the slice is empty.
    pub fn weighted_pick(&mut self, weights: &[f64]) -> Option<usize> {
        if weights.is_empty() || weights.iter().all(|w| *w <= 0.0) {
            return None;
        }
        let dist = WeightedIndex::new(weights).ok()?;
        Some(self.inner.sample(dist))
    }

    pub fn gen_f64(&mut self) -> f64 {
        self.inner.random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_produces_same_sequence() {
        let mut a = RunRng::from_seed(42);
        let mut b = RunRng::from_seed(42);
        let items = [1, 2, 3, 4, 5];
        for _ in 0..10 {
            assert_eq!(a.pick(&items), b.pick(&items));
        }
    }

    #[test]
    fn weighted_pick_prefers_heavier_weight() {
        let mut rng = RunRng::from_seed(7);
        let mut counts = [0usize; 2];
        for _ in 0..500 {
            let idx = rng.weighted_pick(&[1.0, 9.0]).unwrap();
            counts[idx] += 1;
        }
        assert!(counts[1] > counts[0]);
    }

    #[test]
    fn weighted_pick_none_when_all_zero() {
        let mut rng = RunRng::from_seed(1);
        assert!(rng.weighted_pick(&[0.0, 0.0]).is_none());
    }

    #[test]
    fn sample_without_replacement_respects_size() {
        let mut rng = RunRng::from_seed(3);
        let items = [1, 2, 3, 4, 5];
        let sample = rng.sample_without_replacement(&items, 3);
        assert_eq!(sample.len(), 3);
    }
}
