//! Uniform splitting of known configurations.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::SampleError;

/// Random source selection for [`TrueRandomSampler`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Seed {
    /// Derive the generator state from a fixed value; equal seeds reproduce the split.
    Fixed(u64),
    /// Seed from the operating system; every run draws a fresh split.
    Entropy,
}

impl Seed {
    fn rng(self) -> StdRng {
        match self {
            Seed::Fixed(seed) => StdRng::seed_from_u64(seed),
            Seed::Entropy => StdRng::from_entropy(),
        }
    }
}

/// Splits a list of known-valid configurations uniformly at random.
///
/// This sampler never consults a solver. Items are moved, not compared, so duplicate-valued
/// entries survive the split on whichever side they land. Sampling is without replacement.
pub struct TrueRandomSampler {
    rng: StdRng,
}

impl TrueRandomSampler {
    /// Creates a sampler drawing from the given seed.
    pub fn new(seed: Seed) -> TrueRandomSampler {
        TrueRandomSampler { rng: seed.rng() }
    }

    /// Removes `count` items chosen uniformly without replacement.
    ///
    /// Returns the `(sampled, remaining)` partition of the input. Requesting more items than
    /// available is an error, the request is never capped.
    pub fn sample<T>(
        &mut self,
        count: usize,
        mut items: Vec<T>,
    ) -> Result<(Vec<T>, Vec<T>), SampleError> {
        if count > items.len() {
            return Err(SampleError::SampleSize {
                requested: count,
                available: items.len(),
            });
        }

        let mut sampled = Vec::with_capacity(count);
        for _ in 0..count {
            let index = self.rng.gen_range(0, items.len());
            sampled.push(items.swap_remove(index));
        }

        Ok((sampled, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_seeds_reproduce_the_split() {
        let items: Vec<u32> = (0..20).collect();

        let (sampled_a, remaining_a) = TrueRandomSampler::new(Seed::Fixed(42))
            .sample(7, items.clone())
            .unwrap();
        let (sampled_b, remaining_b) = TrueRandomSampler::new(Seed::Fixed(42))
            .sample(7, items)
            .unwrap();

        assert_eq!(sampled_a, sampled_b);
        assert_eq!(remaining_a, remaining_b);
    }

    #[test]
    fn partition_is_disjoint_and_complete() {
        // Duplicate values must survive the split.
        let items: Vec<u32> = (0..10).chain(0..10).collect();

        let (sampled, remaining) = TrueRandomSampler::new(Seed::Fixed(7))
            .sample(9, items.clone())
            .unwrap();
        assert_eq!(sampled.len(), 9);
        assert_eq!(remaining.len(), 11);

        let mut all: Vec<u32> = sampled.into_iter().chain(remaining).collect();
        all.sort();
        let mut expected = items;
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn oversized_requests_are_rejected() {
        match TrueRandomSampler::new(Seed::Fixed(0)).sample(3, vec![0u32, 1]) {
            Err(SampleError::SampleSize {
                requested,
                available,
            }) => assert_eq!((requested, available), (3, 2)),
            result => panic!("unexpected result {:?}", result),
        }
    }

    #[test]
    fn the_whole_list_can_be_sampled() {
        let (mut sampled, remaining) = TrueRandomSampler::new(Seed::Fixed(3))
            .sample(3, vec![1u32, 2, 3])
            .unwrap();

        assert!(remaining.is_empty());
        sampled.sort();
        assert_eq!(sampled, vec![1, 2, 3]);
    }
}
