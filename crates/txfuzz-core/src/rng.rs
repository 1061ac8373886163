//! Seeded random source driving a mutation pass.
//!
//! Backed by ChaCha20 so a seed maps to the same stream on every platform.
//! Integer draws are taken over `u64` rather than `usize` for the same reason.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use txfuzz_tx::script::MAX_OPCODE;

use crate::FuzzError;

/// Rate of the exponential distribution behind [`RandomSource::biased_small`].
pub const BIASED_SMALL_RATE: f64 = 2.0;
/// A draw of `x` maps to `x * n / BIASED_SMALL_SCALE`.
pub const BIASED_SMALL_SCALE: f64 = 5.0;

pub struct RandomSource {
    rng: ChaCha20Rng,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Uniform integer in `[0, n)`.
    pub fn uniform(&mut self, n: usize) -> Result<usize, FuzzError> {
        if n == 0 {
            return Err(FuzzError::InvalidRange(n));
        }
        Ok(self.rng.gen_range(0..n as u64) as usize)
    }

    /// True with probability `1/n`. Always consumes one draw.
    pub fn one_in(&mut self, n: usize) -> Result<bool, FuzzError> {
        Ok(self.uniform(n)? == 0)
    }

    /// Integer in `[0, n)` from an exponential distribution, so small values
    /// are far more likely than large ones. The tail is clamped to `n - 1`.
    pub fn biased_small(&mut self, n: usize) -> Result<usize, FuzzError> {
        if n == 0 {
            return Err(FuzzError::InvalidRange(n));
        }
        // inverse CDF; 1 - u is in (0, 1] so ln is finite
        let u: f64 = self.rng.gen();
        let x = -(1.0 - u).ln() / BIASED_SMALL_RATE;
        let scaled = x * n as f64 / BIASED_SMALL_SCALE;
        Ok((scaled as usize).min(n - 1))
    }

    pub fn random_bytes(&mut self, n: usize) -> Vec<u8> {
        let mut out = vec![0u8; n];
        self.rng.fill_bytes(&mut out);
        out
    }

    /// Bytes restricted to `[0, MAX_OPCODE]`, so they mostly decode as instructions.
    pub fn opcode_bytes(&mut self, n: usize) -> Vec<u8> {
        (0..n).map(|_| self.rng.gen_range(0..=MAX_OPCODE)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = RandomSource::new(7);
        let mut b = RandomSource::new(7);
        for n in 1..200 {
            assert_eq!(a.uniform(n).unwrap(), b.uniform(n).unwrap());
            assert_eq!(a.biased_small(n).unwrap(), b.biased_small(n).unwrap());
        }
        assert_eq!(a.random_bytes(64), b.random_bytes(64));
        assert_eq!(a.opcode_bytes(64), b.opcode_bytes(64));
    }

    #[test]
    fn empty_range_is_rejected() {
        let mut rng = RandomSource::new(0);
        assert!(matches!(rng.uniform(0), Err(FuzzError::InvalidRange(0))));
        assert!(matches!(rng.biased_small(0), Err(FuzzError::InvalidRange(0))));
        assert!(matches!(rng.one_in(0), Err(FuzzError::InvalidRange(0))));
    }

    #[test]
    fn single_value_ranges() {
        let mut rng = RandomSource::new(3);
        for _ in 0..100 {
            assert_eq!(rng.uniform(1).unwrap(), 0);
            assert_eq!(rng.biased_small(1).unwrap(), 0);
            assert!(rng.one_in(1).unwrap());
        }
    }

    #[test]
    fn opcode_bytes_stay_in_instruction_range() {
        let mut rng = RandomSource::new(99);
        let bytes = rng.opcode_bytes(4096);
        assert_eq!(bytes.len(), 4096);
        assert!(bytes.iter().all(|b| *b <= MAX_OPCODE));
        // the top of the range is reachable
        assert!(bytes.iter().any(|b| *b > MAX_OPCODE / 2));
    }

    #[test]
    fn random_bytes_cover_high_values() {
        let mut rng = RandomSource::new(5);
        let bytes = rng.random_bytes(4096);
        assert!(bytes.iter().any(|b| *b > MAX_OPCODE));
        assert!(rng.random_bytes(0).is_empty());
    }

    #[test]
    fn biased_small_prefers_small_values() {
        let mut rng = RandomSource::new(11);
        let draws: Vec<usize> = (0..10_000).map(|_| rng.biased_small(1000).unwrap()).collect();
        let low = draws.iter().filter(|v| **v < 100).count();
        let high = draws.iter().filter(|v| **v >= 500).count();
        // mean of the scaled draw is n / 10
        assert!(low > 5_000, "low={low}");
        assert!(high < 200, "high={high}");
        assert!(draws.iter().any(|v| *v >= 300));
    }

    proptest! {
        #[test]
        fn uniform_respects_range(seed in any::<u64>(), n in 1usize..100_000) {
            let mut rng = RandomSource::new(seed);
            for _ in 0..16 {
                prop_assert!(rng.uniform(n).unwrap() < n);
            }
        }

        #[test]
        fn biased_small_respects_range(seed in any::<u64>(), n in 1usize..100_000) {
            let mut rng = RandomSource::new(seed);
            for _ in 0..16 {
                prop_assert!(rng.biased_small(n).unwrap() < n);
            }
        }
    }
}
