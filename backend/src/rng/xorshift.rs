//! xorshift64* random number generator
//!
//! Fast, deterministic PRNG with 64-bit state. Same seed, same sequence.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use funding_simulator_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let grant = rng.range_inclusive(10_000, 50_000);
/// assert!((10_000..=50_000).contains(&grant));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// A zero seed is replaced by 1 (xorshift cannot leave the zero state).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate random value in range [min, max)
    ///
    /// # Panics
    /// Panics if min >= max
    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        assert!(min < max, "min must be less than max");

        let value = self.next();
        let range_size = (max - min) as u64;
        min + (value % range_size) as i64
    }

    /// Generate random value in range [min, max]
    ///
    /// # Panics
    /// Panics if min > max
    pub fn range_inclusive(&mut self, min: i64, max: i64) -> i64 {
        assert!(min <= max, "min must not exceed max");
        self.range(min, max + 1)
    }

    /// Current generator state
    pub fn get_state(&self) -> u64 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_converted_to_nonzero() {
        let rng = RngManager::new(0);
        assert_ne!(rng.get_state(), 0, "Zero seed should be converted to 1");
    }

    #[test]
    #[should_panic(expected = "min must not exceed max")]
    fn test_range_inclusive_invalid_bounds() {
        let mut rng = RngManager::new(12345);
        rng.range_inclusive(10, 9);
    }

    #[test]
    fn test_range_inclusive_hits_both_ends() {
        let mut rng = RngManager::new(7);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..1000 {
            match rng.range_inclusive(1, 3) {
                1 => seen_min = true,
                3 => seen_max = true,
                2 => {}
                other => panic!("value {} outside [1, 3]", other),
            }
        }
        assert!(seen_min && seen_max);
    }
}
