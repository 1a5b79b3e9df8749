//! Tests for deterministic RNG
//!
//! Same seed MUST produce same sequence.

use funding_simulator_core_rs::RngManager;

#[test]
fn test_rng_new_with_seed() {
    let rng = RngManager::new(12345);
    assert_eq!(rng.get_state(), 12345);
}

#[test]
fn test_rng_next_deterministic() {
    let mut rng1 = RngManager::new(12345);
    let mut rng2 = RngManager::new(12345);

    for _ in 0..100 {
        assert_eq!(rng1.next(), rng2.next(), "RNG not deterministic!");
    }
}

#[test]
fn test_rng_different_seeds_different_sequences() {
    let mut rng1 = RngManager::new(12345);
    let mut rng2 = RngManager::new(54321);

    assert_ne!(rng1.next(), rng2.next());
}

#[test]
fn test_rng_range_bounds() {
    let mut rng = RngManager::new(12345);

    for _ in 0..100 {
        let val = rng.range(0, 100);
        assert!((0..100).contains(&val), "Value {} out of range [0, 100)", val);
    }
}
