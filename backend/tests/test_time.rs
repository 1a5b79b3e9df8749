//! Tests for TimeManager

use funding_simulator_core_rs::core::time::{ElapsedTime, S_PER_DAY, S_PER_HOUR, S_PER_YEAR};
use funding_simulator_core_rs::TimeManager;

#[test]
fn test_time_manager_new() {
    let time = TimeManager::new(3600);
    assert_eq!(time.current_tick(), 0);
    assert_eq!(time.elapsed_seconds(), 0);
}

#[test]
fn test_advance_tick_is_exactly_one() {
    let mut time = TimeManager::new(3600);

    for expected in 1..=48 {
        time.advance_tick();
        assert_eq!(time.current_tick(), expected);
    }
    assert_eq!(time.elapsed_seconds(), 2 * S_PER_DAY);
}

#[test]
fn test_timestamp_of_tick() {
    let time = TimeManager::new(S_PER_HOUR);
    assert_eq!(time.timestamp_of(24), S_PER_DAY);
}

#[test]
fn test_elapsed_breakdown() {
    let elapsed = ElapsedTime::from_seconds(S_PER_YEAR);
    assert_eq!(elapsed.days, 365.0);
    assert_eq!(elapsed.years, 1.0);
    assert!((elapsed.months - 12.0).abs() < 1e-9);
    assert_eq!(elapsed.hours, 365.0 * 24.0);
}
