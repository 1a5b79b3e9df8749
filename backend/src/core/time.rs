//! Time management for the simulation
//!
//! The simulation operates in discrete ticks. Each tick maps to a fixed
//! number of simulated seconds, and the engine never skips or batches ticks.

use serde::{Deserialize, Serialize};

pub const S_PER_MIN: u64 = 60;
pub const S_PER_HOUR: u64 = 60 * S_PER_MIN;
pub const S_PER_DAY: u64 = 24 * S_PER_HOUR;
pub const S_PER_YEAR: u64 = 365 * S_PER_DAY;
pub const S_PER_MONTH: u64 = S_PER_YEAR / 12;

/// Manages simulation time in discrete ticks of simulated seconds
///
/// # Example
/// ```
/// use funding_simulator_core_rs::TimeManager;
///
/// let mut time = TimeManager::new(3600); // 1 tick = 1 hour
/// assert_eq!(time.current_tick(), 0);
///
/// time.advance_tick();
/// assert_eq!(time.current_tick(), 1);
/// assert_eq!(time.elapsed_seconds(), 3600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeManager {
    /// Total ticks elapsed since simulation start
    current_tick: usize,
    /// Simulated seconds covered by one tick
    seconds_per_tick: u64,
}

impl TimeManager {
    /// Create a new TimeManager
    ///
    /// # Arguments
    /// * `seconds_per_tick` - Simulated seconds per tick (must be positive)
    pub fn new(seconds_per_tick: u64) -> Self {
        assert!(seconds_per_tick > 0, "seconds_per_tick must be positive");
        Self {
            current_tick: 0,
            seconds_per_tick,
        }
    }

    /// Advance time by exactly one tick
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
    }

    /// Get the current tick (total ticks since start)
    pub fn current_tick(&self) -> usize {
        self.current_tick
    }

    /// Simulated seconds per tick
    pub fn seconds_per_tick(&self) -> u64 {
        self.seconds_per_tick
    }

    /// Simulated seconds elapsed at the current tick
    ///
    /// # Example
    /// ```
    /// use funding_simulator_core_rs::TimeManager;
    ///
    /// let mut time = TimeManager::new(60);
    /// for _ in 0..10 {
    ///     time.advance_tick();
    /// }
    /// assert_eq!(time.elapsed_seconds(), 600);
    /// ```
    pub fn elapsed_seconds(&self) -> u64 {
        self.timestamp_of(self.current_tick)
    }

    /// Simulated timestamp (seconds since start) of an arbitrary tick
    pub fn timestamp_of(&self, tick: usize) -> u64 {
        tick as u64 * self.seconds_per_tick
    }

    /// Elapsed time broken into the units reported on status rows
    pub fn elapsed(&self) -> ElapsedTime {
        ElapsedTime::from_seconds(self.elapsed_seconds())
    }

    /// Number of whole ticks that cover `seconds` (rounded up, at least 1)
    ///
    /// Used to turn intervals expressed in simulated time into tick counts.
    pub fn ticks_for(&self, seconds: u64) -> usize {
        let ticks = (seconds + self.seconds_per_tick - 1) / self.seconds_per_tick;
        ticks.max(1) as usize
    }
}

/// Elapsed simulated time in every unit the status row reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElapsedTime {
    pub seconds: f64,
    pub minutes: f64,
    pub hours: f64,
    pub days: f64,
    pub months: f64,
    pub years: f64,
}

impl ElapsedTime {
    pub fn from_seconds(seconds: u64) -> Self {
        let s = seconds as f64;
        Self {
            seconds: s,
            minutes: s / S_PER_MIN as f64,
            hours: s / S_PER_HOUR as f64,
            days: s / S_PER_DAY as f64,
            months: s / S_PER_MONTH as f64,
            years: s / S_PER_YEAR as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "seconds_per_tick must be positive")]
    fn test_zero_seconds_per_tick_panics() {
        TimeManager::new(0);
    }

    #[test]
    fn test_month_is_twelfth_of_year() {
        assert_eq!(S_PER_MONTH * 12, S_PER_YEAR);
    }

    #[test]
    fn test_ticks_for_rounds_up() {
        let time = TimeManager::new(3600);
        assert_eq!(time.ticks_for(3600), 1);
        assert_eq!(time.ticks_for(3601), 2);
        assert_eq!(time.ticks_for(0), 1);
    }
}
