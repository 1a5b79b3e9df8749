//! KPI tracker and rolling-window aggregation
//!
//! Every KPI is a named scalar series with exactly one sample per tick,
//! index-aligned with the tick counter. Window queries work in simulated
//! seconds: `window_sum(name, w, t)` sums the samples whose timestamp
//! `tick * seconds_per_tick` falls within `[t_now - w, t_now]`. Windows
//! reaching before the start of the run are clamped to tick 0.
//!
//! # Critical Invariants
//!
//! 1. `series.len() == tick + 1` after each tick's recording step
//! 2. Samples are appended in tick order, never overwritten

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use thiserror::Error;

pub const TOTAL_BALANCE_A: &str = "total_balance_a";
pub const TOTAL_BALANCE_B: &str = "total_balance_b";
pub const RESEARCHERS: &str = "researchers";
pub const PROPOSALS_SUBMITTED: &str = "proposals_submitted";
pub const PROPOSALS_FUNDED: &str = "proposals_funded";
pub const GRANT_FUNDS_RECEIVED: &str = "grant_funds_received";
pub const KNOWLEDGE_ASSETS: &str = "knowledge_assets";
pub const HOLDINGS_VALUE: &str = "holdings_value";
pub const SPECULATION_VALUATION: &str = "speculation_valuation";

/// The fixed set of KPIs recorded by `SimulationState` every tick
pub const RECORDED_KPIS: [&str; 9] = [
    TOTAL_BALANCE_A,
    TOTAL_BALANCE_B,
    RESEARCHERS,
    PROPOSALS_SUBMITTED,
    PROPOSALS_FUNDED,
    GRANT_FUNDS_RECEIVED,
    KNOWLEDGE_ASSETS,
    HOLDINGS_VALUE,
    SPECULATION_VALUATION,
];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KpiError {
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Misaligned sample for {metric}: series has {len} samples, got tick {tick}")]
    MisalignedSample {
        metric: String,
        len: usize,
        tick: usize,
    },

    #[error("Tick {tick} not recorded for {metric} (series has {len} samples)")]
    TickOutOfRange {
        metric: String,
        tick: usize,
        len: usize,
    },

    #[error("Failed to serialize KPI series: {0}")]
    Serialization(String),
}

/// First tick whose timestamp lies inside `[t_now - window_seconds, t_now]`
///
/// # Example
/// ```
/// use funding_simulator_core_rs::kpi::window_start_tick;
///
/// // 1 tick = 1 hour, current tick 10, 3-hour window → ticks 7..=10
/// assert_eq!(window_start_tick(10, 3600, 3 * 3600), 7);
/// // Window larger than the run clamps to tick 0
/// assert_eq!(window_start_tick(10, 3600, 1_000_000), 0);
/// ```
pub fn window_start_tick(current_tick: usize, seconds_per_tick: u64, window_seconds: u64) -> usize {
    let now = current_tick as u64 * seconds_per_tick;
    if window_seconds >= now {
        return 0;
    }
    let lower = now - window_seconds;
    ((lower + seconds_per_tick - 1) / seconds_per_tick) as usize
}

/// One sample per tick for a single metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSeries {
    samples: Vec<f64>,
}

impl KpiSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.samples.push(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, tick: usize) -> Option<f64> {
        self.samples.get(tick).copied()
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.last().copied()
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Samples inside the window ending at `current_tick`, or `None` if
    /// `current_tick` has not been recorded yet
    pub fn window(
        &self,
        window_seconds: u64,
        current_tick: usize,
        seconds_per_tick: u64,
    ) -> Option<&[f64]> {
        if current_tick >= self.samples.len() {
            return None;
        }
        let start = window_start_tick(current_tick, seconds_per_tick, window_seconds);
        Some(&self.samples[start..=current_tick])
    }
}

/// Named KPI series owned by the simulation state
#[derive(Debug, Clone)]
pub struct KpiTracker {
    seconds_per_tick: u64,
    series: BTreeMap<String, KpiSeries>,
}

impl KpiTracker {
    /// Create a tracker for a fixed set of metric names
    pub fn new<'a, I>(seconds_per_tick: u64, metrics: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            seconds_per_tick,
            series: metrics
                .into_iter()
                .map(|name| (name.to_string(), KpiSeries::new()))
                .collect(),
        }
    }

    /// Append the sample for `tick`
    ///
    /// Fails unless `tick` is exactly the next index of the series.
    pub fn record_tick(&mut self, metric: &str, tick: usize, value: f64) -> Result<(), KpiError> {
        let series = self
            .series
            .get_mut(metric)
            .ok_or_else(|| KpiError::UnknownMetric(metric.to_string()))?;
        if series.len() != tick {
            return Err(KpiError::MisalignedSample {
                metric: metric.to_string(),
                len: series.len(),
                tick,
            });
        }
        series.push(value);
        Ok(())
    }

    /// Sum of samples within the last `window_seconds` of simulated time
    pub fn window_sum(
        &self,
        metric: &str,
        window_seconds: u64,
        current_tick: usize,
    ) -> Result<f64, KpiError> {
        Ok(self.window(metric, window_seconds, current_tick)?.iter().sum())
    }

    /// Mean of samples within the last `window_seconds` of simulated time
    pub fn window_average(
        &self,
        metric: &str,
        window_seconds: u64,
        current_tick: usize,
    ) -> Result<f64, KpiError> {
        let samples = self.window(metric, window_seconds, current_tick)?;
        Ok(samples.iter().sum::<f64>() / samples.len() as f64)
    }

    pub fn latest(&self, metric: &str) -> Result<Option<f64>, KpiError> {
        Ok(self.series(metric)?.latest())
    }

    pub fn series(&self, metric: &str) -> Result<&KpiSeries, KpiError> {
        self.series
            .get(metric)
            .ok_or_else(|| KpiError::UnknownMetric(metric.to_string()))
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn seconds_per_tick(&self) -> u64 {
        self.seconds_per_tick
    }

    /// Hex SHA-256 over every series, for comparing replays
    pub fn digest(&self) -> Result<String, KpiError> {
        let bytes = serde_json::to_vec(&self.series)
            .map_err(|e| KpiError::Serialization(e.to_string()))?;
        let hash = Sha256::digest(&bytes);
        Ok(hash.iter().map(|b| format!("{:02x}", b)).collect())
    }

    fn window(
        &self,
        metric: &str,
        window_seconds: u64,
        current_tick: usize,
    ) -> Result<&[f64], KpiError> {
        let series = self.series(metric)?;
        series
            .window(window_seconds, current_tick, self.seconds_per_tick)
            .ok_or_else(|| KpiError::TickOutOfRange {
                metric: metric.to_string(),
                tick: current_tick,
                len: series.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with(samples: &[f64]) -> KpiTracker {
        let mut tracker = KpiTracker::new(3600, ["m"]);
        for (tick, v) in samples.iter().enumerate() {
            tracker.record_tick("m", tick, *v).unwrap();
        }
        tracker
    }

    #[test]
    fn test_window_start_rounds_up_on_partial_tick() {
        // 7 s ticks, tick 10 is t=70; 20 s back is t=50, inside tick 7
        assert_eq!(window_start_tick(10, 7, 20), 8);
        assert_eq!(window_start_tick(10, 7, 21), 7);
    }

    #[test]
    fn test_zero_window_is_current_sample() {
        let tracker = tracker_with(&[1.0, 2.0, 4.0]);
        assert_eq!(tracker.window_sum("m", 0, 2).unwrap(), 4.0);
        assert_eq!(tracker.window_sum("m", 0, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_window_larger_than_run_sums_from_start() {
        let tracker = tracker_with(&[1.0, 2.0, 4.0, 8.0]);
        assert_eq!(tracker.window_sum("m", 10 * 3600, 3).unwrap(), 15.0);
        assert_eq!(tracker.window_sum("m", u64::MAX, 3).unwrap(), 15.0);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let tracker = tracker_with(&[1.0, 2.0, 4.0, 8.0]);
        // [3h - 2h, 3h] covers ticks 1, 2, 3
        assert_eq!(tracker.window_sum("m", 2 * 3600, 3).unwrap(), 14.0);
        // 1.5h window: tick 2 at 2h is inside [1.5h, 3h], tick 1 is not
        assert_eq!(tracker.window_sum("m", 5400, 3).unwrap(), 12.0);
        assert_eq!(tracker.window_average("m", 2 * 3600, 3).unwrap(), 14.0 / 3.0);
    }

    #[test]
    fn test_misaligned_record_rejected() {
        let mut tracker = tracker_with(&[1.0]);
        assert_eq!(
            tracker.record_tick("m", 3, 1.0),
            Err(KpiError::MisalignedSample {
                metric: "m".to_string(),
                len: 1,
                tick: 3
            })
        );
        assert_eq!(
            tracker.record_tick("m", 0, 1.0),
            Err(KpiError::MisalignedSample {
                metric: "m".to_string(),
                len: 1,
                tick: 0
            })
        );
    }

    #[test]
    fn test_unrecorded_tick_and_unknown_metric() {
        let tracker = tracker_with(&[1.0]);
        assert!(matches!(
            tracker.window_sum("m", 0, 1),
            Err(KpiError::TickOutOfRange { .. })
        ));
        assert_eq!(
            tracker.window_sum("nope", 0, 0),
            Err(KpiError::UnknownMetric("nope".to_string()))
        );
    }

    #[test]
    fn test_digest_tracks_content() {
        let a = tracker_with(&[1.0, 2.0]);
        let b = tracker_with(&[1.0, 2.0]);
        let c = tracker_with(&[1.0, 3.0]);
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
        assert_ne!(a.digest().unwrap(), c.digest().unwrap());
    }
}
