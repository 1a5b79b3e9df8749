//! Receiving-agent weight tables
//!
//! A routing agent splits outflows across recipients by weight. A weight is
//! either a fixed fraction or a strategy closure bound at construction and
//! evaluated against the current state every tick, so policies such as the
//! burn percentage can change over a run. The table itself is immutable
//! once built.

use crate::models::state::SimulationState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WeightError {
    #[error("Weight for {recipient} must be within [0, 1], got {value}")]
    OutOfRange { recipient: String, value: f64 },
}

pub type WeightFn = Arc<dyn Fn(&SimulationState) -> f64 + Send + Sync>;

/// Fraction of an outflow routed to one recipient
#[derive(Clone)]
pub enum Weight {
    Fixed(f64),
    Dynamic(WeightFn),
}

impl Weight {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&SimulationState) -> f64 + Send + Sync + 'static,
    {
        Weight::Dynamic(Arc::new(f))
    }

    /// Current fraction, clamped to [0, 1]
    pub fn resolve(&self, state: &SimulationState) -> f64 {
        let value = match self {
            Weight::Fixed(v) => *v,
            Weight::Dynamic(f) => f(state),
        };
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(0.0, 1.0)
    }
}

impl fmt::Debug for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::Fixed(v) => write!(f, "Fixed({})", v),
            Weight::Dynamic(_) => write!(f, "Dynamic(..)"),
        }
    }
}

/// Ordered mapping from recipient name to weight
///
/// Weights need not sum to 1; the residual stays with the sender.
#[derive(Debug, Clone, Default)]
pub struct ReceivingAgents {
    entries: Vec<(String, Weight)>,
}

impl ReceivingAgents {
    pub fn new(entries: Vec<(String, Weight)>) -> Result<Self, WeightError> {
        for (recipient, weight) in &entries {
            if let Weight::Fixed(value) = weight {
                if !(0.0..=1.0).contains(value) {
                    return Err(WeightError::OutOfRange {
                        recipient: recipient.clone(),
                        value: *value,
                    });
                }
            }
        }
        Ok(Self { entries })
    }

    /// Convenience constructor for a table of fixed fractions
    pub fn fixed<S: Into<String>>(entries: Vec<(S, f64)>) -> Result<Self, WeightError> {
        Self::new(
            entries
                .into_iter()
                .map(|(name, w)| (name.into(), Weight::Fixed(w)))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Weight)> {
        self.entries.iter().map(|(name, w)| (name.as_str(), w))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Amount owed to each recipient out of `base`, as `floor(base * weight)`
    pub fn shares(&self, state: &SimulationState, base: i64) -> Vec<(String, i64)> {
        self.entries
            .iter()
            .map(|(name, weight)| {
                let share = (base as f64 * weight.resolve(state)).floor() as i64;
                (name.clone(), share.max(0))
            })
            .collect()
    }
}

/// Strategy parameters a weight can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyWeight {
    PercentBurn,
    /// `1 - percent_burn`
    PercentToMarket,
    PercentDao,
    /// `1 - percent_dao`
    PercentToSellers,
    MarketplaceToll,
}

impl StrategyWeight {
    fn value(self, state: &SimulationState) -> f64 {
        let params = state.params();
        match self {
            StrategyWeight::PercentBurn => params.percent_burn,
            StrategyWeight::PercentToMarket => 1.0 - params.percent_burn,
            StrategyWeight::PercentDao => params.percent_dao,
            StrategyWeight::PercentToSellers => 1.0 - params.percent_dao,
            StrategyWeight::MarketplaceToll => params.marketplace_percent_toll,
        }
    }
}

/// Serializable description of a weight, resolved to a [`Weight`] at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WeightSpec {
    Fixed { value: f64 },
    Param { param: StrategyWeight },
    /// Linear interpolation from `from` at tick 0 to `to` at `over_ticks`,
    /// constant afterwards
    Ramp { from: f64, to: f64, over_ticks: usize },
}

impl WeightSpec {
    pub fn into_weight(self) -> Weight {
        match self {
            WeightSpec::Fixed { value } => Weight::Fixed(value),
            WeightSpec::Param { param } => Weight::dynamic(move |state| param.value(state)),
            WeightSpec::Ramp {
                from,
                to,
                over_ticks,
            } => Weight::dynamic(move |state| {
                if over_ticks == 0 {
                    return to;
                }
                let progress = (state.tick() as f64 / over_ticks as f64).min(1.0);
                from + (to - from) * progress
            }),
        }
    }
}

/// Build a receiving table from `(name, spec)` pairs
pub fn receiving_agents_from_specs(
    specs: &[(String, WeightSpec)],
) -> Result<ReceivingAgents, WeightError> {
    for (recipient, spec) in specs {
        let bounds = match spec {
            WeightSpec::Fixed { value } => vec![*value],
            WeightSpec::Ramp { from, to, .. } => vec![*from, *to],
            WeightSpec::Param { .. } => vec![],
        };
        if let Some(value) = bounds.into_iter().find(|v| !(0.0..=1.0).contains(v)) {
            return Err(WeightError::OutOfRange {
                recipient: recipient.clone(),
                value,
            });
        }
    }
    ReceivingAgents::new(
        specs
            .iter()
            .map(|(name, spec)| (name.clone(), spec.clone().into_weight()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_weight_out_of_range_rejected() {
        let err = ReceivingAgents::fixed(vec![("market", 1.5)]).unwrap_err();
        assert_eq!(
            err,
            WeightError::OutOfRange {
                recipient: "market".to_string(),
                value: 1.5
            }
        );
    }

    #[test]
    fn test_ramp_bounds_validated() {
        let specs = vec![(
            "burner".to_string(),
            WeightSpec::Ramp {
                from: 0.0,
                to: 2.0,
                over_ticks: 10,
            },
        )];
        assert!(receiving_agents_from_specs(&specs).is_err());
    }

    #[test]
    fn test_weight_spec_serde_shape() {
        let spec: WeightSpec =
            serde_json::from_str(r#"{"type":"param","param":"percent_burn"}"#).unwrap();
        assert_eq!(
            spec,
            WeightSpec::Param {
                param: StrategyWeight::PercentBurn
            }
        );
    }
}
