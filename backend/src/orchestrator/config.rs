//! Run configuration
//!
//! [`SimulationConfig`] describes a whole run: the strategy parameters and
//! every agent in step order. It deserializes from JSON and is turned into
//! a ready [`SimulationState`] by [`SimulationConfig::build`], which binds
//! weight specs to closures and validates the wiring.

use crate::agents::{Community, Generator, Market, Researcher, ResearcherTemplate, Treasury};
use crate::core::time::{S_PER_DAY, S_PER_HOUR, S_PER_MONTH, S_PER_YEAR};
use crate::models::agent::{Agent, AgentKind};
use crate::models::ledger::Unit;
use crate::models::proposal::ProposalTemplate;
use crate::models::state::SimulationState;
use crate::models::weights::{receiving_agents_from_specs, WeightSpec};
use crate::orchestrator::SimulationError;
use serde::{Deserialize, Serialize};

/// Run-wide parameters, immutable for the duration of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParameters {
    /// Simulated seconds per tick
    pub seconds_per_tick: u64,

    /// Stop once the tick counter reaches this value
    pub max_ticks: usize,

    /// Proposal refresh cadence in ticks
    pub ticks_between_proposals: usize,

    /// Status row cadence in simulated seconds
    pub log_interval_seconds: u64,

    pub rng_seed: u64,

    /// Share of market flow sent to burning
    pub percent_burn: f64,

    /// Share of sales routed to the DAO rather than sellers
    pub percent_dao: f64,

    pub marketplace_percent_toll: f64,

    /// Starting speculation valuation (unit A)
    pub initial_valuation: f64,

    /// Yearly growth rate of the speculation valuation
    pub valuation_growth_per_year: f64,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        Self {
            seconds_per_tick: S_PER_HOUR,
            max_ticks: (S_PER_YEAR / S_PER_HOUR) as usize,
            ticks_between_proposals: (3 * S_PER_MONTH / S_PER_HOUR) as usize,
            log_interval_seconds: S_PER_DAY,
            rng_seed: 42,
            percent_burn: 0.0005,
            percent_dao: 0.05,
            marketplace_percent_toll: 0.002,
            initial_valuation: 150e6,
            valuation_growth_per_year: 0.10,
        }
    }
}

impl StrategyParameters {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.seconds_per_tick == 0 {
            return Err(SimulationError::InvalidConfig(
                "seconds_per_tick must be > 0".to_string(),
            ));
        }
        if self.log_interval_seconds == 0 {
            return Err(SimulationError::InvalidConfig(
                "log_interval_seconds must be > 0".to_string(),
            ));
        }
        // The outcome is read one tick after authoring, so a cadence of 1
        // would refresh every proposal before it could be observed.
        if self.ticks_between_proposals < 2 {
            return Err(SimulationError::InvalidConfig(
                "ticks_between_proposals must be >= 2".to_string(),
            ));
        }
        for (field, value) in [
            ("percent_burn", self.percent_burn),
            ("percent_dao", self.percent_dao),
            ("marketplace_percent_toll", self.marketplace_percent_toll),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimulationError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    field, value
                )));
            }
        }
        Ok(())
    }

    pub fn valuation_growth_per_second(&self) -> f64 {
        self.valuation_growth_per_year / S_PER_YEAR as f64
    }
}

/// One agent in the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default)]
    pub balance_a: i64,
    #[serde(default)]
    pub balance_b: i64,
    pub kind: AgentKindConfig,
}

fn default_true() -> bool {
    true
}

fn default_researcher_prefix() -> String {
    "researcher".to_string()
}

/// Variant-specific policy parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentKindConfig {
    Researcher {
        evaluator: String,
        #[serde(default)]
        receiving_agents: Vec<(String, WeightSpec)>,
        #[serde(default)]
        proposal: Option<ProposalTemplate>,
    },
    Treasury {
        #[serde(default)]
        tracked_researchers: Vec<String>,
        #[serde(default)]
        receiving_agents: Vec<(String, WeightSpec)>,
        #[serde(default = "default_true")]
        fund_winner: bool,
    },
    Market {
        transaction_fee_percent: f64,
        #[serde(default)]
        fee_receiving_agents: Vec<(String, WeightSpec)>,
        #[serde(default)]
        receiving_agents: Vec<(String, WeightSpec)>,
    },
    Community {
        market: String,
        unit: Unit,
        purchase_amount: i64,
        purchase_interval_ticks: usize,
    },
    Generator {
        evaluator: String,
        interval_ticks: usize,
        max_spawns: usize,
        #[serde(default = "default_researcher_prefix")]
        name_prefix: String,
        template: ResearcherTemplate,
    },
    Sink,
}

impl AgentKindConfig {
    fn build(&self) -> Result<AgentKind, SimulationError> {
        let kind = match self {
            AgentKindConfig::Researcher {
                evaluator,
                receiving_agents,
                proposal,
            } => AgentKind::Researcher(Researcher::new(
                evaluator.clone(),
                receiving_agents_from_specs(receiving_agents)?,
                proposal.clone(),
            )),
            AgentKindConfig::Treasury {
                tracked_researchers,
                receiving_agents,
                fund_winner,
            } => AgentKind::Treasury(Treasury::new(
                tracked_researchers.clone(),
                receiving_agents_from_specs(receiving_agents)?,
                *fund_winner,
            )),
            AgentKindConfig::Market {
                transaction_fee_percent,
                fee_receiving_agents,
                receiving_agents,
            } => AgentKind::Market(Market::new(
                *transaction_fee_percent,
                receiving_agents_from_specs(fee_receiving_agents)?,
                receiving_agents_from_specs(receiving_agents)?,
            )?),
            AgentKindConfig::Community {
                market,
                unit,
                purchase_amount,
                purchase_interval_ticks,
            } => AgentKind::Community(Community::new(
                market.clone(),
                *unit,
                *purchase_amount,
                *purchase_interval_ticks,
            )?),
            AgentKindConfig::Generator {
                evaluator,
                interval_ticks,
                max_spawns,
                name_prefix,
                template,
            } => AgentKind::Generator(Generator::new(
                evaluator.clone(),
                template.clone(),
                *interval_ticks,
                *max_spawns,
                name_prefix.clone(),
            )?),
            AgentKindConfig::Sink => AgentKind::Sink,
        };
        Ok(kind)
    }
}

/// Complete description of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub params: StrategyParameters,
    pub agents: Vec<AgentConfig>,
}

impl SimulationConfig {
    /// Construct the initial state, registering agents in listed order
    pub fn build(&self) -> Result<SimulationState, SimulationError> {
        if self.agents.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "Must have at least one agent".to_string(),
            ));
        }

        let mut state = SimulationState::new(self.params.clone())?;
        for agent_config in &self.agents {
            let kind = agent_config.kind.build()?;
            state.add_agent(
                Agent::new(agent_config.name.clone(), kind),
                agent_config.balance_a,
                agent_config.balance_b,
            )?;
        }
        state.validate_wiring()?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        assert!(StrategyParameters::default().validate().is_ok());
    }

    #[test]
    fn test_cadence_below_two_rejected() {
        let params = StrategyParameters {
            ticks_between_proposals: 1,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let config = SimulationConfig {
            params: StrategyParameters::default(),
            agents: vec![AgentConfig {
                name: "researcher0".to_string(),
                balance_a: 0,
                balance_b: 0,
                kind: AgentKindConfig::Researcher {
                    evaluator: "dao".to_string(),
                    receiving_agents: vec![],
                    proposal: None,
                },
            }],
        };
        let err = config.build().err().unwrap();
        assert!(matches!(err, SimulationError::InvalidConfig(_)));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "params": { "max_ticks": 10, "ticks_between_proposals": 4 },
            "agents": [
                { "name": "dao", "balance_b": 1000,
                  "kind": { "type": "treasury", "tracked_researchers": ["r0"] } },
                { "name": "r0",
                  "kind": { "type": "researcher", "evaluator": "dao",
                            "receiving_agents": [["burner", { "type": "fixed", "value": 1.0 }]] } },
                { "name": "burner", "kind": { "type": "sink" } }
            ]
        }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.params.max_ticks, 10);
        assert_eq!(config.params.seconds_per_tick, S_PER_HOUR);

        let state = config.build().unwrap();
        assert_eq!(state.agent_names(), vec!["dao", "r0", "burner"]);
    }
}
