//! Built-in open-science scenario
//!
//! Wires a DAO treasury, a set of researchers, a public knowledge market,
//! a burner and a community member:
//!
//! ```text
//! dao_treasury --grant--> researcherN --grant--> public_market
//! public_market --fee--> dao_treasury
//! public_market --rest--> burner (percent_burn), member (1 - percent_burn)
//! member --periodic purchase--> public_market
//! ```
//!
//! Every flow is a transfer between registered agents, so the totals of
//! both units are fixed for the whole run.

use crate::agents::ResearcherTemplate;
use crate::core::time::{TimeManager, S_PER_DAY};
use crate::models::ledger::Unit;
use crate::models::proposal::ProposalTemplate;
use crate::models::state::SimulationState;
use crate::models::weights::{StrategyWeight, WeightSpec};
use crate::orchestrator::{
    AgentConfig, AgentKindConfig, SimulationConfig, SimulationError, StrategyParameters,
};
use serde::{Deserialize, Serialize};

pub const TREASURY: &str = "dao_treasury";
pub const MARKET: &str = "public_market";
pub const BURNER: &str = "burner";
pub const MEMBER: &str = "member";
pub const GENERATOR: &str = "researcher_generator";

/// Knobs for the built-in scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOptions {
    pub num_researchers: usize,
    pub max_ticks: usize,
    pub rng_seed: u64,
    pub ticks_between_proposals: usize,
    pub treasury_balance_b: i64,
    pub researcher_balance_b: i64,
    pub member_balance_b: i64,
    pub market_fee_percent: f64,
    /// Fixed proposal used by every researcher; random draws when `None`
    pub proposal: Option<ProposalTemplate>,
    /// Spawn an extra researcher every this many ticks when set
    pub spawn_interval_ticks: Option<usize>,
    pub max_spawns: usize,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        let params = StrategyParameters::default();
        Self {
            num_researchers: 2,
            max_ticks: params.max_ticks,
            rng_seed: params.rng_seed,
            ticks_between_proposals: params.ticks_between_proposals,
            treasury_balance_b: 1_000_000,
            researcher_balance_b: 10_000,
            member_balance_b: 10_000,
            market_fee_percent: 0.1,
            proposal: None,
            spawn_interval_ticks: None,
            max_spawns: 0,
        }
    }
}

fn fixed(name: &str, value: f64) -> (String, WeightSpec) {
    (name.to_string(), WeightSpec::Fixed { value })
}

fn param(name: &str, param: StrategyWeight) -> (String, WeightSpec) {
    (name.to_string(), WeightSpec::Param { param })
}

/// Configuration for the scenario, editable before building
pub fn open_science_config(options: &ScenarioOptions) -> SimulationConfig {
    let params = StrategyParameters {
        max_ticks: options.max_ticks,
        rng_seed: options.rng_seed,
        ticks_between_proposals: options.ticks_between_proposals,
        ..Default::default()
    };

    let researchers: Vec<String> = (0..options.num_researchers)
        .map(|i| format!("researcher{}", i))
        .collect();

    let mut agents = vec![AgentConfig {
        name: TREASURY.to_string(),
        balance_a: 0,
        balance_b: options.treasury_balance_b,
        kind: AgentKindConfig::Treasury {
            tracked_researchers: researchers.clone(),
            receiving_agents: vec![],
            fund_winner: true,
        },
    }];

    for name in &researchers {
        agents.push(AgentConfig {
            name: name.clone(),
            balance_a: 0,
            balance_b: options.researcher_balance_b,
            kind: AgentKindConfig::Researcher {
                evaluator: TREASURY.to_string(),
                receiving_agents: vec![fixed(MARKET, 1.0)],
                proposal: options.proposal.clone(),
            },
        });
    }

    agents.push(AgentConfig {
        name: MARKET.to_string(),
        balance_a: 0,
        balance_b: 0,
        kind: AgentKindConfig::Market {
            transaction_fee_percent: options.market_fee_percent,
            fee_receiving_agents: vec![fixed(TREASURY, 1.0)],
            receiving_agents: vec![
                param(BURNER, StrategyWeight::PercentBurn),
                param(MEMBER, StrategyWeight::PercentToMarket),
            ],
        },
    });
    agents.push(AgentConfig {
        name: BURNER.to_string(),
        balance_a: 0,
        balance_b: 0,
        kind: AgentKindConfig::Sink,
    });

    let ticks_per_week = TimeManager::new(params.seconds_per_tick).ticks_for(7 * S_PER_DAY);
    agents.push(AgentConfig {
        name: MEMBER.to_string(),
        balance_a: 0,
        balance_b: options.member_balance_b,
        kind: AgentKindConfig::Community {
            market: MARKET.to_string(),
            unit: Unit::B,
            purchase_amount: 1_000,
            purchase_interval_ticks: ticks_per_week,
        },
    });

    if let Some(interval_ticks) = options.spawn_interval_ticks {
        agents.push(AgentConfig {
            name: GENERATOR.to_string(),
            balance_a: 0,
            balance_b: options.researcher_balance_b * options.max_spawns as i64,
            kind: AgentKindConfig::Generator {
                evaluator: TREASURY.to_string(),
                interval_ticks,
                max_spawns: options.max_spawns,
                name_prefix: "researcher".to_string(),
                template: ResearcherTemplate {
                    endowment_a: 0,
                    endowment_b: options.researcher_balance_b,
                    receiving_agents: vec![fixed(MARKET, 1.0)],
                    proposal: options.proposal.clone(),
                },
            },
        });
    }

    SimulationConfig { params, agents }
}

/// Build the initial state for the scenario
pub fn open_science(options: &ScenarioOptions) -> Result<SimulationState, SimulationError> {
    open_science_config(options).build()
}
