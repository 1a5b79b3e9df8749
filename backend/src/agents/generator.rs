//! Researcher generator agent
//!
//! Every `interval_ticks` (starting after tick 0) the generator spawns a new
//! researcher, up to `max_spawns`. Each newcomer is endowed from the
//! generator's own balances, so spawning never creates value. The new
//! researcher joins the registry and its evaluator's tracked list after the
//! current tick's agent loop.

use crate::agents::Researcher;
use crate::models::ledger::Unit;
use crate::models::proposal::ProposalTemplate;
use crate::models::state::{SimulationState, SpawnRequest};
use crate::models::weights::{receiving_agents_from_specs, WeightSpec};
use crate::models::{Agent, AgentKind};
use crate::orchestrator::SimulationError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Blueprint for researchers created mid-run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearcherTemplate {
    #[serde(default)]
    pub endowment_a: i64,
    #[serde(default)]
    pub endowment_b: i64,
    #[serde(default)]
    pub receiving_agents: Vec<(String, WeightSpec)>,
    #[serde(default)]
    pub proposal: Option<ProposalTemplate>,
}

#[derive(Debug, Clone)]
pub struct Generator {
    evaluator: String,
    template: ResearcherTemplate,
    interval_ticks: usize,
    max_spawns: usize,
    name_prefix: String,

    spawned: Vec<String>,
}

impl Generator {
    pub fn new(
        evaluator: impl Into<String>,
        template: ResearcherTemplate,
        interval_ticks: usize,
        max_spawns: usize,
        name_prefix: impl Into<String>,
    ) -> Result<Self, SimulationError> {
        if interval_ticks == 0 {
            return Err(SimulationError::InvalidConfig(
                "interval_ticks must be > 0".to_string(),
            ));
        }
        if template.endowment_a < 0 || template.endowment_b < 0 {
            return Err(SimulationError::InvalidConfig(
                "researcher endowments must be non-negative".to_string(),
            ));
        }
        receiving_agents_from_specs(&template.receiving_agents)?;
        Ok(Self {
            evaluator: evaluator.into(),
            template,
            interval_ticks,
            max_spawns,
            name_prefix: name_prefix.into(),
            spawned: Vec::new(),
        })
    }

    pub fn evaluator(&self) -> &str {
        &self.evaluator
    }

    /// Names of researchers spawned so far
    pub fn spawned(&self) -> &[String] {
        &self.spawned
    }

    pub fn referenced_agents(&self) -> Vec<&str> {
        let mut names = vec![self.evaluator.as_str()];
        names.extend(self.template.receiving_agents.iter().map(|(n, _)| n.as_str()));
        names
    }

    pub fn step(&mut self, name: &str, state: &mut SimulationState) -> Result<(), SimulationError> {
        let tick = state.tick();
        if tick == 0 || tick % self.interval_ticks != 0 || self.spawned.len() >= self.max_spawns {
            return Ok(());
        }

        let affordable = state.balance(name, Unit::A)? >= self.template.endowment_a
            && state.balance(name, Unit::B)? >= self.template.endowment_b;
        if !affordable {
            debug!(tick, generator = name, "Cannot endow a new researcher");
            return Ok(());
        }

        let mut n = self.spawned.len();
        let researcher_name = loop {
            let candidate = format!("{}{}", self.name_prefix, n);
            if !state.name_taken(&candidate) {
                break candidate;
            }
            n += 1;
        };

        let receiving = receiving_agents_from_specs(&self.template.receiving_agents)?;
        let researcher = Researcher::new(
            self.evaluator.clone(),
            receiving,
            self.template.proposal.clone(),
        );
        state.schedule_spawn(SpawnRequest {
            agent: Agent::new(researcher_name.clone(), AgentKind::Researcher(researcher)),
            funder: name.to_string(),
            endowment_a: self.template.endowment_a,
            endowment_b: self.template.endowment_b,
            evaluator: self.evaluator.clone(),
        });
        self.spawned.push(researcher_name);
        Ok(())
    }
}
