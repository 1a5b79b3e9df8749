//! Simulation State
//!
//! Owns everything a run mutates: the tick clock, the agent registry, the
//! ledger, the KPI tracker, the seeded RNG and the event log. One instance
//! is created per run and passed explicitly to every agent step.
//!
//! # Critical Invariants
//!
//! 1. **Registry order is semantic**: agents step in insertion order, and
//!    later agents observe mutations made earlier in the same tick
//! 2. **Balance Conservation**: the sum of each unit is fixed once all
//!    accounts are opened (burns are transfers to a sink agent)
//! 3. **KPI alignment**: every KPI series holds `tick + 1` samples after
//!    the tick's recording step
//! 4. **No aliasing**: the stepping agent is checked out of its slot, so
//!    agents only ever reach each other through name lookups here

use crate::agents::{Researcher, Treasury};
use crate::core::time::TimeManager;
use crate::kpi::{self, KpiTracker};
use crate::models::agent::Agent;
use crate::models::event::{Event, EventLog};
use crate::models::ledger::{Ledger, Unit};
use crate::orchestrator::{SimulationError, StrategyParameters};
use crate::rng::RngManager;
use std::collections::HashMap;
use tracing::debug;

/// Injected conversion rate between the two units (unit A per unit B)
pub trait PriceOracle {
    fn price(&self, tick: usize) -> f64;
}

impl<F> PriceOracle for F
where
    F: Fn(usize) -> f64,
{
    fn price(&self, tick: usize) -> f64 {
        self(tick)
    }
}

/// Oracle returning the same rate every tick
#[derive(Debug, Clone, Copy)]
pub struct ConstantPrice(pub f64);

impl PriceOracle for ConstantPrice {
    fn price(&self, _tick: usize) -> f64 {
        self.0
    }
}

/// A researcher created mid-run, applied after the tick's agent loop
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub agent: Agent,
    /// Agent whose balances fund the endowment
    pub funder: String,
    pub endowment_a: i64,
    pub endowment_b: i64,
    /// Treasury that should start tracking the new researcher
    pub evaluator: String,
}

/// Complete simulation state
///
/// # Example
///
/// ```rust
/// use funding_simulator_core_rs::{Agent, AgentKind, SimulationState, StrategyParameters, Unit};
///
/// let mut state = SimulationState::new(StrategyParameters::default()).unwrap();
/// state.add_agent(Agent::new("burner", AgentKind::Sink), 0, 0).unwrap();
/// state.add_agent(Agent::new("vault", AgentKind::Sink), 0, 500).unwrap();
///
/// state.transfer("vault", "burner", Unit::B, 200).unwrap();
/// assert_eq!(state.balance("burner", Unit::B).unwrap(), 200);
/// assert_eq!(state.ledger().total(Unit::B), 500);
/// ```
pub struct SimulationState {
    time: TimeManager,
    params: StrategyParameters,

    /// Registry slots in insertion order; `None` while the agent is stepping
    agents: Vec<Option<Agent>>,
    index: HashMap<String, usize>,

    ledger: Ledger,
    kpis: KpiTracker,
    rng: RngManager,
    events: EventLog,

    /// Run-wide valuation compounding every tick
    speculation_valuation: f64,
    price_oracle: Box<dyn PriceOracle>,
    pending_spawns: Vec<SpawnRequest>,
}

impl SimulationState {
    pub fn new(params: StrategyParameters) -> Result<Self, SimulationError> {
        params.validate()?;
        Ok(Self {
            time: TimeManager::new(params.seconds_per_tick),
            kpis: KpiTracker::new(params.seconds_per_tick, kpi::RECORDED_KPIS),
            rng: RngManager::new(params.rng_seed),
            speculation_valuation: params.initial_valuation,
            params,
            agents: Vec::new(),
            index: HashMap::new(),
            ledger: Ledger::new(),
            events: EventLog::new(),
            price_oracle: Box::new(ConstantPrice(1.0)),
            pending_spawns: Vec::new(),
        })
    }

    /// Register an agent at the end of the step order and open its account
    pub fn add_agent(
        &mut self,
        agent: Agent,
        balance_a: i64,
        balance_b: i64,
    ) -> Result<(), SimulationError> {
        let name = agent.name().to_string();
        if self.index.contains_key(&name) {
            return Err(SimulationError::InvalidConfig(format!(
                "Duplicate agent name: {}",
                name
            )));
        }
        if balance_a < 0 || balance_b < 0 {
            return Err(SimulationError::InvalidConfig(format!(
                "Starting balances of {} must be non-negative",
                name
            )));
        }
        self.ledger.open_account(&name, balance_a, balance_b)?;
        self.index.insert(name, self.agents.len());
        self.agents.push(Some(agent));
        Ok(())
    }

    /// Check that every name an agent references is registered
    pub fn validate_wiring(&self) -> Result<(), SimulationError> {
        for agent in self.agents.iter().flatten() {
            for referenced in agent.referenced_agents() {
                if !self.index.contains_key(referenced) {
                    return Err(SimulationError::InvalidConfig(format!(
                        "Agent {} references unknown agent {}",
                        agent.name(),
                        referenced
                    )));
                }
            }
        }
        for agent in self.agents.iter().flatten() {
            if let Some(treasury) = agent.as_treasury() {
                for researcher in treasury.tracked_researchers() {
                    self.researcher(researcher)?;
                }
            }
            if let Some(researcher) = agent.as_researcher() {
                let evaluator = self.treasury(researcher.evaluator())?;
                if !evaluator.tracked_researchers().iter().any(|r| r == agent.name()) {
                    return Err(SimulationError::InvalidConfig(format!(
                        "Researcher {} is not tracked by its evaluator {}",
                        agent.name(),
                        researcher.evaluator()
                    )));
                }
            }
            if let Some(generator) = agent.as_generator() {
                self.treasury(generator.evaluator())?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Look up an agent by name
    ///
    /// The agent currently stepping is checked out of the registry and is
    /// reported as unknown.
    pub fn agent(&self, name: &str) -> Result<&Agent, SimulationError> {
        self.index
            .get(name)
            .and_then(|&i| self.agents[i].as_ref())
            .ok_or_else(|| SimulationError::UnknownAgent(name.to_string()))
    }

    pub fn researcher(&self, name: &str) -> Result<&Researcher, SimulationError> {
        let agent = self.agent(name)?;
        agent
            .as_researcher()
            .ok_or_else(|| SimulationError::WrongAgentKind {
                name: name.to_string(),
                expected: "researcher",
                actual: agent.kind().label(),
            })
    }

    pub fn treasury(&self, name: &str) -> Result<&Treasury, SimulationError> {
        let agent = self.agent(name)?;
        agent
            .as_treasury()
            .ok_or_else(|| SimulationError::WrongAgentKind {
                name: name.to_string(),
                expected: "treasury",
                actual: agent.kind().label(),
            })
    }

    pub fn contains_agent(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered agents in step order
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().flatten()
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.agents().map(|a| a.name().to_string()).collect()
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    pub fn researchers(&self) -> impl Iterator<Item = (&str, &Researcher)> {
        self.agents()
            .filter_map(|a| a.as_researcher().map(|r| (a.name(), r)))
    }

    // ========================================================================
    // Ledger
    // ========================================================================

    pub fn balance(&self, name: &str, unit: Unit) -> Result<i64, SimulationError> {
        Ok(self.ledger.balance(name, unit)?)
    }

    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        unit: Unit,
        amount: i64,
    ) -> Result<(), SimulationError> {
        Ok(self.ledger.transfer(from, to, unit, amount)?)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ========================================================================
    // Run state
    // ========================================================================

    pub fn tick(&self) -> usize {
        self.time.current_tick()
    }

    pub fn time(&self) -> &TimeManager {
        &self.time
    }

    pub fn params(&self) -> &StrategyParameters {
        &self.params
    }

    pub fn kpis(&self) -> &KpiTracker {
        &self.kpis
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn log_event(&mut self, event: Event) {
        self.events.log(event);
    }

    pub fn rng_mut(&mut self) -> &mut RngManager {
        &mut self.rng
    }

    pub fn speculation_valuation(&self) -> f64 {
        self.speculation_valuation
    }

    pub fn set_price_oracle(&mut self, oracle: Box<dyn PriceOracle>) {
        self.price_oracle = oracle;
    }

    /// Unit A per unit B at the current tick
    pub fn price(&self) -> f64 {
        self.price_oracle.price(self.tick())
    }

    pub fn schedule_spawn(&mut self, request: SpawnRequest) {
        self.pending_spawns.push(request);
    }

    /// Whether `name` is registered or already queued to spawn
    pub fn name_taken(&self, name: &str) -> bool {
        self.contains_agent(name) || self.pending_spawns.iter().any(|s| s.agent.name() == name)
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Run one tick: every agent steps in registry order, spawns are
    /// applied, KPI samples recorded, then run-wide scalars updated
    pub fn take_step(&mut self) -> Result<(), SimulationError> {
        let tick = self.tick();

        for slot in 0..self.agents.len() {
            let Some(mut agent) = self.agents[slot].take() else {
                continue;
            };
            let result = agent.step(self);
            let name = agent.name().to_string();
            self.agents[slot] = Some(agent);

            result.map_err(|source| SimulationError::AgentStep {
                tick,
                agent: name,
                source: Box::new(source),
            })?;
        }

        self.apply_spawns()?;
        self.record_kpis()
            .map_err(|source| SimulationError::TickPhase {
                tick,
                phase: "record_kpis",
                source: Box::new(source),
            })?;

        let growth = self.params.valuation_growth_per_second() * self.params.seconds_per_tick as f64;
        self.speculation_valuation *= 1.0 + growth;
        Ok(())
    }

    /// Advance the clock by exactly one tick
    pub fn advance_tick(&mut self) {
        self.time.advance_tick();
    }

    fn apply_spawns(&mut self) -> Result<(), SimulationError> {
        let tick = self.tick();
        for request in std::mem::take(&mut self.pending_spawns) {
            let funder = request.funder.clone();
            self.apply_spawn(request)
                .map_err(|source| SimulationError::AgentStep {
                    tick,
                    agent: funder,
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }

    fn apply_spawn(&mut self, request: SpawnRequest) -> Result<(), SimulationError> {
        let tick = self.tick();
        let slot = *self
            .index
            .get(&request.evaluator)
            .ok_or_else(|| SimulationError::UnknownAgent(request.evaluator.clone()))?;
        if let Some(evaluator) = self.agents[slot].as_ref() {
            if evaluator.as_treasury().is_none() {
                return Err(SimulationError::WrongAgentKind {
                    name: request.evaluator.clone(),
                    expected: "treasury",
                    actual: evaluator.kind().label(),
                });
            }
        }

        let name = request.agent.name().to_string();
        self.add_agent(request.agent, 0, 0)?;
        self.transfer(&request.funder, &name, Unit::A, request.endowment_a)?;
        self.transfer(&request.funder, &name, Unit::B, request.endowment_b)?;

        if let Some(treasury) = self.agents[slot].as_mut().and_then(Agent::as_treasury_mut) {
            treasury.track_researcher(&name);
        }

        debug!(tick, researcher = %name, funder = %request.funder, "Spawned researcher");
        self.log_event(Event::ResearcherSpawned {
            tick,
            generator: request.funder,
            researcher: name,
        });
        Ok(())
    }

    fn record_kpis(&mut self) -> Result<(), SimulationError> {
        let tick = self.tick();
        let total_a = self.ledger.total(Unit::A) as f64;
        let total_b = self.ledger.total(Unit::B) as f64;

        let mut researchers = 0.0;
        let mut submitted = 0.0;
        let mut funded = 0.0;
        let mut funds = 0.0;
        let mut assets = 0.0;
        for (_, r) in self.researchers() {
            researchers += 1.0;
            submitted += r.proposals_submitted() as f64;
            funded += r.proposals_funded() as f64;
            funds += r.total_funds_received() as f64;
            assets += r.total_assets_in_market() as f64;
        }

        let samples = [
            (kpi::TOTAL_BALANCE_A, total_a),
            (kpi::TOTAL_BALANCE_B, total_b),
            (kpi::RESEARCHERS, researchers),
            (kpi::PROPOSALS_SUBMITTED, submitted),
            (kpi::PROPOSALS_FUNDED, funded),
            (kpi::GRANT_FUNDS_RECEIVED, funds),
            (kpi::KNOWLEDGE_ASSETS, assets),
            (kpi::HOLDINGS_VALUE, total_a + total_b * self.price()),
            (kpi::SPECULATION_VALUATION, self.speculation_valuation),
        ];
        for (metric, value) in samples {
            self.kpis.record_tick(metric, tick, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::agent::AgentKind;

    fn state_with_sinks() -> SimulationState {
        let mut state = SimulationState::new(StrategyParameters::default()).unwrap();
        state
            .add_agent(Agent::new("a", AgentKind::Sink), 100, 0)
            .unwrap();
        state
            .add_agent(Agent::new("b", AgentKind::Sink), 0, 0)
            .unwrap();
        state
    }

    #[test]
    fn test_duplicate_agent_rejected() {
        let mut state = state_with_sinks();
        let err = state
            .add_agent(Agent::new("a", AgentKind::Sink), 0, 0)
            .unwrap_err();
        assert!(matches!(err, SimulationError::InvalidConfig(_)));
    }

    #[test]
    fn test_unknown_agent_lookup() {
        let state = state_with_sinks();
        assert_eq!(
            state.agent("missing").unwrap_err(),
            SimulationError::UnknownAgent("missing".to_string())
        );
    }

    #[test]
    fn test_wrong_kind_lookup() {
        let state = state_with_sinks();
        assert_eq!(
            state.treasury("a").unwrap_err(),
            SimulationError::WrongAgentKind {
                name: "a".to_string(),
                expected: "treasury",
                actual: "sink",
            }
        );
    }

    #[test]
    fn test_transfer_to_unknown_agent_is_unknown_agent() {
        let mut state = state_with_sinks();
        assert_eq!(
            state.transfer("a", "ghost", Unit::A, 1).unwrap_err(),
            SimulationError::UnknownAgent("ghost".to_string())
        );
    }

    #[test]
    fn test_take_step_records_every_kpi() {
        let mut state = state_with_sinks();
        state.take_step().unwrap();
        state.advance_tick();
        state.take_step().unwrap();

        for metric in kpi::RECORDED_KPIS {
            assert_eq!(state.kpis().series(metric).unwrap().len(), 2);
        }
        assert_eq!(state.kpis().latest(kpi::TOTAL_BALANCE_A).unwrap(), Some(100.0));
    }

    #[test]
    fn test_valuation_compounds_after_recording() {
        let mut state = state_with_sinks();
        let initial = state.speculation_valuation();
        state.take_step().unwrap();

        assert_eq!(
            state.kpis().latest(kpi::SPECULATION_VALUATION).unwrap(),
            Some(initial)
        );
        assert!(state.speculation_valuation() > initial);
    }

    #[test]
    fn test_price_oracle_feeds_holdings_value() {
        let mut state = SimulationState::new(StrategyParameters::default()).unwrap();
        state
            .add_agent(Agent::new("holder", AgentKind::Sink), 10, 5)
            .unwrap();
        state.set_price_oracle(Box::new(|_tick: usize| 2.0));
        state.take_step().unwrap();
        assert_eq!(state.kpis().latest(kpi::HOLDINGS_VALUE).unwrap(), Some(20.0));
    }
}
