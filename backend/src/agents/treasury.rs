//! Treasury agent (DAO)
//!
//! Evaluates proposals from its tracked researchers, funds the winner, and
//! routes everything else it holds to its receiving agents in the same
//! tick. Weights that sum below 1 leave a reserve in the treasury.
//!
//! An evaluation round opens when every tracked researcher holds a
//! proposal and at least one of those proposals is not covered by the
//! current evaluation.

use crate::agents::route;
use crate::core::time::S_PER_MONTH;
use crate::kpi::KpiSeries;
use crate::models::event::Event;
use crate::models::ledger::Unit;
use crate::models::proposal::{Proposal, ProposalEvaluation};
use crate::models::state::SimulationState;
use crate::models::weights::ReceivingAgents;
use crate::orchestrator::SimulationError;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Treasury {
    tracked_researchers: Vec<String>,
    receiving_agents: ReceivingAgents,
    /// Transfer the winning grant to the winner on evaluation
    fund_winner: bool,

    evaluation: Option<ProposalEvaluation>,
    evaluations: u32,
    grants_paid: i64,
    grants_unfunded: u32,

    /// Holdings at the start of each step, before disbursing
    balance_a_per_tick: KpiSeries,
    balance_b_per_tick: KpiSeries,
}

impl Treasury {
    pub fn new(
        tracked_researchers: Vec<String>,
        receiving_agents: ReceivingAgents,
        fund_winner: bool,
    ) -> Self {
        Self {
            tracked_researchers,
            receiving_agents,
            fund_winner,
            evaluation: None,
            evaluations: 0,
            grants_paid: 0,
            grants_unfunded: 0,
            balance_a_per_tick: KpiSeries::new(),
            balance_b_per_tick: KpiSeries::new(),
        }
    }

    /// Latest evaluation, readable by every researcher
    pub fn evaluation(&self) -> Option<&ProposalEvaluation> {
        self.evaluation.as_ref()
    }

    pub fn tracked_researchers(&self) -> &[String] {
        &self.tracked_researchers
    }

    pub fn evaluations(&self) -> u32 {
        self.evaluations
    }

    pub fn grants_paid(&self) -> i64 {
        self.grants_paid
    }

    /// Winners the treasury could not afford to fund
    pub fn grants_unfunded(&self) -> u32 {
        self.grants_unfunded
    }

    pub fn referenced_agents(&self) -> Vec<&str> {
        self.tracked_researchers
            .iter()
            .map(String::as_str)
            .chain(self.receiving_agents.names())
            .collect()
    }

    pub(crate) fn track_researcher(&mut self, name: &str) {
        if !self.tracked_researchers.iter().any(|r| r == name) {
            self.tracked_researchers.push(name.to_string());
        }
    }

    /// Amount of `unit` that passed through the treasury over the last
    /// simulated month
    ///
    /// Assumes the treasury disburses inflows as soon as it receives them.
    /// The window starts at the first tick at or after one month ago
    /// (rounded up), so when a month is not a whole number of ticks the
    /// sample straddling the boundary is excluded.
    pub fn monthly_received(&self, unit: Unit, state: &SimulationState) -> f64 {
        let series = match unit {
            Unit::A => &self.balance_a_per_tick,
            Unit::B => &self.balance_b_per_tick,
        };
        let Some(last) = series.len().checked_sub(1) else {
            return 0.0;
        };
        let tick = state.tick().min(last);
        series
            .window(S_PER_MONTH, tick, state.params().seconds_per_tick)
            .map(|samples| samples.iter().sum())
            .unwrap_or(0.0)
    }

    pub fn step(&mut self, name: &str, state: &mut SimulationState) -> Result<(), SimulationError> {
        if let Some(candidates) = self.pending_proposals(state)? {
            self.evaluate(name, candidates, state)?;
        }

        self.balance_a_per_tick.push(state.balance(name, Unit::A)? as f64);
        self.balance_b_per_tick.push(state.balance(name, Unit::B)? as f64);

        for unit in [Unit::A, Unit::B] {
            let balance = state.balance(name, unit)?;
            if balance > 0 {
                route(state, name, unit, balance, &self.receiving_agents)?;
            }
        }
        Ok(())
    }

    /// Proposals to score this tick, if a round is open
    fn pending_proposals(
        &self,
        state: &SimulationState,
    ) -> Result<Option<Vec<(String, Proposal)>>, SimulationError> {
        if self.tracked_researchers.is_empty() {
            return Ok(None);
        }

        let mut candidates = Vec::with_capacity(self.tracked_researchers.len());
        for researcher in &self.tracked_researchers {
            match state.researcher(researcher)?.proposal() {
                Some(proposal) => candidates.push((researcher.clone(), proposal.clone())),
                None => return Ok(None),
            }
        }

        let already_scored = self.evaluation.as_ref().map_or(false, |e| {
            candidates
                .iter()
                .all(|(r, p)| e.covers(r, p.authored_tick))
        });
        Ok((!already_scored).then_some(candidates))
    }

    fn evaluate(
        &mut self,
        name: &str,
        candidates: Vec<(String, Proposal)>,
        state: &mut SimulationState,
    ) -> Result<(), SimulationError> {
        let tick = state.tick();

        for (researcher, proposal) in &candidates {
            proposal
                .score()
                .map_err(|e| SimulationError::MalformedProposal {
                    researcher: researcher.clone(),
                    reason: e.to_string(),
                })?;
        }

        let evaluation = ProposalEvaluation::evaluate(
            candidates.iter().map(|(r, p)| (r.as_str(), p)),
            tick,
        )
        .map_err(|e| SimulationError::MalformedProposal {
            researcher: name.to_string(),
            reason: e.to_string(),
        })?;

        debug!(tick, evaluator = name, winner = %evaluation.winner, "Proposals evaluated");
        state.log_event(Event::ProposalEvaluated {
            tick,
            evaluator: name.to_string(),
            winner: evaluation.winner.clone(),
            candidates: candidates.len(),
        });
        self.evaluations += 1;

        if self.fund_winner {
            if let Some(entry) = evaluation.winning_entry() {
                let grant = entry.grant_requested;
                if state.balance(name, Unit::B)? >= grant {
                    state.transfer(name, &entry.researcher, Unit::B, grant)?;
                    self.grants_paid += grant;
                    state.log_event(Event::GrantTransferred {
                        tick,
                        evaluator: name.to_string(),
                        researcher: entry.researcher.clone(),
                        amount: grant,
                    });
                } else {
                    debug!(tick, evaluator = name, grant, "Winning grant not yet fundable");
                    self.grants_unfunded += 1;
                }
            }
        }

        self.evaluation = Some(evaluation);
        Ok(())
    }
}
