//! Researcher agent
//!
//! Authors proposals on a cadence and reacts to the evaluator's decision.
//!
//! ```text
//! NoProposal ──► Pending ──► Funded ──┐
//!                   ▲    └─► Rejected ┤
//!                   └──── cadence ────┘
//! ```
//!
//! - A fresh proposal is authored when none is open, or whenever
//!   `ticks_since_proposal % ticks_between_proposals == 0`. The periodic
//!   refresh fires whether or not the previous outcome was observed.
//! - The outcome is checked exactly one tick after authoring. If the
//!   evaluator has not yet scored this proposal, the counter resets and the
//!   researcher waits another tick with the same proposal.
//! - A winner that holds enough unit B disburses the grant to its
//!   receiving agents and gains one unit of knowledge access.

use crate::agents::route;
use crate::models::event::Event;
use crate::models::ledger::Unit;
use crate::models::proposal::{Proposal, ProposalEvaluation, ProposalTemplate};
use crate::models::state::SimulationState;
use crate::models::weights::ReceivingAgents;
use crate::orchestrator::SimulationError;
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    NoProposal,
    Pending,
    Funded,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct Researcher {
    evaluator: String,
    receiving_agents: ReceivingAgents,
    /// Fixed proposal parameters; random draws when `None`
    template: Option<ProposalTemplate>,

    proposal: Option<Proposal>,
    status: ProposalStatus,
    new_proposal: bool,
    ticks_since_proposal: usize,
    knowledge_access: f64,

    proposals_submitted: u32,
    proposals_funded: u32,
    total_funds_received: i64,
    total_assets_in_market: u64,
    holdings_b_at_evaluation: i64,
    last_tick_spent: Option<usize>,
}

impl Researcher {
    pub fn new(
        evaluator: impl Into<String>,
        receiving_agents: ReceivingAgents,
        template: Option<ProposalTemplate>,
    ) -> Self {
        Self {
            evaluator: evaluator.into(),
            receiving_agents,
            template,
            proposal: None,
            status: ProposalStatus::NoProposal,
            new_proposal: false,
            ticks_since_proposal: 0,
            knowledge_access: 1.0,
            proposals_submitted: 0,
            proposals_funded: 0,
            total_funds_received: 0,
            total_assets_in_market: 0,
            holdings_b_at_evaluation: 0,
            last_tick_spent: None,
        }
    }

    pub fn evaluator(&self) -> &str {
        &self.evaluator
    }

    pub fn proposal(&self) -> Option<&Proposal> {
        self.proposal.as_ref()
    }

    pub fn status(&self) -> ProposalStatus {
        self.status
    }

    /// True from authoring until the outcome is observed
    pub fn has_new_proposal(&self) -> bool {
        self.new_proposal
    }

    pub fn ticks_since_proposal(&self) -> usize {
        self.ticks_since_proposal
    }

    pub fn knowledge_access(&self) -> f64 {
        self.knowledge_access
    }

    pub fn proposals_submitted(&self) -> u32 {
        self.proposals_submitted
    }

    pub fn proposals_funded(&self) -> u32 {
        self.proposals_funded
    }

    pub fn total_funds_received(&self) -> i64 {
        self.total_funds_received
    }

    pub fn total_assets_in_market(&self) -> u64 {
        self.total_assets_in_market
    }

    /// Unit B held when the last evaluation was observed
    pub fn holdings_b_at_evaluation(&self) -> i64 {
        self.holdings_b_at_evaluation
    }

    /// Tick of the last grant disbursement
    pub fn last_tick_spent(&self) -> Option<usize> {
        self.last_tick_spent
    }

    pub fn referenced_agents(&self) -> Vec<&str> {
        let mut names = vec![self.evaluator.as_str()];
        names.extend(self.receiving_agents.names());
        names
    }

    pub fn step(&mut self, name: &str, state: &mut SimulationState) -> Result<(), SimulationError> {
        let cadence = state.params().ticks_between_proposals;

        if self.proposal.is_some() {
            self.ticks_since_proposal += 1;
        }

        if self.proposal.is_none() || self.ticks_since_proposal % cadence == 0 {
            self.submit_proposal(name, state);
        }

        if self.ticks_since_proposal == 1 {
            self.check_evaluation(name, state)?;
        }

        if self.proposal.is_some() {
            let balance_a = state.balance(name, Unit::A)?;
            if balance_a > 0 {
                route(state, name, Unit::A, balance_a, &self.receiving_agents)?;
            }
        }
        Ok(())
    }

    fn submit_proposal(&mut self, name: &str, state: &mut SimulationState) {
        let tick = state.tick();
        let proposal = match &self.template {
            Some(template) => Proposal::from_template(template, self.knowledge_access, tick),
            None => random_proposal(state.rng_mut(), self.knowledge_access, tick),
        };

        debug!(tick, researcher = name, grant = proposal.grant_requested, "Proposal submitted");
        state.log_event(Event::ProposalSubmitted {
            tick,
            researcher: name.to_string(),
            grant_requested: proposal.grant_requested,
        });

        self.proposal = Some(proposal);
        self.status = ProposalStatus::Pending;
        self.new_proposal = true;
        self.proposals_submitted += 1;
        self.ticks_since_proposal = 0;
    }

    fn check_evaluation(&mut self, name: &str, state: &mut SimulationState) -> Result<(), SimulationError> {
        let Some(proposal) = self.proposal.clone() else {
            return Ok(());
        };
        let evaluation = state
            .treasury(&self.evaluator)?
            .evaluation()
            .filter(|e| e.covers(name, proposal.authored_tick))
            .cloned();

        match evaluation {
            None => {
                debug!(tick = state.tick(), researcher = name, "No evaluation yet, waiting");
                self.ticks_since_proposal = 0;
                self.new_proposal = true;
            }
            Some(evaluation) => {
                self.new_proposal = false;
                self.observe_outcome(name, &proposal, &evaluation, state)?;
                self.holdings_b_at_evaluation = state.balance(name, Unit::B)?;
            }
        }
        Ok(())
    }

    fn observe_outcome(
        &mut self,
        name: &str,
        proposal: &Proposal,
        evaluation: &ProposalEvaluation,
        state: &mut SimulationState,
    ) -> Result<(), SimulationError> {
        let tick = state.tick();

        if evaluation.winner != name {
            self.status = ProposalStatus::Rejected;
            state.log_event(Event::ProposalRejected {
                tick,
                researcher: name.to_string(),
            });
            return Ok(());
        }

        self.status = ProposalStatus::Funded;
        self.proposals_funded += 1;
        self.total_assets_in_market += proposal.assets_generated as u64;
        self.total_funds_received += proposal.grant_requested;

        let disbursed = state.balance(name, Unit::B)? >= proposal.grant_requested;
        if disbursed {
            self.last_tick_spent = Some(tick);
            route(
                state,
                name,
                Unit::B,
                proposal.grant_requested,
                &self.receiving_agents,
            )?;
            self.knowledge_access += 1.0;
        } else {
            debug!(tick, researcher = name, "Grant not yet covered by holdings");
        }

        state.log_event(Event::ProposalFunded {
            tick,
            researcher: name.to_string(),
            grant_requested: proposal.grant_requested,
            disbursed,
        });
        Ok(())
    }
}

/// Draw proposal parameters from the run's seeded generator
pub fn random_proposal(rng: &mut RngManager, knowledge_access: f64, tick: usize) -> Proposal {
    Proposal {
        grant_requested: rng.range_inclusive(10_000, 50_000),
        assets_generated: rng.range_inclusive(1, 10) as u32,
        num_researchers: rng.range_inclusive(1, 10) as u32,
        research_length_months: rng.range_inclusive(1, 24) as u32,
        knowledge_access,
        authored_tick: tick,
    }
}
