//! Event log for the proposal lifecycle
//!
//! Events capture the cross-agent protocol transitions so a run can be
//! audited after the fact: who proposed when, who won each round, and
//! which grants moved. Plain balance transfers are not logged.
//!
//! # Example
//!
//! ```rust
//! use funding_simulator_core_rs::models::event::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::ProposalSubmitted {
//!     tick: 0,
//!     researcher: "researcher0".to_string(),
//!     grant_requested: 10_000,
//! });
//! assert_eq!(log.events_at_tick(0).len(), 1);
//! ```

use serde::{Deserialize, Serialize};

/// Simulation event capturing a protocol transition
///
/// Events are logged in the order they occur within a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Researcher entered ProposalPending with a fresh proposal
    ProposalSubmitted {
        tick: usize,
        researcher: String,
        grant_requested: i64,
    },

    /// Evaluator selected a winner over all pending proposals
    ProposalEvaluated {
        tick: usize,
        evaluator: String,
        winner: String,
        candidates: usize,
    },

    /// Evaluator moved the winning grant to the winner
    GrantTransferred {
        tick: usize,
        evaluator: String,
        researcher: String,
        amount: i64,
    },

    /// Winner observed its evaluation
    ProposalFunded {
        tick: usize,
        researcher: String,
        grant_requested: i64,
        disbursed: bool,
    },

    /// Loser observed its evaluation
    ProposalRejected { tick: usize, researcher: String },

    /// Generator added a researcher to the run
    ResearcherSpawned {
        tick: usize,
        generator: String,
        researcher: String,
    },
}

impl Event {
    pub fn tick(&self) -> usize {
        match self {
            Event::ProposalSubmitted { tick, .. }
            | Event::ProposalEvaluated { tick, .. }
            | Event::GrantTransferred { tick, .. }
            | Event::ProposalFunded { tick, .. }
            | Event::ProposalRejected { tick, .. }
            | Event::ResearcherSpawned { tick, .. } => *tick,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ProposalSubmitted { .. } => "ProposalSubmitted",
            Event::ProposalEvaluated { .. } => "ProposalEvaluated",
            Event::GrantTransferred { .. } => "GrantTransferred",
            Event::ProposalFunded { .. } => "ProposalFunded",
            Event::ProposalRejected { .. } => "ProposalRejected",
            Event::ResearcherSpawned { .. } => "ResearcherSpawned",
        }
    }

    /// Researcher the event is about, if any
    pub fn researcher(&self) -> Option<&str> {
        match self {
            Event::ProposalSubmitted { researcher, .. }
            | Event::GrantTransferred { researcher, .. }
            | Event::ProposalFunded { researcher, .. }
            | Event::ProposalRejected { researcher, .. }
            | Event::ResearcherSpawned { researcher, .. } => Some(researcher),
            Event::ProposalEvaluated { winner, .. } => Some(winner),
        }
    }
}

/// Append-only event log
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_at_tick(&self, tick: usize) -> Vec<&Event> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_researcher(&self, researcher: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.researcher() == Some(researcher))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters() {
        let mut log = EventLog::new();
        log.log(Event::ProposalSubmitted {
            tick: 0,
            researcher: "r0".to_string(),
            grant_requested: 5,
        });
        log.log(Event::ProposalRejected {
            tick: 1,
            researcher: "r1".to_string(),
        });

        assert_eq!(log.events_of_type("ProposalRejected").len(), 1);
        assert_eq!(log.events_for_researcher("r0").len(), 1);
        assert!(log.events_at_tick(2).is_empty());
    }
}
