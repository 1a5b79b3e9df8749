//! Agent model
//!
//! An agent is a name plus one variant from a closed set of behaviors.
//! Balances are not stored here: they live in the state's [`Ledger`]
//! account of the same name, so value can move to an agent even while
//! that agent is checked out of the registry for its own step.
//!
//! [`Ledger`]: crate::models::ledger::Ledger

use crate::agents::{Community, Generator, Market, Researcher, Treasury};
use crate::models::state::SimulationState;
use crate::orchestrator::SimulationError;

/// Behavior variant of an agent
#[derive(Debug, Clone)]
pub enum AgentKind {
    Researcher(Researcher),
    Treasury(Treasury),
    Market(Market),
    Community(Community),
    Generator(Generator),
    /// Passive account (e.g. burn destination)
    Sink,
}

impl AgentKind {
    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::Researcher(_) => "researcher",
            AgentKind::Treasury(_) => "treasury",
            AgentKind::Market(_) => "market",
            AgentKind::Community(_) => "community",
            AgentKind::Generator(_) => "generator",
            AgentKind::Sink => "sink",
        }
    }
}

/// A named participant in the simulation
///
/// # Example
/// ```
/// use funding_simulator_core_rs::{Agent, AgentKind};
///
/// let burner = Agent::new("burner", AgentKind::Sink);
/// assert_eq!(burner.name(), "burner");
/// assert!(burner.as_researcher().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Agent {
    name: String,
    kind: AgentKind,
}

impl Agent {
    pub fn new(name: impl Into<String>, kind: AgentKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AgentKind {
        &self.kind
    }

    pub fn as_researcher(&self) -> Option<&Researcher> {
        match &self.kind {
            AgentKind::Researcher(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_treasury(&self) -> Option<&Treasury> {
        match &self.kind {
            AgentKind::Treasury(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_market(&self) -> Option<&Market> {
        match &self.kind {
            AgentKind::Market(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_community(&self) -> Option<&Community> {
        match &self.kind {
            AgentKind::Community(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_generator(&self) -> Option<&Generator> {
        match &self.kind {
            AgentKind::Generator(g) => Some(g),
            _ => None,
        }
    }

    pub(crate) fn as_treasury_mut(&mut self) -> Option<&mut Treasury> {
        match &mut self.kind {
            AgentKind::Treasury(t) => Some(t),
            _ => None,
        }
    }

    /// Names of every agent this one reads from or sends to
    pub fn referenced_agents(&self) -> Vec<&str> {
        match &self.kind {
            AgentKind::Researcher(r) => r.referenced_agents(),
            AgentKind::Treasury(t) => t.referenced_agents(),
            AgentKind::Market(m) => m.referenced_agents(),
            AgentKind::Community(c) => c.referenced_agents(),
            AgentKind::Generator(g) => g.referenced_agents(),
            AgentKind::Sink => Vec::new(),
        }
    }

    /// Run this agent's behavior for the current tick
    pub fn step(&mut self, state: &mut SimulationState) -> Result<(), SimulationError> {
        let name = self.name.as_str();
        match &mut self.kind {
            AgentKind::Researcher(r) => r.step(name, state),
            AgentKind::Treasury(t) => t.step(name, state),
            AgentKind::Market(m) => m.step(name, state),
            AgentKind::Community(c) => c.step(name, state),
            AgentKind::Generator(g) => g.step(name, state),
            AgentKind::Sink => Ok(()),
        }
    }
}
