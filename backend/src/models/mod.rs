//! Domain models for the funding simulator

pub mod agent;
pub mod event;
pub mod ledger;
pub mod proposal;
pub mod state;
pub mod weights;

// Re-exports
pub use agent::{Agent, AgentKind};
pub use event::{Event, EventLog};
pub use ledger::{Account, Ledger, LedgerError, Unit};
pub use proposal::{Proposal, ProposalError, ProposalEvaluation, ProposalTemplate};
pub use weights::{ReceivingAgents, StrategyWeight, Weight, WeightError, WeightSpec};
