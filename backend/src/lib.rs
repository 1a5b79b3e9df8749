//! Funding Simulator Core
//!
//! Discrete-tick, agent-based simulator of research funding flows between
//! researchers, a DAO treasury, knowledge markets and community members.
//!
//! # Architecture
//!
//! - **core**: Tick clock and time constants
//! - **rng**: Deterministic random number generation
//! - **models**: Domain types (Ledger, Proposal, Agent, State, Events)
//! - **agents**: Per-tick behavior of each agent variant
//! - **kpi**: Per-tick metric series with rolling-window queries
//! - **orchestrator**: Run configuration, tick loop, status output
//! - **scenario**: Built-in open-science wiring
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 minor units, per unit (A, B)
//! 2. All randomness is deterministic (seeded RNG)
//! 3. Units are never created or destroyed mid-run; burns go to a sink agent
//! 4. Agents step sequentially in registry order, once per tick

pub mod agents;
pub mod core;
pub mod kpi;
pub mod models;
pub mod orchestrator;
pub mod rng;
pub mod scenario;

// Re-exports for convenience
pub use agents::{Community, Generator, Market, ProposalStatus, Researcher, Treasury};
pub use core::time::TimeManager;
pub use kpi::{KpiError, KpiSeries, KpiTracker};
pub use models::{
    agent::{Agent, AgentKind},
    event::{Event, EventLog},
    ledger::{Ledger, LedgerError, Unit},
    proposal::{Proposal, ProposalError, ProposalEvaluation, ProposalTemplate},
    state::{ConstantPrice, PriceOracle, SimulationState},
    weights::{ReceivingAgents, Weight, WeightSpec},
};
pub use orchestrator::{
    CsvSink, MemorySink, RunSummary, SimEngine, SimulationConfig, SimulationError,
    StatusSink, StrategyParameters,
};
pub use rng::RngManager;
