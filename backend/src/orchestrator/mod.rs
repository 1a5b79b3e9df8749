//! Orchestrator - run configuration, tick loop and status output
//!
//! See `engine.rs` for the loop itself.

pub mod config;
pub mod engine;
pub mod status;

pub use config::{AgentConfig, AgentKindConfig, SimulationConfig, StrategyParameters};
pub use engine::{RunSummary, SimEngine, SimulationError};
pub use status::{
    format_g, kpi_columns, CsvSink, MemorySink, StatusColumn, StatusRow, StatusSink,
};
