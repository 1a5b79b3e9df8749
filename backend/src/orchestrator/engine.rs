//! Simulation Engine
//!
//! Drives a [`SimulationState`] through discrete ticks until the configured
//! tick bound is reached.
//!
//! # Tick Loop
//!
//! ```text
//! For each tick t (starting at 0):
//! 1. Emit a status row if elapsed seconds is a multiple of the log interval
//! 2. state.take_step(): every agent steps in registry order, spawns are
//!    applied, KPI samples recorded, run-wide scalars updated
//! 3. Stop if t >= max_ticks
//! 4. Advance the clock by exactly one tick
//! ```
//!
//! Any error raised inside the loop aborts the run; the engine never retries.
//!
//! # Example
//!
//! ```rust
//! use funding_simulator_core_rs::orchestrator::{MemorySink, SimEngine};
//! use funding_simulator_core_rs::scenario::{open_science, ScenarioOptions};
//!
//! let options = ScenarioOptions { max_ticks: 48, ..Default::default() };
//! let state = open_science(&options).unwrap();
//! let mut engine = SimEngine::new(state, MemorySink::new());
//!
//! let summary = engine.run().unwrap();
//! assert_eq!(summary.final_tick, 48);
//! assert_eq!(engine.sink().headers.len(), 1);
//! ```

use crate::kpi::{self, KpiError};
use crate::models::ledger::{LedgerError, Unit};
use crate::models::state::SimulationState;
use crate::models::weights::WeightError;
use crate::orchestrator::status::{kpi_columns, StatusColumn, StatusRow, StatusSink};
use thiserror::Error;
use tracing::{debug, error, info};

// ============================================================================
// Errors
// ============================================================================

/// Run-level error; every variant is fatal to the run
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Agent {name} is a {actual}, expected a {expected}")]
    WrongAgentKind {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Malformed proposal from {researcher}: {reason}")]
    MalformedProposal { researcher: String, reason: String },

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),

    #[error("KPI error: {0}")]
    Kpi(#[from] KpiError),

    #[error("Tick {tick}, agent {agent}: {source}")]
    AgentStep {
        tick: usize,
        agent: String,
        source: Box<SimulationError>,
    },

    #[error("Tick {tick}, {phase}: {source}")]
    TickPhase {
        tick: usize,
        phase: &'static str,
        source: Box<SimulationError>,
    },

    #[error("Status sink error: {0}")]
    Sink(String),
}

impl From<LedgerError> for SimulationError {
    fn from(err: LedgerError) -> Self {
        match err {
            // Accounts mirror the agent registry one-to-one
            LedgerError::UnknownAccount(name) => SimulationError::UnknownAgent(name),
            other => SimulationError::Ledger(other),
        }
    }
}

impl From<WeightError> for SimulationError {
    fn from(err: WeightError) -> Self {
        SimulationError::InvalidConfig(err.to_string())
    }
}

impl SimulationError {
    /// Innermost error, unwrapping any `AgentStep` context
    pub fn root_cause(&self) -> &SimulationError {
        match self {
            SimulationError::AgentStep { source, .. }
            | SimulationError::TickPhase { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Totals reported when a run stops
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub final_tick: usize,
    pub ticks_executed: usize,
    pub status_rows: usize,
    pub total_balance_a: i64,
    pub total_balance_b: i64,
    pub kpi_digest: String,
}

pub struct SimEngine<S: StatusSink> {
    state: SimulationState,
    sink: S,
    columns: Vec<StatusColumn>,
    header_written: bool,
    status_rows: usize,
    ticks_executed: usize,
}

impl<S: StatusSink> SimEngine<S> {
    /// Engine whose status rows carry the latest value of every recorded KPI
    pub fn new(state: SimulationState, sink: S) -> Self {
        Self::with_columns(state, sink, kpi_columns(&kpi::RECORDED_KPIS))
    }

    pub fn with_columns(state: SimulationState, sink: S, columns: Vec<StatusColumn>) -> Self {
        Self {
            state,
            sink,
            columns,
            header_written: false,
            status_rows: 0,
            ticks_executed: 0,
        }
    }

    /// Run until `should_stop`, propagating the first error
    pub fn run(&mut self) -> Result<RunSummary, SimulationError> {
        info!(
            max_ticks = self.state.params().max_ticks,
            agents = self.state.num_agents(),
            seed = self.state.params().rng_seed,
            "Begin simulation"
        );

        loop {
            if let Err(err) = self.take_step() {
                error!(tick = self.state.tick(), error = %err, "Simulation aborted");
                return Err(err);
            }
            if self.should_stop() {
                break;
            }
            self.state.advance_tick();
        }

        let summary = self.summary()?;
        info!(
            final_tick = summary.final_tick,
            status_rows = summary.status_rows,
            digest = %summary.kpi_digest,
            "End simulation"
        );
        Ok(summary)
    }

    /// Execute the current tick without advancing the clock
    pub fn take_step(&mut self) -> Result<(), SimulationError> {
        let tick = self.state.tick();
        if self.elapsed_seconds() % self.state.params().log_interval_seconds == 0 {
            self.emit_status()?;
        }
        debug!(tick, "Take step");
        self.state.take_step()?;
        self.ticks_executed += 1;
        Ok(())
    }

    pub fn should_stop(&self) -> bool {
        let stop = self.state.tick() >= self.state.params().max_ticks;
        if stop {
            info!(tick = self.state.tick(), "Stop condition reached");
        }
        stop
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.state.time().elapsed_seconds()
    }

    fn emit_status(&mut self) -> Result<(), SimulationError> {
        let row = StatusRow::capture(&self.state, &self.columns);
        if !self.header_written {
            self.sink
                .write_header(&row.header())
                .map_err(|e| SimulationError::Sink(e.to_string()))?;
            self.header_written = true;
        }
        self.sink
            .write_row(&row)
            .map_err(|e| SimulationError::Sink(e.to_string()))?;
        self.status_rows += 1;
        info!("{}", row.console_line());
        Ok(())
    }

    fn summary(&self) -> Result<RunSummary, SimulationError> {
        Ok(RunSummary {
            final_tick: self.state.tick(),
            ticks_executed: self.ticks_executed,
            status_rows: self.status_rows,
            total_balance_a: self.state.ledger().total(Unit::A),
            total_balance_b: self.state.ledger().total(Unit::B),
            kpi_digest: self.state.kpis().digest()?,
        })
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (SimulationState, S) {
        (self.state, self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::agent::{Agent, AgentKind};
    use crate::orchestrator::status::MemorySink;
    use crate::orchestrator::StrategyParameters;

    fn idle_state(max_ticks: usize) -> SimulationState {
        let params = StrategyParameters {
            max_ticks,
            ..Default::default()
        };
        let mut state = SimulationState::new(params).unwrap();
        state
            .add_agent(Agent::new("burner", AgentKind::Sink), 10, 10)
            .unwrap();
        state
    }

    #[test]
    fn test_run_stops_at_max_ticks() {
        let mut engine = SimEngine::new(idle_state(30), MemorySink::new());
        let summary = engine.run().unwrap();

        assert_eq!(summary.final_tick, 30);
        assert_eq!(summary.ticks_executed, 31);
        assert_eq!(engine.state().tick(), 30);
    }

    #[test]
    fn test_zero_max_ticks_runs_single_step() {
        let mut engine = SimEngine::new(idle_state(0), MemorySink::new());
        let summary = engine.run().unwrap();
        assert_eq!(summary.final_tick, 0);
        assert_eq!(summary.ticks_executed, 1);
    }

    #[test]
    fn test_status_rows_once_per_day() {
        // Hourly ticks: rows at ticks 0, 24, 48
        let mut engine = SimEngine::new(idle_state(50), MemorySink::new());
        engine.run().unwrap();

        let sink = engine.sink();
        assert_eq!(sink.headers.len(), 1);
        let ticks: Vec<usize> = sink.rows.iter().map(|r| r.tick).collect();
        assert_eq!(ticks, vec![0, 24, 48]);
    }

    #[test]
    fn test_ledger_error_mapping() {
        let err: SimulationError = LedgerError::UnknownAccount("x".to_string()).into();
        assert_eq!(err, SimulationError::UnknownAgent("x".to_string()));

        let err: SimulationError = LedgerError::NegativeAmount(-1).into();
        assert!(matches!(err, SimulationError::Ledger(_)));
    }

    #[test]
    fn test_root_cause_unwraps_agent_step() {
        let err = SimulationError::AgentStep {
            tick: 3,
            agent: "dao".to_string(),
            source: Box::new(SimulationError::UnknownAgent("ghost".to_string())),
        };
        assert_eq!(
            err.root_cause(),
            &SimulationError::UnknownAgent("ghost".to_string())
        );
        assert_eq!(err.to_string(), "Tick 3, agent dao: Unknown agent: ghost");
    }
}
