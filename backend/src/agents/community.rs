//! Community member agent
//!
//! Buys from a market on a fixed tick interval. A purchase it cannot
//! afford is simply skipped.

use crate::models::ledger::Unit;
use crate::models::state::SimulationState;
use crate::orchestrator::SimulationError;

#[derive(Debug, Clone)]
pub struct Community {
    market: String,
    unit: Unit,
    purchase_amount: i64,
    purchase_interval_ticks: usize,

    purchases: u32,
    total_spent: i64,
}

impl Community {
    pub fn new(
        market: impl Into<String>,
        unit: Unit,
        purchase_amount: i64,
        purchase_interval_ticks: usize,
    ) -> Result<Self, SimulationError> {
        if purchase_interval_ticks == 0 {
            return Err(SimulationError::InvalidConfig(
                "purchase_interval_ticks must be > 0".to_string(),
            ));
        }
        if purchase_amount < 0 {
            return Err(SimulationError::InvalidConfig(
                "purchase_amount must be non-negative".to_string(),
            ));
        }
        Ok(Self {
            market: market.into(),
            unit,
            purchase_amount,
            purchase_interval_ticks,
            purchases: 0,
            total_spent: 0,
        })
    }

    pub fn purchases(&self) -> u32 {
        self.purchases
    }

    pub fn total_spent(&self) -> i64 {
        self.total_spent
    }

    pub fn referenced_agents(&self) -> Vec<&str> {
        vec![self.market.as_str()]
    }

    pub fn step(&mut self, name: &str, state: &mut SimulationState) -> Result<(), SimulationError> {
        if state.tick() % self.purchase_interval_ticks != 0 || self.purchase_amount == 0 {
            return Ok(());
        }
        if state.balance(name, self.unit)? < self.purchase_amount {
            return Ok(());
        }
        state.transfer(name, &self.market, self.unit, self.purchase_amount)?;
        self.purchases += 1;
        self.total_spent += self.purchase_amount;
        Ok(())
    }
}
