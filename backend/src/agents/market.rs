//! Knowledge market agent
//!
//! On every tick where it holds a unit, the market withholds
//! `transaction_fee_percent` of that balance for its fee-receiving agents
//! and forwards the remainder through its receiving agents.

use crate::agents::route;
use crate::models::ledger::Unit;
use crate::models::state::SimulationState;
use crate::models::weights::ReceivingAgents;
use crate::orchestrator::SimulationError;

#[derive(Debug, Clone)]
pub struct Market {
    transaction_fee_percent: f64,
    fee_receiving_agents: ReceivingAgents,
    receiving_agents: ReceivingAgents,

    fees_collected_a: i64,
    fees_collected_b: i64,
    volume_a: i64,
    volume_b: i64,
}

impl Market {
    pub fn new(
        transaction_fee_percent: f64,
        fee_receiving_agents: ReceivingAgents,
        receiving_agents: ReceivingAgents,
    ) -> Result<Self, SimulationError> {
        if !(0.0..=1.0).contains(&transaction_fee_percent) {
            return Err(SimulationError::InvalidConfig(format!(
                "transaction_fee_percent must be within [0, 1], got {}",
                transaction_fee_percent
            )));
        }
        Ok(Self {
            transaction_fee_percent,
            fee_receiving_agents,
            receiving_agents,
            fees_collected_a: 0,
            fees_collected_b: 0,
            volume_a: 0,
            volume_b: 0,
        })
    }

    pub fn transaction_fee_percent(&self) -> f64 {
        self.transaction_fee_percent
    }

    pub fn fees_collected(&self, unit: Unit) -> i64 {
        match unit {
            Unit::A => self.fees_collected_a,
            Unit::B => self.fees_collected_b,
        }
    }

    /// Total inflow handled by the market
    pub fn volume(&self, unit: Unit) -> i64 {
        match unit {
            Unit::A => self.volume_a,
            Unit::B => self.volume_b,
        }
    }

    pub fn referenced_agents(&self) -> Vec<&str> {
        self.fee_receiving_agents
            .names()
            .chain(self.receiving_agents.names())
            .collect()
    }

    pub fn step(&mut self, name: &str, state: &mut SimulationState) -> Result<(), SimulationError> {
        for unit in [Unit::A, Unit::B] {
            let inflow = state.balance(name, unit)?;
            if inflow <= 0 {
                continue;
            }

            let fee = (inflow as f64 * self.transaction_fee_percent).floor() as i64;
            let fees = route(state, name, unit, fee, &self.fee_receiving_agents)?;

            let remainder = state.balance(name, unit)?;
            route(state, name, unit, remainder, &self.receiving_agents)?;

            match unit {
                Unit::A => {
                    self.fees_collected_a += fees;
                    self.volume_a += inflow;
                }
                Unit::B => {
                    self.fees_collected_b += fees;
                    self.volume_b += inflow;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_out_of_range_rejected() {
        let err = Market::new(1.5, ReceivingAgents::default(), ReceivingAgents::default())
            .unwrap_err();
        assert!(matches!(err, SimulationError::InvalidConfig(_)));
    }
}
