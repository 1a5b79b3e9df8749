//! Agent behaviors
//!
//! Each variant implements one `step(name, state)` called exactly once per
//! tick in registry order. A step may read any agent through the state,
//! issue transfers originating from its own account, and mutate only its
//! own fields. Cross-agent effects happen through transfers and through
//! the read-only records agents publish (proposals, evaluations).
//!
//! Available behaviors:
//! 1. **Researcher**: authors proposals on a cadence, spends grants
//! 2. **Treasury**: evaluates proposals, funds winners, routes inflows
//! 3. **Market**: withholds a transaction fee and forwards the rest
//! 4. **Community**: periodically buys from a market
//! 5. **Generator**: spawns new researchers over time

pub mod community;
pub mod generator;
pub mod market;
pub mod researcher;
pub mod treasury;

pub use community::Community;
pub use generator::{Generator, ResearcherTemplate};
pub use market::Market;
pub use researcher::{ProposalStatus, Researcher};
pub use treasury::Treasury;

use crate::models::ledger::Unit;
use crate::models::state::SimulationState;
use crate::models::weights::ReceivingAgents;
use crate::orchestrator::SimulationError;

/// Send each recipient its weighted share of `base` from `from`'s account
///
/// Shares are clamped to what remains in the sender's balance, so a table
/// whose weights sum past 1 drains the sender instead of failing. Returns
/// the total amount sent.
pub(crate) fn route(
    state: &mut SimulationState,
    from: &str,
    unit: Unit,
    base: i64,
    receivers: &ReceivingAgents,
) -> Result<i64, SimulationError> {
    let mut sent = 0;
    for (to, share) in receivers.shares(state, base) {
        let amount = share.min(state.balance(from, unit)?);
        if amount > 0 {
            state.transfer(from, &to, unit, amount)?;
            sent += amount;
        }
    }
    Ok(sent)
}
