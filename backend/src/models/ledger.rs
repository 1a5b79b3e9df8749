//! Ledger primitive
//!
//! Every agent owns one account holding two non-negative balances, one per
//! fungible unit. Balances change only through [`Ledger::transfer`], which
//! moves value atomically between two accounts of the same unit.
//!
//! # Critical Invariants
//!
//! 1. **Non-negative balances**: a transfer exceeding the source balance is
//!    rejected with [`LedgerError::InsufficientBalance`] and changes nothing
//! 2. **Conservation**: the sum of each unit across all accounts is only
//!    changed by opening an account
//!
//! All amounts are i64 minor units.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// The two fungible units every agent holds
///
/// In the open-science scenario unit A is the fiat-like unit (USD) and
/// unit B is the protocol token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    A,
    B,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::A => write!(f, "A"),
            Unit::B => write!(f, "B"),
        }
    }
}

/// Errors that can occur during ledger operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient {unit} balance in {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: String,
        unit: Unit,
        required: i64,
        available: i64,
    },

    #[error("Transfer amount must be non-negative, got {0}")]
    NegativeAmount(i64),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Account already exists: {0}")]
    DuplicateAccount(String),
}

/// Balances held by a single agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    balance_a: i64,
    balance_b: i64,
}

impl Account {
    pub fn balance(&self, unit: Unit) -> i64 {
        match unit {
            Unit::A => self.balance_a,
            Unit::B => self.balance_b,
        }
    }

    fn slot_mut(&mut self, unit: Unit) -> &mut i64 {
        match unit {
            Unit::A => &mut self.balance_a,
            Unit::B => &mut self.balance_b,
        }
    }
}

/// Insertion-ordered set of accounts keyed by agent name
///
/// # Example
/// ```
/// use funding_simulator_core_rs::{Ledger, Unit};
///
/// let mut ledger = Ledger::new();
/// ledger.open_account("dao_treasury", 0, 1_000).unwrap();
/// ledger.open_account("researcher0", 0, 0).unwrap();
///
/// ledger.transfer("dao_treasury", "researcher0", Unit::B, 400).unwrap();
/// assert_eq!(ledger.balance("researcher0", Unit::B).unwrap(), 400);
/// assert_eq!(ledger.total(Unit::B), 1_000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    accounts: Vec<(String, Account)>,
    index: HashMap<String, usize>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account with starting balances
    ///
    /// This is the only way value enters the system.
    pub fn open_account(
        &mut self,
        name: &str,
        balance_a: i64,
        balance_b: i64,
    ) -> Result<(), LedgerError> {
        if self.index.contains_key(name) {
            return Err(LedgerError::DuplicateAccount(name.to_string()));
        }
        for amount in [balance_a, balance_b] {
            if amount < 0 {
                return Err(LedgerError::NegativeAmount(amount));
            }
        }
        self.index.insert(name.to_string(), self.accounts.len());
        self.accounts.push((
            name.to_string(),
            Account {
                balance_a,
                balance_b,
            },
        ));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn account(&self, name: &str) -> Option<&Account> {
        self.index.get(name).map(|&i| &self.accounts[i].1)
    }

    pub fn balance(&self, name: &str, unit: Unit) -> Result<i64, LedgerError> {
        self.account(name)
            .map(|account| account.balance(unit))
            .ok_or_else(|| LedgerError::UnknownAccount(name.to_string()))
    }

    /// Move `amount` of `unit` from one account to another
    ///
    /// Either both balances change or neither does.
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        unit: Unit,
        amount: i64,
    ) -> Result<(), LedgerError> {
        if amount < 0 {
            return Err(LedgerError::NegativeAmount(amount));
        }
        let from_idx = self.position(from)?;
        let to_idx = self.position(to)?;

        let available = self.accounts[from_idx].1.balance(unit);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from.to_string(),
                unit,
                required: amount,
                available,
            });
        }
        if from_idx == to_idx || amount == 0 {
            return Ok(());
        }

        *self.accounts[from_idx].1.slot_mut(unit) -= amount;
        *self.accounts[to_idx].1.slot_mut(unit) += amount;
        Ok(())
    }

    /// Sum of a unit across all accounts (for invariant checking)
    pub fn total(&self, unit: Unit) -> i64 {
        self.accounts.iter().map(|(_, a)| a.balance(unit)).sum()
    }

    /// Account names in the order they were opened
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.accounts.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn position(&self, name: &str) -> Result<usize, LedgerError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| LedgerError::UnknownAccount(name.to_string()))
    }
}
