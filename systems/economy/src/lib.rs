#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Resource bookkeeping for Bastion levels.
//!
//! A [`ResourceManager`] holds a single balance and prices every
//! [`Operation`] through a [`CostTable`]. Positive costs debit the balance,
//! negative costs (rebates and rewards) credit it.

use std::collections::BTreeMap;

use bastion_core::{EnemyKind, Event, TowerKind};
use thiserror::Error;
use tracing::debug;

pub use bastion_core::Operation;

/// Errors raised while operating on the balance.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EconomyError {
    /// The operation would drive the balance below zero.
    #[error("cannot {operation}: balance {balance} does not cover cost {cost}")]
    InsufficientResources {
        /// Operation that was attempted.
        operation: Operation,
        /// Balance at the time of the attempt.
        balance: i64,
        /// Price of the operation.
        cost: i64,
    },
    /// The cost table has no price for the operation.
    #[error("no price configured for {0}")]
    UnknownOperation(Operation),
}

/// Static prices keyed by operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CostTable {
    costs: BTreeMap<Operation, i64>,
}

impl CostTable {
    /// Creates a table without any prices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prices derived from the tower and enemy configuration records.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::new();
        for kind in TowerKind::ALL {
            let spec = kind.spec();
            table.insert(Operation::AddTower(kind), spec.resources_to_add);
            table.insert(Operation::RemoveTower(kind), spec.resources_to_remove);
        }
        for kind in EnemyKind::ALL {
            table.insert(Operation::KillEnemy(kind), kind.spec().resources_to_kill);
        }
        table
    }

    /// Returns the table with `operation` priced at `cost`.
    #[must_use]
    pub fn with(mut self, operation: Operation, cost: i64) -> Self {
        self.insert(operation, cost);
        self
    }

    /// Sets the price of `operation`, replacing any previous one.
    pub fn insert(&mut self, operation: Operation, cost: i64) {
        let _ = self.costs.insert(operation, cost);
    }

    /// Price of `operation`, if configured.
    #[must_use]
    pub fn cost(&self, operation: Operation) -> Option<i64> {
        self.costs.get(&operation).copied()
    }
}

/// Tracks the level's currency.
#[derive(Clone, Debug)]
pub struct ResourceManager {
    balance: i64,
    costs: CostTable,
}

impl ResourceManager {
    /// Creates a manager holding `balance` and pricing through `costs`.
    #[must_use]
    pub fn new(balance: i64, costs: CostTable) -> Self {
        Self { balance, costs }
    }

    /// Current balance.
    #[must_use]
    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Prices in use.
    #[must_use]
    pub fn costs(&self) -> &CostTable {
        &self.costs
    }

    /// True iff `operation` is priced and paying for it leaves the balance
    /// non-negative.
    #[must_use]
    pub fn can_be_done(&self, operation: Operation) -> bool {
        self.costs
            .cost(operation)
            .and_then(|cost| self.balance.checked_sub(cost))
            .is_some_and(|remaining| remaining >= 0)
    }

    /// Applies the price of `operation` to the balance.
    ///
    /// Callers are expected to check [`ResourceManager::can_be_done`] first;
    /// the balance is left untouched on error.
    pub fn operate(&mut self, operation: Operation, out: &mut Vec<Event>) -> Result<(), EconomyError> {
        let cost = self
            .costs
            .cost(operation)
            .ok_or(EconomyError::UnknownOperation(operation))?;
        let insufficient = EconomyError::InsufficientResources {
            operation,
            balance: self.balance,
            cost,
        };
        let remaining = self.balance.checked_sub(cost).ok_or(insufficient)?;
        if remaining < 0 {
            return Err(insufficient);
        }

        self.balance = remaining;
        debug!(%operation, cost, balance = remaining, "resources operated");
        out.push(Event::ResourcesOperated {
            operation,
            balance: remaining,
        });
        Ok(())
    }
}
