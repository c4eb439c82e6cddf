//! Settlement seam: value transfers as fallible side effects
//!
//! The registry never holds funds itself; payments, refunds, and funding
//! forwards run through a [`SettlementEngine`]. Multi-leg settlements use
//! [`execute_atomically`], which reverses completed legs when a later leg
//! fails so the surrounding registry operation can abort with no state
//! change.

use crate::types::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a completed transfer, used for compensating reversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferId(Uuid);

impl TransferId {
    /// Allocate a new id (UUIDv7 for time-ordering)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settlement errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// Source account does not exist
    #[error("account not found: {0}")]
    AccountNotFound(Address),

    /// Source account cannot cover the transfer
    #[error("insufficient funds in {account}: available {available}, required {required}")]
    InsufficientFunds {
        /// Paying account
        account: Address,
        /// Current balance
        available: Decimal,
        /// Amount requested
        required: Decimal,
    },

    /// Reversal target is unknown
    #[error("transfer not found: {0}")]
    TransferNotFound(TransferId),

    /// Transfer rejected by the engine
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// A value-transfer backend
///
/// Implementations must make `transfer` atomic per call and support
/// compensating reversal of any transfer they reported as completed.
pub trait SettlementEngine: Send + Sync {
    /// Move `amount` from `from` to `to`; returns an id usable for reversal
    fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: Decimal,
    ) -> std::result::Result<TransferId, SettlementError>;

    /// Reverse a previously completed transfer (compensating action)
    fn reverse(&self, transfer: TransferId) -> std::result::Result<(), SettlementError>;

    /// Current balance of an account (zero if unknown)
    fn balance_of(&self, account: &Address) -> Decimal;
}

/// One leg of a multi-leg settlement
#[derive(Debug, Clone)]
pub struct TransferLeg {
    /// Paying account
    pub from: Address,
    /// Receiving account
    pub to: Address,
    /// Amount to move
    pub amount: Decimal,
}

impl TransferLeg {
    /// Build a leg
    pub fn new(from: Address, to: Address, amount: Decimal) -> Self {
        Self { from, to, amount }
    }
}

/// Execute all legs in order, reversing completed legs if a later one fails.
///
/// Zero-amount legs are skipped. On failure the original error is returned;
/// a reversal that itself fails is logged and surfaced as a metric concern,
/// not masked over the original error.
pub fn execute_atomically(
    engine: &dyn SettlementEngine,
    legs: &[TransferLeg],
) -> std::result::Result<Vec<TransferId>, SettlementError> {
    let mut completed = Vec::with_capacity(legs.len());

    for leg in legs {
        if leg.amount.is_zero() {
            continue;
        }

        match engine.transfer(&leg.from, &leg.to, leg.amount) {
            Ok(id) => completed.push(id),
            Err(err) => {
                for id in completed.into_iter().rev() {
                    if let Err(rev_err) = engine.reverse(id) {
                        tracing::error!(
                            transfer = %id,
                            error = %rev_err,
                            "failed to reverse settlement leg during rollback"
                        );
                    }
                }
                return Err(err);
            }
        }
    }

    Ok(completed)
}

/// Engine that approves every transfer and tracks nothing.
///
/// For deployments where value settles entirely off-ledger, and for tests
/// that only exercise registry state transitions.
#[derive(Debug, Default, Clone)]
pub struct NullEngine;

impl NullEngine {
    /// Create a null engine
    pub fn new() -> Self {
        Self
    }
}

impl SettlementEngine for NullEngine {
    fn transfer(
        &self,
        _from: &Address,
        _to: &Address,
        _amount: Decimal,
    ) -> std::result::Result<TransferId, SettlementError> {
        Ok(TransferId::new())
    }

    fn reverse(&self, _transfer: TransferId) -> std::result::Result<(), SettlementError> {
        Ok(())
    }

    fn balance_of(&self, _account: &Address) -> Decimal {
        Decimal::ZERO
    }
}
