//! In-memory funds engine
//!
//! Balance book and transfer journal live behind one mutex so a two-account
//! transfer is a single critical section and opposing transfers cannot
//! deadlock. Reversal moves the funds back and marks the journal entry, so a
//! transfer can be compensated at most once.

use parking_lot::Mutex;
use registry_core::{Address, SettlementEngine, SettlementError, TransferId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Journal entry for a completed transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Transfer id
    pub id: TransferId,

    /// Paying account
    pub from: Address,

    /// Receiving account
    pub to: Address,

    /// Amount moved
    pub amount: Decimal,

    /// Whether the transfer has been compensated
    pub reversed: bool,
}

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<Address, Decimal>,
    journal: HashMap<TransferId, TransferRecord>,
}

/// In-memory settlement engine
#[derive(Debug, Default)]
pub struct FundsEngine {
    book: Mutex<Book>,
}

impl FundsEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account with external funds, creating it if needed
    pub fn deposit(&self, account: &Address, amount: Decimal) {
        let mut book = self.book.lock();
        *book.balances.entry(account.clone()).or_insert(Decimal::ZERO) += amount;
    }

    /// Current balance of an account (zero if unknown)
    pub fn balance(&self, account: &Address) -> Decimal {
        self.book
            .lock()
            .balances
            .get(account)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Snapshot of the transfer journal, for audit export
    pub fn journal(&self) -> Vec<TransferRecord> {
        let book = self.book.lock();
        let mut records: Vec<TransferRecord> = book.journal.values().cloned().collect();
        records.sort_by(|a, b| a.id.to_string().cmp(&b.id.to_string()));
        records
    }
}

impl SettlementEngine for FundsEngine {
    fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: Decimal,
    ) -> Result<TransferId, SettlementError> {
        if amount < Decimal::ZERO {
            return Err(SettlementError::Rejected(format!(
                "negative transfer amount {amount}"
            )));
        }

        let mut book = self.book.lock();

        let available = match book.balances.get(from) {
            Some(balance) => *balance,
            None => return Err(SettlementError::AccountNotFound(from.clone())),
        };
        if available < amount {
            return Err(SettlementError::InsufficientFunds {
                account: from.clone(),
                available,
                required: amount,
            });
        }

        *book.balances.get_mut(from).expect("checked above") -= amount;
        *book.balances.entry(to.clone()).or_insert(Decimal::ZERO) += amount;

        let id = TransferId::new();
        book.journal.insert(
            id,
            TransferRecord {
                id,
                from: from.clone(),
                to: to.clone(),
                amount,
                reversed: false,
            },
        );

        tracing::debug!(transfer = %id, %from, %to, %amount, "transfer settled");
        Ok(id)
    }

    fn reverse(&self, transfer: TransferId) -> Result<(), SettlementError> {
        let mut book = self.book.lock();

        let record = match book.journal.get(&transfer) {
            Some(record) => record.clone(),
            None => return Err(SettlementError::TransferNotFound(transfer)),
        };
        if record.reversed {
            return Err(SettlementError::Rejected(format!(
                "transfer {transfer} already reversed"
            )));
        }

        let recipient_balance = book
            .balances
            .get(&record.to)
            .copied()
            .unwrap_or(Decimal::ZERO);
        if recipient_balance < record.amount {
            // The recipient spent the funds before the compensation landed.
            return Err(SettlementError::InsufficientFunds {
                account: record.to.clone(),
                available: recipient_balance,
                required: record.amount,
            });
        }

        *book.balances.get_mut(&record.to).expect("checked above") -= record.amount;
        *book
            .balances
            .entry(record.from.clone())
            .or_insert(Decimal::ZERO) += record.amount;
        book.journal
            .get_mut(&transfer)
            .expect("present above")
            .reversed = true;

        tracing::debug!(%transfer, "transfer reversed");
        Ok(())
    }

    fn balance_of(&self, account: &Address) -> Decimal {
        self.balance(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    #[test]
    fn test_transfer_moves_funds() {
        let engine = FundsEngine::new();
        engine.deposit(&addr("a"), Decimal::from(100));

        engine
            .transfer(&addr("a"), &addr("b"), Decimal::from(40))
            .unwrap();

        assert_eq!(engine.balance(&addr("a")), Decimal::from(60));
        assert_eq!(engine.balance(&addr("b")), Decimal::from(40));
    }

    #[test]
    fn test_transfer_rejects_overdraft() {
        let engine = FundsEngine::new();
        engine.deposit(&addr("a"), Decimal::from(10));

        let err = engine
            .transfer(&addr("a"), &addr("b"), Decimal::from(11))
            .unwrap_err();
        assert!(matches!(err, SettlementError::InsufficientFunds { .. }));

        // Nothing moved.
        assert_eq!(engine.balance(&addr("a")), Decimal::from(10));
        assert_eq!(engine.balance(&addr("b")), Decimal::ZERO);
    }

    #[test]
    fn test_transfer_from_unknown_account() {
        let engine = FundsEngine::new();
        let err = engine
            .transfer(&addr("ghost"), &addr("b"), Decimal::from(1))
            .unwrap_err();
        assert!(matches!(err, SettlementError::AccountNotFound(_)));
    }

    #[test]
    fn test_reverse_restores_balances_once() {
        let engine = FundsEngine::new();
        engine.deposit(&addr("a"), Decimal::from(100));

        let id = engine
            .transfer(&addr("a"), &addr("b"), Decimal::from(30))
            .unwrap();
        engine.reverse(id).unwrap();

        assert_eq!(engine.balance(&addr("a")), Decimal::from(100));
        assert_eq!(engine.balance(&addr("b")), Decimal::ZERO);

        // Second reversal is rejected.
        let err = engine.reverse(id).unwrap_err();
        assert!(matches!(err, SettlementError::Rejected(_)));
    }

    #[test]
    fn test_reverse_unknown_transfer() {
        let engine = FundsEngine::new();
        let err = engine.reverse(TransferId::new()).unwrap_err();
        assert!(matches!(err, SettlementError::TransferNotFound(_)));
    }

    #[test]
    fn test_journal_records_reversal_state() {
        let engine = FundsEngine::new();
        engine.deposit(&addr("a"), Decimal::from(10));

        let id = engine
            .transfer(&addr("a"), &addr("b"), Decimal::from(10))
            .unwrap();
        engine.reverse(id).unwrap();

        let journal = engine.journal();
        assert_eq!(journal.len(), 1);
        assert!(journal[0].reversed);
        assert_eq!(journal[0].amount, Decimal::from(10));
    }
}
