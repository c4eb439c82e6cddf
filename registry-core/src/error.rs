//! Error types for the registry

use crate::settlement::SettlementError;
use crate::types::{Address, CreditId, ProjectId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Registry errors
///
/// Every domain variant is a precondition failure raised before any state is
/// written: operations are all-or-nothing and never retried.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller lacks the required role or registration
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Zero, empty, or out-of-range argument
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Identity already has a participant record
    #[error("participant {0} is already registered")]
    AlreadyRegistered(Address),

    /// Credit has been retired and is terminal
    #[error("credit {0} is already retired")]
    AlreadyRetired(CreditId),

    /// Buyer already owns the credit
    #[error("buyer already owns credit {0}")]
    SelfTransfer(CreditId),

    /// Payment does not cover the full purchase price
    #[error("insufficient payment: required {required}, offered {offered}")]
    InsufficientPayment {
        /// Full purchase price
        required: Decimal,
        /// Payment offered by the buyer
        offered: Decimal,
    },

    /// Project cannot accept funding (inactive or goal already reached)
    #[error("project {0} is inactive or fully funded")]
    InactiveOrFullyFunded(ProjectId),

    /// Value transfer failed; the operation was rolled back
    #[error("settlement failed: {0}")]
    Settlement(#[from] SettlementError),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
