//! Funds Settlement Engine
//!
//! In-memory implementation of the registry's settlement seam: an account
//! balance book plus a transfer journal supporting compensating reversal.
//!
//! # Architecture
//!
//! Every registry operation that moves value (credit purchase, project
//! funding) runs its transfer legs through a
//! [`registry_core::SettlementEngine`] before any ledger state is written.
//! [`FundsEngine`] settles each leg synchronously against the balance book
//! and can reverse a completed leg when a later one fails, so the registry
//! can keep its all-or-nothing guarantee.
//!
//! # Example
//!
//! ```no_run
//! use registry_core::{Address, Config, Registry};
//! use rust_decimal::Decimal;
//! use settlement::FundsEngine;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> registry_core::Result<()> {
//!     let engine = Arc::new(FundsEngine::new());
//!     engine.deposit(&Address::new("buyer"), Decimal::from(1_000));
//!
//!     let registry = Registry::open(Config::default(), engine.clone()).await?;
//!     // ... register participants, issue, purchase ...
//!     registry.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod engine;

// Re-exports
pub use engine::{FundsEngine, TransferRecord};
