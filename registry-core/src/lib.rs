//! Carbon Registry Core
//!
//! Single-ledger registry tracking participants, carbon credits, and climate
//! projects, enforcing every state transition under one set of authorization
//! and consistency rules.
//!
//! # Architecture
//!
//! - **Single Writer**: all mutations funnel through one actor task, so every
//!   operation is a discrete atomic transition
//! - **Settlement Seam**: value transfers are fallible side effects behind the
//!   [`SettlementEngine`] trait; a failed transfer rolls the operation back
//!   before any state is written
//! - **Event Log**: each accepted mutation appends exactly one ordered event,
//!   never replayed or retracted
//!
//! # Invariants
//!
//! - Tonnage conservation: Σ(owned balances) == Σ(amounts of non-retired credits)
//! - Retirement is terminal: a retired credit never transfers again
//! - Project funding equals the sum of its contribution map
//! - Project progress never exceeds its target

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod access;
pub mod actor;
pub mod config;
pub mod credits;
pub mod error;
pub mod events;
pub mod identity;
pub mod metrics;
pub mod projects;
pub mod registry;
pub mod settlement;
pub mod state;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use events::{EventEnvelope, RegistryEvent};
pub use registry::Registry;
pub use settlement::{NullEngine, SettlementEngine, SettlementError, TransferId};
pub use state::RegistryState;
pub use types::{
    Address, CarbonCredit, ClimateProject, CreditId, Participant, PlatformStats, ProjectId,
};
