//! Core types for the registry
//!
//! All types are designed for:
//! - Deterministic behavior (integer tonnes, exact decimals for value)
//! - Memory safety (no unsafe code)
//! - Serde-friendly snapshots for observers and tests

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identity address of a participant (account address, DID, etc.)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Create new address
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Carbon credit identifier. Id 0 is reserved and never allocated.
pub type CreditId = u64;

/// Climate project identifier. Id 0 is reserved and never allocated.
pub type ProjectId = u64;

/// A registered participant
///
/// Created once at registration and never deleted. Balance fields are
/// maintained incrementally by credit and project operations, never
/// recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Identity address (registry key)
    pub identity: Address,

    /// Display name
    pub name: String,

    /// Organization category (NGO, corporate, individual, ...)
    pub organization: String,

    /// Tonnes of CO2 across all non-retired credits currently owned
    pub credits_owned: u64,

    /// Tonnes of CO2 retired by this participant
    pub credits_retired: u64,

    /// Cumulative amount contributed to projects
    pub total_contributed: Decimal,

    /// Number of distinct projects this participant has funded
    pub projects_supported: u32,

    /// Administrative verification flag
    pub verified: bool,

    /// Registration timestamp
    pub registered_at: DateTime<Utc>,

    /// Opaque verification document reference
    pub verification_doc: String,

    /// Ids of non-retired credits currently owned.
    ///
    /// Ordered set keyed by credit id; order carries no semantic meaning.
    pub owned_credits: BTreeSet<CreditId>,
}

impl Participant {
    /// Create a fresh record with zeroed counters
    pub fn new(
        identity: Address,
        name: String,
        organization: String,
        verification_doc: String,
    ) -> Self {
        Self {
            identity,
            name,
            organization,
            credits_owned: 0,
            credits_retired: 0,
            total_contributed: Decimal::ZERO,
            projects_supported: 0,
            verified: false,
            registered_at: Utc::now(),
            verification_doc,
            owned_credits: BTreeSet::new(),
        }
    }
}

/// An issued carbon credit
///
/// Lifecycle: issue → (transfer)* → retire. Retirement is terminal; a retired
/// credit never transfers and never un-retires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarbonCredit {
    /// Credit id
    pub id: CreditId,

    /// Issuer identity (authorized issuer at issuance time)
    pub issuer: Address,

    /// Name of the offset project backing this credit
    pub project_name: String,

    /// Amount in tonnes of CO2 (always > 0)
    pub amount_tonnes: u64,

    /// Price per tonne (always > 0)
    pub price_per_tonne: Decimal,

    /// Verification flag; always true at creation since only authorized
    /// issuers can reach the issuance path
    pub verified: bool,

    /// Retired flag; one-way
    pub retired: bool,

    /// Current owner identity
    pub current_owner: Address,

    /// Issuance timestamp
    pub issued_at: DateTime<Utc>,

    /// Opaque verification hash/document reference
    pub verification_hash: String,

    /// Methodology label (e.g. "VM0042")
    pub methodology: String,
}

impl CarbonCredit {
    /// Full purchase price: amount × price per tonne.
    ///
    /// `None` when the product overflows `Decimal`; issuance rejects such
    /// credits, so stored credits always have a price.
    pub fn total_price(&self) -> Option<Decimal> {
        Decimal::from(self.amount_tonnes).checked_mul(self.price_per_tonne)
    }
}

/// A funded climate project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateProject {
    /// Project id
    pub id: ProjectId,

    /// Owner identity (registered participant)
    pub owner: Address,

    /// Project name
    pub name: String,

    /// Description
    pub description: String,

    /// Location
    pub location: String,

    /// Target CO2 reduction in tonnes
    pub target_co2_tonnes: u64,

    /// Current CO2 reduction in tonnes (≤ target at all times)
    pub current_co2_tonnes: u64,

    /// Funding goal
    pub funding_goal: Decimal,

    /// Funding received so far (sum of the contribution map)
    pub current_funding: Decimal,

    /// Active flag
    pub active: bool,

    /// Administrative verification flag
    pub verified: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Milestone labels
    pub milestones: Vec<String>,

    /// Cumulative contribution per contributor
    pub contributions: BTreeMap<Address, Decimal>,

    /// Distinct contributors in first-contribution order
    pub contributor_list: Vec<Address>,
}

impl ClimateProject {
    /// Whether the funding goal has been reached or exceeded
    pub fn fully_funded(&self) -> bool {
        self.current_funding >= self.funding_goal
    }
}

/// Strictly increasing global counters; also the id source for new entities
/// (id = counter value after increment).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Counters {
    /// Total credits ever issued
    pub credits_issued: u64,

    /// Total projects ever created
    pub projects_created: u64,

    /// Total participants ever registered
    pub participants_registered: u64,
}

/// Aggregate platform statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformStats {
    /// Total credits ever issued
    pub total_credits_issued: u64,

    /// Total projects ever created
    pub total_projects_created: u64,

    /// Total participants ever registered
    pub total_participants: u64,

    /// Balance currently held by the ledger settlement account
    pub ledger_held_balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display() {
        let addr = Address::new("0xA11CE");
        assert_eq!(addr.as_str(), "0xA11CE");
        assert_eq!(addr.to_string(), "0xA11CE");
    }

    #[test]
    fn test_credit_total_price() {
        let credit = CarbonCredit {
            id: 1,
            issuer: Address::new("issuer"),
            project_name: "Mangrove Restoration".to_string(),
            amount_tonnes: 10,
            price_per_tonne: Decimal::from(5),
            verified: true,
            retired: false,
            current_owner: Address::new("issuer"),
            issued_at: Utc::now(),
            verification_hash: "Qm123".to_string(),
            methodology: "VM0042".to_string(),
        };

        assert_eq!(credit.total_price(), Some(Decimal::from(50)));
    }

    #[test]
    fn test_credit_total_price_overflow_is_none() {
        let credit = CarbonCredit {
            id: 1,
            issuer: Address::new("issuer"),
            project_name: "Mangrove Restoration".to_string(),
            amount_tonnes: u64::MAX,
            price_per_tonne: Decimal::MAX,
            verified: true,
            retired: false,
            current_owner: Address::new("issuer"),
            issued_at: Utc::now(),
            verification_hash: "Qm123".to_string(),
            methodology: "VM0042".to_string(),
        };

        assert_eq!(credit.total_price(), None);
    }

    #[test]
    fn test_fully_funded() {
        let mut project = ClimateProject {
            id: 1,
            owner: Address::new("owner"),
            name: "Reforestation".to_string(),
            description: String::new(),
            location: String::new(),
            target_co2_tonnes: 100,
            current_co2_tonnes: 0,
            funding_goal: Decimal::from(100),
            current_funding: Decimal::from(99),
            active: true,
            verified: false,
            created_at: Utc::now(),
            milestones: vec![],
            contributions: BTreeMap::new(),
            contributor_list: vec![],
        };

        assert!(!project.fully_funded());
        project.current_funding = Decimal::from(100);
        assert!(project.fully_funded());
    }
}
