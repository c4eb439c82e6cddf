//! Registry event log
//!
//! Every accepted mutating operation appends exactly one event. The log is
//! append-only and ordered by sequence number; events are never replayed or
//! retracted. External observers (indexers, UIs) consume them through the
//! facade's broadcast subscription.

use crate::types::{Address, CreditId, ProjectId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structured notification emitted by a mutating operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// A participant registered
    ParticipantRegistered {
        /// New participant identity
        identity: Address,
        /// Display name
        name: String,
        /// Organization category
        organization: String,
    },

    /// A participant was verified by the administrator
    ParticipantVerified {
        /// Verified identity
        identity: Address,
    },

    /// Issuer authorization was granted or revoked
    IssuerAuthorizationChanged {
        /// Target identity
        identity: Address,
        /// New authorization state
        allowed: bool,
    },

    /// A credit was issued
    CreditIssued {
        /// New credit id
        credit_id: CreditId,
        /// Issuing identity
        issuer: Address,
        /// Backing project name
        project_name: String,
        /// Tonnes of CO2
        amount_tonnes: u64,
        /// Price per tonne
        price_per_tonne: Decimal,
    },

    /// A credit changed owner through a purchase
    CreditTransferred {
        /// Credit id
        credit_id: CreditId,
        /// Previous owner (paid the total price)
        from: Address,
        /// New owner
        to: Address,
        /// Price paid to the seller
        total_price: Decimal,
        /// Excess payment returned to the buyer
        refund: Decimal,
    },

    /// A credit was retired (terminal)
    CreditRetired {
        /// Credit id
        credit_id: CreditId,
        /// Owner who retired it
        owner: Address,
        /// Tonnes of CO2 taken out of circulation
        amount_tonnes: u64,
    },

    /// A project was created
    ProjectCreated {
        /// New project id
        project_id: ProjectId,
        /// Owner identity
        owner: Address,
        /// Project name
        name: String,
        /// Target CO2 reduction in tonnes
        target_co2_tonnes: u64,
        /// Funding goal
        funding_goal: Decimal,
    },

    /// A project received funding
    ProjectFunded {
        /// Project id
        project_id: ProjectId,
        /// Contributing identity
        contributor: Address,
        /// Contribution amount
        amount: Decimal,
        /// Project funding total after this contribution
        total_funding: Decimal,
        /// Whether this contribution reached the goal. Reaching the goal
        /// triggers no further ledger transition; observers may react.
        goal_reached: bool,
    },

    /// A project was verified by the administrator
    ProjectVerified {
        /// Project id
        project_id: ProjectId,
    },

    /// Project progress was overwritten by the administrator
    ProjectProgressUpdated {
        /// Project id
        project_id: ProjectId,
        /// New absolute CO2 reduction in tonnes
        co2_reduced_tonnes: u64,
    },
}

impl RegistryEvent {
    /// Event name for logging and routing
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEvent::ParticipantRegistered { .. } => "participant_registered",
            RegistryEvent::ParticipantVerified { .. } => "participant_verified",
            RegistryEvent::IssuerAuthorizationChanged { .. } => "issuer_authorization_changed",
            RegistryEvent::CreditIssued { .. } => "credit_issued",
            RegistryEvent::CreditTransferred { .. } => "credit_transferred",
            RegistryEvent::CreditRetired { .. } => "credit_retired",
            RegistryEvent::ProjectCreated { .. } => "project_created",
            RegistryEvent::ProjectFunded { .. } => "project_funded",
            RegistryEvent::ProjectVerified { .. } => "project_verified",
            RegistryEvent::ProjectProgressUpdated { .. } => "project_progress_updated",
        }
    }
}

/// Event with envelope metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Position in the log, starting at 1 and strictly increasing
    pub sequence: u64,

    /// Emission timestamp
    pub timestamp: DateTime<Utc>,

    /// The event itself
    pub event: RegistryEvent,
}

/// Append-only, ordered event log
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<EventEnvelope>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its envelope
    pub fn append(&mut self, event: RegistryEvent) -> EventEnvelope {
        let envelope = EventEnvelope {
            id: Uuid::now_v7(),
            sequence: self.entries.len() as u64 + 1,
            timestamp: Utc::now(),
            event,
        };
        self.entries.push(envelope.clone());
        envelope
    }

    /// Number of events in the log
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Events with sequence greater than `after`
    pub fn since(&self, after: u64) -> Vec<EventEnvelope> {
        self.entries
            .iter()
            .filter(|e| e.sequence > after)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences_are_strictly_increasing() {
        let mut log = EventLog::new();

        let a = log.append(RegistryEvent::ParticipantVerified {
            identity: Address::new("a"),
        });
        let b = log.append(RegistryEvent::ProjectVerified { project_id: 1 });

        assert_eq!(a.sequence, 1);
        assert_eq!(b.sequence, 2);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_since_filters_by_sequence() {
        let mut log = EventLog::new();
        for id in 1..=3 {
            log.append(RegistryEvent::ProjectVerified { project_id: id });
        }

        let tail = log.since(1);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].sequence, 2);
        assert_eq!(tail[1].sequence, 3);

        assert!(log.since(3).is_empty());
    }

    #[test]
    fn test_envelope_json_shape() {
        let mut log = EventLog::new();
        let envelope = log.append(RegistryEvent::CreditIssued {
            credit_id: 1,
            issuer: Address::new("alice"),
            project_name: "Mangrove Restoration".into(),
            amount_tonnes: 10,
            price_per_tonne: Decimal::from(5),
        });

        let json: serde_json::Value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["sequence"], 1);
        assert_eq!(json["event"]["CreditIssued"]["credit_id"], 1);
        // Decimals ride the wire as strings to avoid float rounding.
        assert_eq!(json["event"]["CreditIssued"]["price_per_tonne"], "5");
    }

    #[test]
    fn test_event_names() {
        let event = RegistryEvent::CreditRetired {
            credit_id: 1,
            owner: Address::new("a"),
            amount_tonnes: 10,
        };
        assert_eq!(event.name(), "credit_retired");
    }
}
