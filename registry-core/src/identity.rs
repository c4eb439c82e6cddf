//! Identity model: participant registration and verification
//!
//! Registration is open to anyone; verification and issuer authorization are
//! administrator-only. Participant records are created here and mutated only
//! by ledger operations afterwards, never deleted.

use crate::error::{Error, Result};
use crate::events::{EventEnvelope, RegistryEvent};
use crate::state::RegistryState;
use crate::types::{Address, Participant};

impl RegistryState {
    /// Register a new participant.
    ///
    /// Fails with `AlreadyRegistered` if the identity has a record and with
    /// `InvalidInput` on an empty name or organization.
    pub fn register_participant(
        &mut self,
        identity: Address,
        name: String,
        organization: String,
        verification_doc: String,
    ) -> Result<EventEnvelope> {
        if name.is_empty() {
            return Err(Error::InvalidInput("participant name is empty".to_string()));
        }
        if organization.is_empty() {
            return Err(Error::InvalidInput(
                "organization category is empty".to_string(),
            ));
        }
        if self.participants.contains_key(&identity) {
            return Err(Error::AlreadyRegistered(identity));
        }

        let participant = Participant::new(
            identity.clone(),
            name.clone(),
            organization.clone(),
            verification_doc,
        );
        self.participants.insert(identity.clone(), participant);
        self.counters.participants_registered += 1;

        Ok(self.events.append(RegistryEvent::ParticipantRegistered {
            identity,
            name,
            organization,
        }))
    }

    /// Mark a participant as verified. Administrator-only; idempotent.
    pub fn verify_participant(
        &mut self,
        caller: &Address,
        identity: Address,
    ) -> Result<EventEnvelope> {
        self.access.require_owner(caller)?;

        let participant = self
            .participants
            .get_mut(&identity)
            .ok_or_else(|| Error::NotFound(format!("participant {identity}")))?;
        participant.verified = true;

        Ok(self
            .events
            .append(RegistryEvent::ParticipantVerified { identity }))
    }

    /// Grant or revoke issuer authorization. Administrator-only.
    ///
    /// The target does not need to be registered yet.
    pub fn set_issuer_authorization(
        &mut self,
        caller: &Address,
        identity: Address,
        allowed: bool,
    ) -> Result<EventEnvelope> {
        self.access.require_owner(caller)?;
        self.access
            .set_issuer_authorization(identity.clone(), allowed);

        Ok(self
            .events
            .append(RegistryEvent::IssuerAuthorizationChanged { identity, allowed }))
    }
}
