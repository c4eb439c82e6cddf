//! Shared registry state
//!
//! `RegistryState` is the single transactional store the four sub-models
//! (identity, credits, projects, access control) operate on. Operation
//! methods live in the sub-model modules ([`crate::identity`],
//! [`crate::credits`], [`crate::projects`]); this module holds the store,
//! the shared access helpers, and the read-only queries.
//!
//! The state is not internally synchronized: exactly one writer owns it
//! (the actor in [`crate::actor`]), which is what makes every operation a
//! discrete atomic transition.

use crate::access::AccessControl;
use crate::error::{Error, Result};
use crate::events::{EventEnvelope, EventLog};
use crate::types::{
    Address, CarbonCredit, ClimateProject, Counters, CreditId, Participant, PlatformStats,
    ProjectId,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// The registry ledger state
#[derive(Debug)]
pub struct RegistryState {
    pub(crate) access: AccessControl,
    pub(crate) participants: HashMap<Address, Participant>,
    pub(crate) credits: HashMap<CreditId, CarbonCredit>,
    pub(crate) projects: HashMap<ProjectId, ClimateProject>,
    pub(crate) counters: Counters,
    pub(crate) settlement_account: Address,
    pub(crate) events: EventLog,
}

impl RegistryState {
    /// Create an empty registry with the given administrator and ledger
    /// settlement account
    pub fn new(owner: Address, settlement_account: Address) -> Self {
        Self {
            access: AccessControl::new(owner),
            participants: HashMap::new(),
            credits: HashMap::new(),
            projects: HashMap::new(),
            counters: Counters::default(),
            settlement_account,
            events: EventLog::new(),
        }
    }

    /// The administrator identity
    pub fn owner(&self) -> &Address {
        self.access.owner()
    }

    /// The ledger settlement account used for payment hops
    pub fn settlement_account(&self) -> &Address {
        &self.settlement_account
    }

    // ───────────────────────── access helpers ─────────────────────────

    /// Whether `identity` has a participant record
    pub fn is_registered(&self, identity: &Address) -> bool {
        self.participants.contains_key(identity)
    }

    /// Whether `identity` may issue credits
    pub fn is_authorized_issuer(&self, identity: &Address) -> bool {
        self.access.is_authorized_issuer(identity)
    }

    /// Fail with `Unauthorized` unless the caller is a registered participant
    pub(crate) fn require_registered(&self, caller: &Address) -> Result<()> {
        if self.is_registered(caller) {
            Ok(())
        } else {
            Err(Error::Unauthorized(format!(
                "{caller} is not a registered participant"
            )))
        }
    }

    /// Participant record the ledger is about to mutate.
    ///
    /// Callers must have verified registration beforehand; reaching a missing
    /// record here is a bookkeeping bug, not a caller error.
    pub(crate) fn participant_mut(&mut self, identity: &Address) -> Result<&mut Participant> {
        self.participants.get_mut(identity).ok_or_else(|| {
            Error::NotFound(format!("participant record missing for {identity}"))
        })
    }

    // ───────────────────────── queries ─────────────────────────

    /// Fetch a credit by id
    pub fn credit(&self, credit_id: CreditId) -> Result<&CarbonCredit> {
        self.credits
            .get(&credit_id)
            .ok_or_else(|| Error::NotFound(format!("credit {credit_id}")))
    }

    /// Fetch a participant by identity
    pub fn participant(&self, identity: &Address) -> Result<&Participant> {
        self.participants
            .get(identity)
            .ok_or_else(|| Error::NotFound(format!("participant {identity}")))
    }

    /// Fetch a project by id
    pub fn project(&self, project_id: ProjectId) -> Result<&ClimateProject> {
        self.projects
            .get(&project_id)
            .ok_or_else(|| Error::NotFound(format!("project {project_id}")))
    }

    /// Ids of non-retired credits owned by `identity`
    pub fn owned_credits(&self, identity: &Address) -> Result<Vec<CreditId>> {
        Ok(self.participant(identity)?.owned_credits.iter().copied().collect())
    }

    /// Contributors of a project, in first-contribution order
    pub fn contributors(&self, project_id: ProjectId) -> Result<Vec<Address>> {
        Ok(self.project(project_id)?.contributor_list.clone())
    }

    /// Cumulative contribution of `contributor` to a project (zero if none)
    pub fn contribution(&self, project_id: ProjectId, contributor: &Address) -> Result<Decimal> {
        Ok(self
            .project(project_id)?
            .contributions
            .get(contributor)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    /// Aggregate platform statistics.
    ///
    /// `ledger_held_balance` is supplied by the caller, which can see the
    /// settlement engine; normally zero since funds forward immediately.
    pub fn stats(&self, ledger_held_balance: Decimal) -> PlatformStats {
        PlatformStats {
            total_credits_issued: self.counters.credits_issued,
            total_projects_created: self.counters.projects_created,
            total_participants: self.counters.participants_registered,
            ledger_held_balance,
        }
    }

    /// Events with sequence greater than `after`
    pub fn events_since(&self, after: u64) -> Vec<EventEnvelope> {
        self.events.since(after)
    }
}
