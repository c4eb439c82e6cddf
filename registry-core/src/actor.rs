//! Actor-based concurrency for the registry
//!
//! Single-writer pattern: one Tokio task owns the [`RegistryState`] and
//! applies every operation as a discrete atomic transition, so a purchase
//! and a retirement racing on the same credit can never both succeed.
//! Cloneable handles send commands over a bounded mailbox and await the
//! result on a oneshot channel.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │            Callers (API / CLI boundary)               │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │             RegistryHandle (Clone)                    │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │           RegistryActor (Single Task)                 │
//! │   RegistryState + SettlementEngine + EventLog         │
//! │   one command = one atomic transition                 │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ broadcast
//!                       ▼
//!              external observers (indexers, UIs)
//! ```

use crate::error::{Error, Result};
use crate::events::{EventEnvelope, RegistryEvent};
use crate::metrics::Metrics;
use crate::settlement::SettlementEngine;
use crate::state::RegistryState;
use crate::types::{
    Address, CarbonCredit, ClimateProject, CreditId, Participant, PlatformStats, ProjectId,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Command sent to the registry actor
#[derive(Debug)]
pub enum RegistryCommand {
    /// Register a participant
    RegisterParticipant {
        /// New identity
        identity: Address,
        /// Display name
        name: String,
        /// Organization category
        organization: String,
        /// Opaque verification document reference
        verification_doc: String,
        /// Result channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Verify a participant (administrator-only)
    VerifyParticipant {
        /// Acting identity
        caller: Address,
        /// Target identity
        identity: Address,
        /// Result channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Grant or revoke issuer authorization (administrator-only)
    SetIssuerAuthorization {
        /// Acting identity
        caller: Address,
        /// Target identity
        identity: Address,
        /// New authorization state
        allowed: bool,
        /// Result channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Issue a credit
    IssueCredit {
        /// Acting identity (registered, authorized issuer)
        issuer: Address,
        /// Backing project name
        project_name: String,
        /// Tonnes of CO2
        amount_tonnes: u64,
        /// Price per tonne
        price_per_tonne: Decimal,
        /// Opaque verification hash
        verification_hash: String,
        /// Methodology label
        methodology: String,
        /// Result channel
        response: oneshot::Sender<Result<CreditId>>,
    },

    /// Purchase a credit
    PurchaseCredit {
        /// Acting identity (buyer)
        buyer: Address,
        /// Credit to purchase
        credit_id: CreditId,
        /// Payment offered
        payment: Decimal,
        /// Result channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Retire a credit
    RetireCredit {
        /// Acting identity (current owner)
        caller: Address,
        /// Credit to retire
        credit_id: CreditId,
        /// Result channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Create a project
    CreateProject {
        /// Acting identity (registered participant)
        owner: Address,
        /// Project name
        name: String,
        /// Description
        description: String,
        /// Location
        location: String,
        /// Target CO2 reduction in tonnes
        target_co2_tonnes: u64,
        /// Funding goal
        funding_goal: Decimal,
        /// Result channel
        response: oneshot::Sender<Result<ProjectId>>,
    },

    /// Fund a project
    FundProject {
        /// Acting identity (contributor)
        contributor: Address,
        /// Project to fund
        project_id: ProjectId,
        /// Contribution amount
        amount: Decimal,
        /// Result channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Verify a project (administrator-only)
    VerifyProject {
        /// Acting identity
        caller: Address,
        /// Project to verify
        project_id: ProjectId,
        /// Result channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Overwrite project progress (administrator-only)
    UpdateProjectProgress {
        /// Acting identity
        caller: Address,
        /// Project to update
        project_id: ProjectId,
        /// New absolute CO2 reduction in tonnes
        co2_reduced_tonnes: u64,
        /// Result channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Fetch a credit by id
    GetCredit {
        /// Credit id
        credit_id: CreditId,
        /// Result channel
        response: oneshot::Sender<Result<CarbonCredit>>,
    },

    /// Fetch a participant by identity
    GetParticipant {
        /// Identity
        identity: Address,
        /// Result channel
        response: oneshot::Sender<Result<Participant>>,
    },

    /// Fetch a project by id
    GetProject {
        /// Project id
        project_id: ProjectId,
        /// Result channel
        response: oneshot::Sender<Result<ClimateProject>>,
    },

    /// List a participant's owned credit ids
    OwnedCredits {
        /// Identity
        identity: Address,
        /// Result channel
        response: oneshot::Sender<Result<Vec<CreditId>>>,
    },

    /// List a project's contributors
    Contributors {
        /// Project id
        project_id: ProjectId,
        /// Result channel
        response: oneshot::Sender<Result<Vec<Address>>>,
    },

    /// Fetch a specific contribution amount
    Contribution {
        /// Project id
        project_id: ProjectId,
        /// Contributor identity
        contributor: Address,
        /// Result channel
        response: oneshot::Sender<Result<Decimal>>,
    },

    /// Fetch aggregate platform statistics
    Stats {
        /// Result channel
        response: oneshot::Sender<PlatformStats>,
    },

    /// Check issuer authorization
    IsAuthorizedIssuer {
        /// Identity
        identity: Address,
        /// Result channel
        response: oneshot::Sender<bool>,
    },

    /// Events with sequence greater than `after`
    Events {
        /// Sequence cursor
        after: u64,
        /// Result channel
        response: oneshot::Sender<Vec<EventEnvelope>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes registry commands
pub struct RegistryActor {
    state: RegistryState,
    engine: Arc<dyn SettlementEngine>,
    mailbox: mpsc::Receiver<RegistryCommand>,
    events_tx: broadcast::Sender<EventEnvelope>,
    metrics: Metrics,
}

impl std::fmt::Debug for RegistryActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryActor")
            .field("state", &self.state)
            .finish()
    }
}

impl RegistryActor {
    /// Create new actor
    pub fn new(
        state: RegistryState,
        engine: Arc<dyn SettlementEngine>,
        mailbox: mpsc::Receiver<RegistryCommand>,
        events_tx: broadcast::Sender<EventEnvelope>,
        metrics: Metrics,
    ) -> Self {
        Self {
            state,
            engine,
            mailbox,
            events_tx,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(cmd) = self.mailbox.recv().await {
            if matches!(cmd, RegistryCommand::Shutdown) {
                break;
            }
            self.handle_command(cmd);
        }
    }

    /// Publish an accepted event and bump the matching counter
    fn publish(&self, envelope: &EventEnvelope) {
        tracing::info!(
            event = envelope.event.name(),
            sequence = envelope.sequence,
            "registry event"
        );

        match &envelope.event {
            RegistryEvent::ParticipantRegistered { .. } => {
                self.metrics.participants_registered.inc()
            }
            RegistryEvent::CreditIssued { .. } => self.metrics.credits_issued.inc(),
            RegistryEvent::CreditTransferred { .. } => self.metrics.credit_transfers.inc(),
            RegistryEvent::CreditRetired { .. } => self.metrics.credits_retired.inc(),
            RegistryEvent::ProjectCreated { .. } => self.metrics.projects_created.inc(),
            RegistryEvent::ProjectFunded { amount, .. } => {
                use rust_decimal::prelude::ToPrimitive;
                self.metrics
                    .funding_volume
                    .inc_by(amount.to_f64().unwrap_or(0.0));
            }
            _ => {}
        }

        // Lagging or absent subscribers are not an error.
        let _ = self.events_tx.send(envelope.clone());
    }

    /// Unwrap an operation result: publish on success, count the rejection
    /// otherwise
    fn finish<T>(
        &self,
        result: Result<(T, EventEnvelope)>,
    ) -> Result<T> {
        match result {
            Ok((value, envelope)) => {
                self.publish(&envelope);
                Ok(value)
            }
            Err(err) => {
                self.metrics.rejected_operations.inc();
                tracing::debug!(error = %err, "operation rejected");
                Err(err)
            }
        }
    }

    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::RegisterParticipant {
                identity,
                name,
                organization,
                verification_doc,
                response,
            } => {
                let result = self
                    .state
                    .register_participant(identity, name, organization, verification_doc)
                    .map(|env| ((), env));
                let _ = response.send(self.finish(result));
            }

            RegistryCommand::VerifyParticipant {
                caller,
                identity,
                response,
            } => {
                let result = self
                    .state
                    .verify_participant(&caller, identity)
                    .map(|env| ((), env));
                let _ = response.send(self.finish(result));
            }

            RegistryCommand::SetIssuerAuthorization {
                caller,
                identity,
                allowed,
                response,
            } => {
                let result = self
                    .state
                    .set_issuer_authorization(&caller, identity, allowed)
                    .map(|env| ((), env));
                let _ = response.send(self.finish(result));
            }

            RegistryCommand::IssueCredit {
                issuer,
                project_name,
                amount_tonnes,
                price_per_tonne,
                verification_hash,
                methodology,
                response,
            } => {
                let result = self.state.issue_credit(
                    issuer,
                    project_name,
                    amount_tonnes,
                    price_per_tonne,
                    verification_hash,
                    methodology,
                );
                let _ = response.send(self.finish(result));
            }

            RegistryCommand::PurchaseCredit {
                buyer,
                credit_id,
                payment,
                response,
            } => {
                let result = self
                    .state
                    .purchase_credit(buyer, credit_id, payment, self.engine.as_ref())
                    .map(|env| ((), env));
                let _ = response.send(self.finish(result));
            }

            RegistryCommand::RetireCredit {
                caller,
                credit_id,
                response,
            } => {
                let result = self
                    .state
                    .retire_credit(&caller, credit_id)
                    .map(|env| ((), env));
                let _ = response.send(self.finish(result));
            }

            RegistryCommand::CreateProject {
                owner,
                name,
                description,
                location,
                target_co2_tonnes,
                funding_goal,
                response,
            } => {
                let result = self.state.create_project(
                    owner,
                    name,
                    description,
                    location,
                    target_co2_tonnes,
                    funding_goal,
                );
                let _ = response.send(self.finish(result));
            }

            RegistryCommand::FundProject {
                contributor,
                project_id,
                amount,
                response,
            } => {
                let result = self
                    .state
                    .fund_project(contributor, project_id, amount, self.engine.as_ref())
                    .map(|env| ((), env));
                let _ = response.send(self.finish(result));
            }

            RegistryCommand::VerifyProject {
                caller,
                project_id,
                response,
            } => {
                let result = self
                    .state
                    .verify_project(&caller, project_id)
                    .map(|env| ((), env));
                let _ = response.send(self.finish(result));
            }

            RegistryCommand::UpdateProjectProgress {
                caller,
                project_id,
                co2_reduced_tonnes,
                response,
            } => {
                let result = self
                    .state
                    .update_project_progress(&caller, project_id, co2_reduced_tonnes)
                    .map(|env| ((), env));
                let _ = response.send(self.finish(result));
            }

            RegistryCommand::GetCredit {
                credit_id,
                response,
            } => {
                let _ = response.send(self.state.credit(credit_id).cloned());
            }

            RegistryCommand::GetParticipant { identity, response } => {
                let _ = response.send(self.state.participant(&identity).cloned());
            }

            RegistryCommand::GetProject {
                project_id,
                response,
            } => {
                let _ = response.send(self.state.project(project_id).cloned());
            }

            RegistryCommand::OwnedCredits { identity, response } => {
                let _ = response.send(self.state.owned_credits(&identity));
            }

            RegistryCommand::Contributors {
                project_id,
                response,
            } => {
                let _ = response.send(self.state.contributors(project_id));
            }

            RegistryCommand::Contribution {
                project_id,
                contributor,
                response,
            } => {
                let _ = response.send(self.state.contribution(project_id, &contributor));
            }

            RegistryCommand::Stats { response } => {
                let held = self.engine.balance_of(self.state.settlement_account());
                let _ = response.send(self.state.stats(held));
            }

            RegistryCommand::IsAuthorizedIssuer { identity, response } => {
                let _ = response.send(self.state.is_authorized_issuer(&identity));
            }

            RegistryCommand::Events { after, response } => {
                let _ = response.send(self.state.events_since(after));
            }

            RegistryCommand::Shutdown => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending commands to the actor
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    async fn send(&self, cmd: RegistryCommand) -> Result<()> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))
    }

    async fn recv<T>(&self, rx: oneshot::Receiver<T>) -> Result<T> {
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Register a participant
    pub async fn register_participant(
        &self,
        identity: Address,
        name: String,
        organization: String,
        verification_doc: String,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::RegisterParticipant {
            identity,
            name,
            organization,
            verification_doc,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Verify a participant (administrator-only)
    pub async fn verify_participant(&self, caller: Address, identity: Address) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::VerifyParticipant {
            caller,
            identity,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Grant or revoke issuer authorization (administrator-only)
    pub async fn set_issuer_authorization(
        &self,
        caller: Address,
        identity: Address,
        allowed: bool,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::SetIssuerAuthorization {
            caller,
            identity,
            allowed,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Issue a credit
    #[allow(clippy::too_many_arguments)]
    pub async fn issue_credit(
        &self,
        issuer: Address,
        project_name: String,
        amount_tonnes: u64,
        price_per_tonne: Decimal,
        verification_hash: String,
        methodology: String,
    ) -> Result<CreditId> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::IssueCredit {
            issuer,
            project_name,
            amount_tonnes,
            price_per_tonne,
            verification_hash,
            methodology,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Purchase a credit
    pub async fn purchase_credit(
        &self,
        buyer: Address,
        credit_id: CreditId,
        payment: Decimal,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::PurchaseCredit {
            buyer,
            credit_id,
            payment,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Retire a credit
    pub async fn retire_credit(&self, caller: Address, credit_id: CreditId) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::RetireCredit {
            caller,
            credit_id,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Create a project
    #[allow(clippy::too_many_arguments)]
    pub async fn create_project(
        &self,
        owner: Address,
        name: String,
        description: String,
        location: String,
        target_co2_tonnes: u64,
        funding_goal: Decimal,
    ) -> Result<ProjectId> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::CreateProject {
            owner,
            name,
            description,
            location,
            target_co2_tonnes,
            funding_goal,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Fund a project
    pub async fn fund_project(
        &self,
        contributor: Address,
        project_id: ProjectId,
        amount: Decimal,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::FundProject {
            contributor,
            project_id,
            amount,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Verify a project (administrator-only)
    pub async fn verify_project(&self, caller: Address, project_id: ProjectId) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::VerifyProject {
            caller,
            project_id,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Overwrite project progress (administrator-only)
    pub async fn update_project_progress(
        &self,
        caller: Address,
        project_id: ProjectId,
        co2_reduced_tonnes: u64,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::UpdateProjectProgress {
            caller,
            project_id,
            co2_reduced_tonnes,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Fetch a credit by id
    pub async fn credit(&self, credit_id: CreditId) -> Result<CarbonCredit> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::GetCredit {
            credit_id,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Fetch a participant by identity
    pub async fn participant(&self, identity: Address) -> Result<Participant> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::GetParticipant {
            identity,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Fetch a project by id
    pub async fn project(&self, project_id: ProjectId) -> Result<ClimateProject> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::GetProject {
            project_id,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// List a participant's owned credit ids
    pub async fn owned_credits(&self, identity: Address) -> Result<Vec<CreditId>> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::OwnedCredits {
            identity,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// List a project's contributors
    pub async fn contributors(&self, project_id: ProjectId) -> Result<Vec<Address>> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::Contributors {
            project_id,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Fetch a specific contribution amount
    pub async fn contribution(
        &self,
        project_id: ProjectId,
        contributor: Address,
    ) -> Result<Decimal> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::Contribution {
            project_id,
            contributor,
            response: tx,
        })
        .await?;
        self.recv(rx).await?
    }

    /// Fetch aggregate platform statistics
    pub async fn stats(&self) -> Result<PlatformStats> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::Stats { response: tx }).await?;
        self.recv(rx).await
    }

    /// Check issuer authorization
    pub async fn is_authorized_issuer(&self, identity: Address) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::IsAuthorizedIssuer {
            identity,
            response: tx,
        })
        .await?;
        self.recv(rx).await
    }

    /// Events with sequence greater than `after`
    pub async fn events(&self, after: u64) -> Result<Vec<EventEnvelope>> {
        let (tx, rx) = oneshot::channel();
        self.send(RegistryCommand::Events {
            after,
            response: tx,
        })
        .await?;
        self.recv(rx).await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.send(RegistryCommand::Shutdown).await
    }
}

/// Spawn the registry actor
pub fn spawn_registry_actor(
    state: RegistryState,
    engine: Arc<dyn SettlementEngine>,
    mailbox_capacity: usize,
    events_tx: broadcast::Sender<EventEnvelope>,
    metrics: Metrics,
) -> RegistryHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = RegistryActor::new(state, engine, rx, events_tx, metrics);

    tokio::spawn(async move {
        actor.run().await;
    });

    RegistryHandle::new(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::NullEngine;

    fn spawn() -> RegistryHandle {
        let state = RegistryState::new(Address::new("admin"), Address::new("ledger"));
        let (events_tx, _) = broadcast::channel(64);
        spawn_registry_actor(
            state,
            Arc::new(NullEngine),
            100,
            events_tx,
            Metrics::new().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let handle = spawn();
        assert!(format!("{handle:?}").contains("RegistryHandle"));
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_register_and_query_through_handle() {
        let handle = spawn();

        handle
            .register_participant(
                Address::new("alice"),
                "alice".to_string(),
                "ngo".to_string(),
                "doc://kyc".to_string(),
            )
            .await
            .unwrap();

        let participant = handle.participant(Address::new("alice")).await.unwrap();
        assert_eq!(participant.name, "alice");

        let stats = handle.stats().await.unwrap();
        assert_eq!(stats.total_participants, 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_serialized_mutations_on_same_credit() {
        let handle = spawn();
        let admin = Address::new("admin");

        for who in ["alice", "bob"] {
            handle
                .register_participant(
                    Address::new(who),
                    who.to_string(),
                    "ngo".to_string(),
                    String::new(),
                )
                .await
                .unwrap();
        }
        handle
            .set_issuer_authorization(admin.clone(), Address::new("alice"), true)
            .await
            .unwrap();
        let credit_id = handle
            .issue_credit(
                Address::new("alice"),
                "Project".to_string(),
                10,
                Decimal::from(5),
                "Qm123".to_string(),
                "VM0042".to_string(),
            )
            .await
            .unwrap();

        // A purchase and a retirement race on the same credit; the actor
        // serializes them so exactly one succeeds.
        let purchase = handle.purchase_credit(Address::new("bob"), credit_id, Decimal::from(50));
        let retire = handle.retire_credit(Address::new("alice"), credit_id);
        let (p, r) = tokio::join!(purchase, retire);
        assert!(p.is_ok() != r.is_ok());

        handle.shutdown().await.unwrap();
    }
}
