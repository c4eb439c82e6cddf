//! Main registry orchestration layer
//!
//! Ties together the state machine, the settlement engine, the event
//! broadcast, and metrics behind a single async API.
//!
//! # Example
//!
//! ```no_run
//! use registry_core::{Config, NullEngine, Registry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> registry_core::Result<()> {
//!     let config = Config::default();
//!     let registry = Registry::open(config, Arc::new(NullEngine)).await?;
//!
//!     let admin = registry.config().owner.clone();
//!     registry
//!         .set_issuer_authorization(admin.clone(), "issuer-1".into(), true)
//!         .await?;
//!
//!     registry.shutdown().await?;
//!     Ok(())
//! }
//! ```

use crate::actor::{spawn_registry_actor, RegistryHandle};
use crate::config::Config;
use crate::error::Result;
use crate::events::EventEnvelope;
use crate::metrics::Metrics;
use crate::settlement::SettlementEngine;
use crate::state::RegistryState;
use crate::types::{
    Address, CarbonCredit, ClimateProject, CreditId, Participant, PlatformStats, ProjectId,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::broadcast;

/// The registry ledger: the full public operation surface
pub struct Registry {
    /// Actor handle for all operations
    handle: RegistryHandle,

    /// Event broadcast for external observers
    events_tx: broadcast::Sender<EventEnvelope>,

    /// Metrics collector
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("service_name", &self.config.service_name)
            .field("owner", &self.config.owner)
            .finish()
    }
}

impl Registry {
    /// Open a registry with the given configuration and settlement engine
    pub async fn open(config: Config, engine: Arc<dyn SettlementEngine>) -> Result<Self> {
        let metrics = Metrics::new()
            .map_err(|e| crate::Error::Config(format!("metrics init failed: {e}")))?;
        let (events_tx, _) = broadcast::channel(config.event_channel_capacity);

        let state = RegistryState::new(config.owner.clone(), config.settlement_account.clone());
        let handle = spawn_registry_actor(
            state,
            engine,
            config.mailbox_capacity,
            events_tx.clone(),
            metrics.clone(),
        );

        tracing::info!(
            service = %config.service_name,
            owner = %config.owner,
            "registry opened"
        );

        Ok(Self {
            handle,
            events_tx,
            metrics,
            config,
        })
    }

    /// Configuration in effect
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events_tx.subscribe()
    }

    // ───────────────────────── mutating operations ─────────────────────────

    /// Register a participant
    pub async fn register_participant(
        &self,
        identity: Address,
        name: impl Into<String>,
        organization: impl Into<String>,
        verification_doc: impl Into<String>,
    ) -> Result<()> {
        self.handle
            .register_participant(
                identity,
                name.into(),
                organization.into(),
                verification_doc.into(),
            )
            .await
    }

    /// Verify a participant (administrator-only)
    pub async fn verify_participant(&self, caller: Address, identity: Address) -> Result<()> {
        self.handle.verify_participant(caller, identity).await
    }

    /// Grant or revoke issuer authorization (administrator-only)
    pub async fn set_issuer_authorization(
        &self,
        caller: Address,
        identity: Address,
        allowed: bool,
    ) -> Result<()> {
        self.handle
            .set_issuer_authorization(caller, identity, allowed)
            .await
    }

    /// Issue a credit to the issuer's own account
    pub async fn issue_credit(
        &self,
        issuer: Address,
        project_name: impl Into<String>,
        amount_tonnes: u64,
        price_per_tonne: Decimal,
        verification_hash: impl Into<String>,
        methodology: impl Into<String>,
    ) -> Result<CreditId> {
        self.handle
            .issue_credit(
                issuer,
                project_name.into(),
                amount_tonnes,
                price_per_tonne,
                verification_hash.into(),
                methodology.into(),
            )
            .await
    }

    /// Purchase a credit, paying its full price with automatic refund of the
    /// excess
    pub async fn purchase_credit(
        &self,
        buyer: Address,
        credit_id: CreditId,
        payment: Decimal,
    ) -> Result<()> {
        self.handle.purchase_credit(buyer, credit_id, payment).await
    }

    /// Retire a credit permanently
    pub async fn retire_credit(&self, caller: Address, credit_id: CreditId) -> Result<()> {
        self.handle.retire_credit(caller, credit_id).await
    }

    /// Create a climate project
    pub async fn create_project(
        &self,
        owner: Address,
        name: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
        target_co2_tonnes: u64,
        funding_goal: Decimal,
    ) -> Result<ProjectId> {
        self.handle
            .create_project(
                owner,
                name.into(),
                description.into(),
                location.into(),
                target_co2_tonnes,
                funding_goal,
            )
            .await
    }

    /// Fund a project; the amount forwards to the project owner immediately
    pub async fn fund_project(
        &self,
        contributor: Address,
        project_id: ProjectId,
        amount: Decimal,
    ) -> Result<()> {
        self.handle
            .fund_project(contributor, project_id, amount)
            .await
    }

    /// Verify a project (administrator-only)
    pub async fn verify_project(&self, caller: Address, project_id: ProjectId) -> Result<()> {
        self.handle.verify_project(caller, project_id).await
    }

    /// Overwrite project progress (administrator-only)
    pub async fn update_project_progress(
        &self,
        caller: Address,
        project_id: ProjectId,
        co2_reduced_tonnes: u64,
    ) -> Result<()> {
        self.handle
            .update_project_progress(caller, project_id, co2_reduced_tonnes)
            .await
    }

    // ───────────────────────── read-only queries ─────────────────────────

    /// Fetch a credit by id
    pub async fn credit(&self, credit_id: CreditId) -> Result<CarbonCredit> {
        self.handle.credit(credit_id).await
    }

    /// Fetch a participant by identity
    pub async fn participant(&self, identity: Address) -> Result<Participant> {
        self.handle.participant(identity).await
    }

    /// Fetch a project by id
    pub async fn project(&self, project_id: ProjectId) -> Result<ClimateProject> {
        self.handle.project(project_id).await
    }

    /// List a participant's owned credit ids
    pub async fn owned_credits(&self, identity: Address) -> Result<Vec<CreditId>> {
        self.handle.owned_credits(identity).await
    }

    /// List a project's contributors in first-contribution order
    pub async fn contributors(&self, project_id: ProjectId) -> Result<Vec<Address>> {
        self.handle.contributors(project_id).await
    }

    /// Fetch a contributor's cumulative contribution to a project
    pub async fn contribution(
        &self,
        project_id: ProjectId,
        contributor: Address,
    ) -> Result<Decimal> {
        self.handle.contribution(project_id, contributor).await
    }

    /// Fetch aggregate platform statistics
    pub async fn stats(&self) -> Result<PlatformStats> {
        self.handle.stats().await
    }

    /// Check issuer authorization
    pub async fn is_authorized_issuer(&self, identity: Address) -> Result<bool> {
        self.handle.is_authorized_issuer(identity).await
    }

    /// Events with sequence greater than `after`
    pub async fn events(&self, after: u64) -> Result<Vec<EventEnvelope>> {
        self.handle.events(after).await
    }

    /// Shutdown registry
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}
