//! Metrics collection for observability
//!
//! Prometheus counters for monitoring the registry.
//!
//! # Metrics
//!
//! - `registry_participants_registered_total` - Participants registered
//! - `registry_credits_issued_total` - Credits issued
//! - `registry_credit_transfers_total` - Credit purchases completed
//! - `registry_credits_retired_total` - Credits retired
//! - `registry_projects_created_total` - Projects created
//! - `registry_funding_volume_total` - Funding volume forwarded to owners
//! - `registry_rejected_operations_total` - Operations rejected by a precondition

use prometheus::{Counter, IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Debug, Clone)]
pub struct Metrics {
    /// Participants registered
    pub participants_registered: IntCounter,

    /// Credits issued
    pub credits_issued: IntCounter,

    /// Credit purchases completed
    pub credit_transfers: IntCounter,

    /// Credits retired
    pub credits_retired: IntCounter,

    /// Projects created
    pub projects_created: IntCounter,

    /// Funding volume forwarded to project owners
    pub funding_volume: Counter,

    /// Operations rejected by a precondition
    pub rejected_operations: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let participants_registered = IntCounter::with_opts(Opts::new(
            "registry_participants_registered_total",
            "Total participants registered",
        ))?;
        registry.register(Box::new(participants_registered.clone()))?;

        let credits_issued = IntCounter::with_opts(Opts::new(
            "registry_credits_issued_total",
            "Total carbon credits issued",
        ))?;
        registry.register(Box::new(credits_issued.clone()))?;

        let credit_transfers = IntCounter::with_opts(Opts::new(
            "registry_credit_transfers_total",
            "Total credit purchases completed",
        ))?;
        registry.register(Box::new(credit_transfers.clone()))?;

        let credits_retired = IntCounter::with_opts(Opts::new(
            "registry_credits_retired_total",
            "Total credits retired",
        ))?;
        registry.register(Box::new(credits_retired.clone()))?;

        let projects_created = IntCounter::with_opts(Opts::new(
            "registry_projects_created_total",
            "Total climate projects created",
        ))?;
        registry.register(Box::new(projects_created.clone()))?;

        let funding_volume = Counter::with_opts(Opts::new(
            "registry_funding_volume_total",
            "Total funding volume forwarded to project owners",
        ))?;
        registry.register(Box::new(funding_volume.clone()))?;

        let rejected_operations = IntCounter::with_opts(Opts::new(
            "registry_rejected_operations_total",
            "Total operations rejected by a precondition",
        ))?;
        registry.register(Box::new(rejected_operations.clone()))?;

        Ok(Self {
            participants_registered,
            credits_issued,
            credit_transfers,
            credits_retired,
            projects_created,
            funding_volume,
            rejected_operations,
            registry,
        })
    }
}
