//! Walks the registry through a full credit and project lifecycle against
//! the in-memory funds engine. Run with `cargo run --bin registry-demo`.

use registry_core::{Address, Config, Registry};
use rust_decimal::Decimal;
use settlement::FundsEngine;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> registry_core::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = Config::default();
    let admin = config.owner.clone();

    let engine = Arc::new(FundsEngine::new());
    engine.deposit(&Address::new("buyer"), Decimal::from(1_000));
    engine.deposit(&Address::new("funder"), Decimal::from(1_000));

    let registry = Registry::open(config, engine.clone()).await?;
    let mut events = registry.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(envelope) = events.recv().await {
            info!(
                sequence = envelope.sequence,
                event = envelope.event.name(),
                "event"
            );
        }
    });

    // Participants
    for id in ["issuer", "buyer", "funder"] {
        registry
            .register_participant(Address::new(id), id, "demo org", "doc://kyc")
            .await?;
    }
    registry
        .set_issuer_authorization(admin.clone(), Address::new("issuer"), true)
        .await?;

    // Credit lifecycle: issue, purchase with overpayment, retire
    let credit_id = registry
        .issue_credit(
            Address::new("issuer"),
            "Mangrove Restoration",
            100,
            Decimal::from(3),
            "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG",
            "VM0033",
        )
        .await?;
    registry
        .purchase_credit(Address::new("buyer"), credit_id, Decimal::from(350))
        .await?;
    registry
        .retire_credit(Address::new("buyer"), credit_id)
        .await?;

    // Project lifecycle: create, fund past the goal, verify, record progress
    let project_id = registry
        .create_project(
            Address::new("issuer"),
            "Atacama Reforestation",
            "Native tree replanting on degraded ranch land",
            "Atacama, Chile",
            5_000,
            Decimal::from(800),
        )
        .await?;
    registry
        .fund_project(Address::new("funder"), project_id, Decimal::from(900))
        .await?;
    registry
        .verify_project(admin.clone(), project_id)
        .await?;
    registry
        .update_project_progress(admin, project_id, 1_200)
        .await?;

    let stats = registry.stats().await?;
    info!(
        participants = stats.total_participants,
        credits = stats.total_credits_issued,
        projects = stats.total_projects_created,
        "final platform state"
    );
    info!(
        issuer = %engine.balance(&Address::new("issuer")),
        buyer = %engine.balance(&Address::new("buyer")),
        funder = %engine.balance(&Address::new("funder")),
        "final balances"
    );

    registry.shutdown().await?;
    printer.abort();
    Ok(())
}
