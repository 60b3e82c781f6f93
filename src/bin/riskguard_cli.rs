//! Demo/test tooling: submits a transaction from a JSON file or stdin
//! through the full in-memory pipeline and prints the resulting
//! `Transaction` plus a summary of the events it produced. Not an HTTP
//! controller surface — this is ambient test tooling, a standalone
//! companion binary alongside the library crate.

use std::io::Read as _;
use std::time::Duration;

use riskguard_backend::{harness, RiskGuardConfig};
use riskguard_types::TransactionRequest;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = RiskGuardConfig::from_env().unwrap_or_default();
    let harness = harness::build(config);

    let request = read_request()?;
    tracing::info!(user_id = %request.user_id, amount = %request.amount, "submitting transaction");

    let saved = harness.workflow.process(request).await?;
    println!("{}", serde_json::to_string_pretty(&saved)?);

    // The evaluation task is enqueued, not awaited, per the pipeline's
    // fire-and-forget ordering; give the worker pool a moment before the
    // demo process exits so the printed event summary below is useful.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let events = harness
        .events
        .by_aggregate(&saved.user_id, riskguard_types::AggregateType::User)
        .await?;
    eprintln!("--- events appended for user {} ---", saved.user_id);
    for event in &events {
        eprintln!("  [{}] {:?}", event.sequence_number, event.event_type);
    }

    let profile = harness.profiles.get(&saved.user_id).await?;
    if let Some(profile) = profile {
        eprintln!(
            "--- profile: overall_risk_score={:.3} total_transactions={} ---",
            profile.overall_risk_score, profile.total_transactions
        );
    }

    Ok(())
}

fn read_request() -> anyhow::Result<TransactionRequest> {
    let path = std::env::args().nth(1);
    let raw = match path {
        Some(path) if path != "-" => std::fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riskguard_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    Ok(())
}
