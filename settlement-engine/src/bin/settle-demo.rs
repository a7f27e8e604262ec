//! Demo binary: seed a ledger and run one atomic and one best-effort batch

use settlement_engine::{Config, SettlementEngine, SystemClock};
use std::sync::Arc;
use transport_core::{Address, Asset, AssetLedger, TokenBehavior, TokenId};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("starting settlement demo");

    let config = Config::from_env()?;
    let ledger = Arc::new(AssetLedger::new());
    let engine = SettlementEngine::new(
        ledger.clone(),
        config.engine_address(),
        config.owner_address(),
        config.governance_params(),
        Arc::new(SystemClock),
    )?;

    let payer = Address::new("payer");
    let recipients = vec![
        Address::new("alice"),
        Address::new("bob"),
        Address::new("carol"),
    ];
    let amounts: Vec<u128> = vec![125, 75, 200];
    let total: u128 = amounts.iter().sum();

    // Atomic native batch.
    ledger.mint(&Asset::Native, &payer, 1_000_000)?;
    let fee = engine.quote_fee(total)?;
    let receipt = engine.settle_native(&payer, &recipients, &amounts, total + fee)?;
    println!("atomic: {}", serde_json::to_string_pretty(&receipt)?);

    // Best-effort token batch with one blocked recipient.
    let usdx = TokenId::new("usdx");
    ledger.register_token(usdx.clone(), TokenBehavior::Standard);
    ledger.mint(&Asset::Token(usdx.clone()), &payer, 1_000_000)?;
    ledger.set_blocked(&Asset::Token(usdx.clone()), &recipients[1], true);
    let receipt = engine.settle_token_best_effort(&payer, &usdx, &recipients, &amounts)?;
    println!("best-effort: {}", serde_json::to_string_pretty(&receipt)?);

    tracing::info!(events = engine.events().len(), "demo complete");
    Ok(())
}
