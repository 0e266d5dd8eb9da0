// Rust guideline compliant 2026-10-15

//! Wallet demo entry point.
//!
//! Registers a handful of accounts, runs a short payment scenario through the
//! parallel sum and filter operations, then streams progress over a large
//! synthetic ledger. Configuration is read from `WALLET_*` variables (see
//! [`config`]).
//!
//! # Usage
//!
//! ```text
//! RUST_LOG=info cargo run --bin wallet
//!
//! # Reproducible bulk ledger, dumped to ./data
//! WALLET_SEED=7 WALLET_DUMP_DIR=data cargo run --bin wallet
//! ```

mod config;

use aggregator::{ProgressConfig, filter_payments, sum_payments, sum_payments_with_progress};
use anyhow::Context as _;
use config::DemoConfig;
use domain::{Money, PaymentCategory, Phone};
use ledger::Ledger;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing_subscriber::EnvFilter;

const PHONES: &[&str] = &[
    "+992930000001",
    "+992920000002",
    "+992980000003",
    "+992880000004",
    "+992000000005",
];

const CATEGORIES: &[&str] = &["cat", "auto", "auto", "shop", "food", "coffee"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DemoConfig::from_env().context("failed to read demo config")?;
    tracing::info!(?config, "wallet.config");

    let ledger = run_scenario(config.workers).await?;

    let bulk = bulk_ledger(&config).context("failed to build bulk ledger")?;
    stream_progress(&bulk, &config).await?;

    if let Some(dir) = &config.dump_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        ledger.export(dir).context("failed to export ledger")?;
    }

    Ok(())
}

/// Five accounts, six payments of 5 000 on the first, then sum, filter and reject.
async fn run_scenario(workers: usize) -> anyhow::Result<Ledger> {
    let mut ledger = Ledger::new();
    for phone in PHONES {
        ledger.register_account(Phone::from(*phone))?;
    }

    let account_id = 1;
    ledger.deposit(account_id, Money::new(500_000))?;
    let mut payments = Vec::with_capacity(CATEGORIES.len());
    for category in CATEGORIES {
        payments.push(ledger.pay(account_id, Money::new(5_000), PaymentCategory::from(*category))?);
    }

    let total = sum_payments(&ledger, workers).await?;
    tracing::info!(%total, workers, "wallet.scenario.sum");

    let found = filter_payments(&ledger, account_id, workers).await?;
    tracing::info!(
        account_id,
        matches = found.as_ref().map_or(0, Vec::len),
        "wallet.scenario.filter"
    );

    let coffee = payments.last().context("scenario made no payments")?;
    let favorite = ledger.favorite_payment(coffee.id, "coffee")?;
    ledger.pay_from_favorite(favorite.id)?;
    ledger.reject(coffee.id)?;
    let balance = ledger.find_account_by_id(account_id)?.balance;
    tracing::info!(account_id, %balance, "wallet.scenario.rejected");

    Ok(ledger)
}

/// Synthetic ledger with `config.bulk_payments` random payments over ten accounts.
fn bulk_ledger(config: &DemoConfig) -> anyhow::Result<Ledger> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut ledger = Ledger::new();
    let mut ids = Vec::with_capacity(10);
    for i in 0..10 {
        let account = ledger.register_account(Phone::from(format!("+99290{i:07}")))?;
        ledger.deposit(account.id, Money::new(i64::MAX / 16))?;
        ids.push(account.id);
    }

    for _ in 0..config.bulk_payments {
        let account_id = ids[rng.random_range(0..ids.len())];
        let amount = Money::new(rng.random_range(1..=10_000));
        let category = CATEGORIES[rng.random_range(0..CATEGORIES.len())];
        ledger.pay(account_id, amount, PaymentCategory::from(category))?;
    }
    tracing::info!(payments = config.bulk_payments, "wallet.bulk.ready");
    Ok(ledger)
}

/// Consume the progress stream, racing it against CTRL+C.
async fn stream_progress(ledger: &Ledger, config: &DemoConfig) -> anyhow::Result<()> {
    let progress_config = ProgressConfig::builder()
        .window_size(config.window_size)
        .build()
        .context("failed to build progress config")?;
    let mut events = sum_payments_with_progress(ledger, &progress_config);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut seen = 0usize;
    let mut total = Money::ZERO;
    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("failed to listen for ctrl_c")?;
                tracing::info!(seen, "wallet.shutdown: ctrl_c received");
                return Ok(());
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                let event = event.context("progress window failed")?;
                seen += event.part_size;
                total = total
                    .checked_add(event.partial_result)
                    .context("progress total overflowed")?;
                tracing::info!(
                    part_size = event.part_size,
                    partial = %event.partial_result,
                    seen,
                    "wallet.progress"
                );
            }
        }
    }

    let expected = sum_payments(ledger, config.workers).await?;
    tracing::info!(%total, %expected, "wallet.progress.finished");
    anyhow::ensure!(total == expected, "progress total {total} differs from sum {expected}");
    Ok(())
}
