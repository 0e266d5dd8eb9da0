// Rust guideline compliant 2026-10-15

//! Demo configuration, built in code and optionally overridden from the
//! environment.
//!
//! | Variable               | Field           |
//! |------------------------|-----------------|
//! | `WALLET_BULK_PAYMENTS` | `bulk_payments` |
//! | `WALLET_WORKERS`       | `workers`       |
//! | `WALLET_WINDOW_SIZE`   | `window_size`   |
//! | `WALLET_SEED`          | `seed`          |
//! | `WALLET_DUMP_DIR`      | `dump_dir`      |

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context as _;

/// Runtime configuration for the demo binary.
///
/// Construct via [`DemoConfig::builder`] or [`DemoConfig::from_env`].
#[derive(Debug)]
pub struct DemoConfig {
    /// Number of synthetic payments in the bulk ledger (range: `[1, ..]`).
    pub bulk_payments: usize,
    /// Worker count passed to the sum/filter operations (range: `[0, aggregator::MAX_WORKERS]`).
    pub workers: usize,
    /// Window size for the progress stream (range: `[1, ..]`).
    pub window_size: usize,
    /// Optional RNG seed for a reproducible bulk ledger. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Directory receiving the ledger dump. `None` skips the export.
    pub dump_dir: Option<PathBuf>,
}

/// Builder for [`DemoConfig`].
#[derive(Debug)]
pub struct DemoConfigBuilder {
    bulk_payments: usize,
    workers: usize,
    window_size: usize,
    seed: Option<u64>,
    dump_dir: Option<PathBuf>,
}

impl DemoConfig {
    /// Create a builder.
    ///
    /// Default values: `bulk_payments = 250_000`, `workers = 4`,
    /// `window_size = 100_000`, `seed = None`, `dump_dir = None`.
    #[must_use]
    pub fn builder() -> DemoConfigBuilder {
        DemoConfigBuilder {
            // Two full windows plus a partial one at the default window size.
            bulk_payments: 250_000,
            workers: 4,
            window_size: aggregator::DEFAULT_WINDOW_SIZE,
            seed: None,
            dump_dir: None,
        }
    }

    /// Builder defaults overridden by any `WALLET_*` variable that is set.
    ///
    /// # Errors
    ///
    /// Fails when a variable cannot be parsed or the result is invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut builder = Self::builder();
        if let Some(n) = env_var("WALLET_BULK_PAYMENTS")? {
            builder = builder.bulk_payments(n);
        }
        if let Some(n) = env_var("WALLET_WORKERS")? {
            builder = builder.workers(n);
        }
        if let Some(n) = env_var("WALLET_WINDOW_SIZE")? {
            builder = builder.window_size(n);
        }
        if let Some(seed) = env_var("WALLET_SEED")? {
            builder = builder.seed(seed);
        }
        if let Some(dir) = std::env::var_os("WALLET_DUMP_DIR") {
            builder = builder.dump_dir(PathBuf::from(dir));
        }
        builder.build()
    }
}

impl DemoConfigBuilder {
    /// Override the bulk ledger size.
    #[must_use]
    pub fn bulk_payments(mut self, n: usize) -> Self {
        self.bulk_payments = n;
        self
    }

    /// Override the worker count.
    #[must_use]
    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    /// Override the progress window size.
    #[must_use]
    pub fn window_size(mut self, n: usize) -> Self {
        self.window_size = n;
        self
    }

    /// Fix the RNG seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Export the ledger into `dir` at the end of the run.
    #[must_use]
    pub fn dump_dir(mut self, dir: PathBuf) -> Self {
        self.dump_dir = Some(dir);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Fails when `bulk_payments` or `window_size` is zero, or when `workers`
    /// exceeds `aggregator::MAX_WORKERS`.
    pub fn build(self) -> anyhow::Result<DemoConfig> {
        anyhow::ensure!(self.bulk_payments > 0, "bulk_payments must be >= 1");
        anyhow::ensure!(self.window_size > 0, "window_size must be >= 1");
        anyhow::ensure!(
            self.workers <= aggregator::MAX_WORKERS,
            "workers must be <= {}, got {}",
            aggregator::MAX_WORKERS,
            self.workers
        );
        Ok(DemoConfig {
            bulk_payments: self.bulk_payments,
            workers: self.workers,
            window_size: self.window_size,
            seed: self.seed,
            dump_dir: self.dump_dir,
        })
    }
}

/// Parse an optional environment variable.
fn env_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .with_context(|| format!("invalid {name}={raw:?}")),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("unreadable {name}")),
    }
}
