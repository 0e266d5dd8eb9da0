// Rust guideline compliant 2026-10-14

//! Windowed summation that streams one [`Progress`] event per window.
//!
//! Entry point: [`sum_payments_with_progress`]. Configuration via
//! [`ProgressConfig::builder`].

use std::ops::Range;
use std::sync::Arc;

use domain::{Money, PaymentSource, Progress};
use tokio::sync::mpsc;

use crate::{AggregateError, Worker, fan_in, join_workers};

/// Default number of payments summed by one window worker.
pub const DEFAULT_WINDOW_SIZE: usize = 100_000;

/// Default buffer size of the merged progress channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

// ---------------------------------------------------------------------------
// ProgressConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for [`sum_payments_with_progress`].
///
/// Construct via [`ProgressConfig::builder`].
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Number of payments per window (range: `[1, usize::MAX]`).
    pub window_size: usize,
    /// Buffer size of the merged output channel (range: `[1, usize::MAX]`).
    pub channel_capacity: usize,
}

/// Builder for [`ProgressConfig`].
///
/// Obtain via [`ProgressConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct ProgressConfigBuilder {
    window_size: usize,
    channel_capacity: usize,
}

impl ProgressConfig {
    /// Create a builder.
    ///
    /// Default values: `window_size = 100_000`, `channel_capacity = 16`.
    #[must_use]
    pub fn builder() -> ProgressConfigBuilder {
        ProgressConfigBuilder {
            window_size: DEFAULT_WINDOW_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ProgressConfigBuilder {
    /// Override the number of payments per window.
    #[must_use]
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Override the merged channel buffer size.
    #[must_use]
    pub fn channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::InvalidConfig`] when `window_size` or
    /// `channel_capacity` is zero.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<ProgressConfig, AggregateError> {
        if self.window_size == 0 {
            return Err(AggregateError::InvalidConfig {
                reason: "window_size must be >= 1".to_owned(),
            });
        }
        if self.channel_capacity == 0 {
            return Err(AggregateError::InvalidConfig {
                reason: "channel_capacity must be >= 1".to_owned(),
            });
        }
        Ok(ProgressConfig {
            window_size: self.window_size,
            channel_capacity: self.channel_capacity,
        })
    }
}

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// Split `[0, total)` into consecutive windows of `window_size` records.
///
/// The trailing window holds the remainder when `total` is not a multiple of
/// `window_size`. An empty log has no windows. A zero `window_size` is treated
/// as 1.
#[must_use]
pub fn windows(total: usize, window_size: usize) -> Vec<Range<usize>> {
    let window_size = window_size.max(1);
    (0..total)
        .step_by(window_size)
        .map(|start| start..total.min(start + window_size))
        .collect()
}

// ---------------------------------------------------------------------------
// Streaming sum
// ---------------------------------------------------------------------------

/// Sum every payment window by window, streaming one [`Progress`] per window.
///
/// One task per window computes a partial sum and sends it on its own channel;
/// [`fan_in::merge`] relays every window channel, and a forwarder wraps each
/// event in `Ok` for the returned receiver. Events arrive in completion order.
/// A log smaller than one window still produces exactly one event; an empty
/// log produces none.
///
/// Once every window worker has finished, a failed window (an overflowing sum
/// or a panic) is reported as one trailing `Err` for the lowest-indexed
/// failing window, in place of that window's event. The receiver then returns
/// `None`. A stream that ends without an `Err` carried one `Ok` per window.
///
/// Dropping the receiver early stops relaying, but window workers still finish.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
#[must_use = "events are only produced for a live receiver"]
pub fn sum_payments_with_progress<S>(
    source: &S,
    config: &ProgressConfig,
) -> mpsc::Receiver<Result<Progress, AggregateError>>
where
    S: PaymentSource + ?Sized,
{
    let snapshot = source.current_payments();
    let windows = windows(snapshot.len(), config.window_size);
    tracing::debug!(
        records = snapshot.len(),
        windows = windows.len(),
        window_size = config.window_size,
        "aggregator.progress.started"
    );

    let mut sources = Vec::with_capacity(windows.len());
    let mut workers = Vec::with_capacity(windows.len());
    for (index, range) in windows.into_iter().enumerate() {
        let (tx, rx) = mpsc::channel(1);
        let snapshot = Arc::clone(&snapshot);
        workers.push(tokio::spawn(async move {
            let slice = &snapshot[range];
            let partial_result = Money::checked_sum(slice.iter().map(|p| p.amount))
                .ok_or(AggregateError::SumOverflow { partition: index })?;
            let event = Progress { part_size: slice.len(), partial_result };
            if tx.send(event).await.is_err() {
                tracing::debug!(window = index, "aggregator.progress.dropped");
            }
            Ok::<(), AggregateError>(())
        }));
        sources.push(rx);
    }

    let merged = fan_in::merge(sources, config.channel_capacity);
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    tokio::spawn(forward(merged, workers, tx));
    rx
}

/// Relay merged events as `Ok`, then join the window workers and report the
/// first failure, if any.
async fn forward(
    mut merged: mpsc::Receiver<Progress>,
    workers: Vec<Worker>,
    tx: mpsc::Sender<Result<Progress, AggregateError>>,
) {
    while let Some(event) = merged.recv().await {
        if tx.send(Ok(event)).await.is_err() {
            tracing::debug!("aggregator.progress.consumer_gone");
            return;
        }
    }
    match join_workers(workers).await {
        Ok(()) => tracing::debug!("aggregator.progress.finished"),
        Err(e) => {
            if tx.send(Err(e)).await.is_err() {
                tracing::debug!("aggregator.progress.consumer_gone");
            }
        }
    }
}
