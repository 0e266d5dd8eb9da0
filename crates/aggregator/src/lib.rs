// Rust guideline compliant 2026-10-14

//! Concurrent payment-aggregation engine.
//!
//! Every operation snapshots the payment log through the `domain::PaymentSource`
//! port, partitions it by position, runs one tokio task per partition, and
//! merges the partial results behind a single lock (or, for the progress
//! stream, through a fan-in channel).
//!
//! Entry points: [`sum_payments`], [`filter_payments`],
//! [`filter_payments_by_predicate`], [`sum_payments_with_progress`].
//! Building blocks: [`partition`], [`windows`], [`fan_in::merge`].

pub mod fan_in;
mod filter;
mod partition;
mod progress;
mod sum;

#[cfg(test)]
mod testing;

use std::any::Any;

use domain::LedgerError;
use tokio::task::{JoinError, JoinHandle};

pub use filter::{filter_payments, filter_payments_by_predicate};
pub use partition::{MAX_WORKERS, partition};
pub use progress::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_WINDOW_SIZE, ProgressConfig, ProgressConfigBuilder,
    sum_payments_with_progress, windows,
};
pub use sum::sum_payments;

// ---------------------------------------------------------------------------
// AggregateError
// ---------------------------------------------------------------------------

/// Errors returned by the aggregation engine.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// The supplied configuration is invalid.
    #[error("invalid aggregator configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// A ledger lookup failed before any worker was started.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },
    /// A partition worker panicked or was aborted.
    #[error("worker for partition {partition} failed: {reason}")]
    WorkerFailed {
        /// Index of the failing partition.
        partition: usize,
        /// Panic message, when one could be recovered.
        reason: String,
    },
    /// A partial or merged sum does not fit in [`domain::Money`].
    #[error("sum overflow in partition {partition}")]
    SumOverflow {
        /// Index of the partition whose addition overflowed.
        partition: usize,
    },
}

/// Refuse worker counts above [`MAX_WORKERS`] before any snapshot is taken.
pub(crate) fn check_workers(workers: usize) -> Result<(), AggregateError> {
    if workers > MAX_WORKERS {
        return Err(AggregateError::InvalidConfig {
            reason: format!("workers must be <= {MAX_WORKERS}, got {workers}"),
        });
    }
    Ok(())
}

/// Join handle of one partition worker.
pub(crate) type Worker = JoinHandle<Result<(), AggregateError>>;

// ---------------------------------------------------------------------------
// Worker join barrier
// ---------------------------------------------------------------------------

/// Await every partition worker, then report the lowest-indexed failure.
///
/// A worker fails by returning an error or by panicking. All handles are
/// awaited even after a failure, so no worker is left running when this
/// returns.
pub(crate) async fn join_workers(handles: Vec<Worker>) -> Result<(), AggregateError> {
    let mut first_failure = None;
    for (partition, handle) in handles.into_iter().enumerate() {
        let failure = match handle.await {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e,
            Err(e) => AggregateError::WorkerFailed { partition, reason: describe(e) },
        };
        tracing::warn!(partition, error = %failure, "aggregator.worker.failed");
        first_failure.get_or_insert(failure);
    }
    first_failure.map_or(Ok(()), Err)
}

/// Recover a readable message from a failed task.
fn describe(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => panic_message(payload.as_ref()),
        Err(err) => err.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
