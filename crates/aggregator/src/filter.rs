// Rust guideline compliant 2026-10-14

//! Parallel filtering of the payment log.
//!
//! Both entry points return `Ok(None)` when nothing matched; an empty log and
//! a log with no matching payment look the same to the caller.

use std::sync::Arc;

use domain::{AccountId, Payment, PaymentSource};
use tokio::sync::Mutex;

use crate::{AggregateError, check_workers, join_workers, partition};

/// Collect copies of every payment made by `account_id`, using `workers` tasks.
///
/// The account is looked up once before any snapshot is taken or worker spawned.
/// The order of the returned payments is unspecified.
///
/// # Errors
///
/// Returns [`AggregateError::Ledger`] wrapping `LedgerError::AccountNotFound`
/// for an unknown account, [`AggregateError::InvalidConfig`] when `workers`
/// exceeds [`MAX_WORKERS`](crate::MAX_WORKERS), or
/// [`AggregateError::WorkerFailed`] if a worker fails.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub async fn filter_payments<S>(
    source: &S,
    account_id: AccountId,
    workers: usize,
) -> Result<Option<Vec<Payment>>, AggregateError>
where
    S: PaymentSource + ?Sized,
{
    source.find_account(account_id)?;
    filter_payments_by_predicate(source, move |p| p.account_id == account_id, workers).await
}

/// Collect copies of every payment for which `predicate` returns `true`.
///
/// Each worker filters its own partition into a private list and appends it to
/// the shared result under a mutex. The order of the returned payments is
/// unspecified. A panicking predicate fails only its own worker; the remaining
/// workers still run to completion before the failure is reported.
///
/// # Errors
///
/// Returns [`AggregateError::InvalidConfig`] when `workers` exceeds
/// [`MAX_WORKERS`](crate::MAX_WORKERS), or [`AggregateError::WorkerFailed`]
/// for the lowest-indexed partition whose worker failed.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub async fn filter_payments_by_predicate<S, F>(
    source: &S,
    predicate: F,
    workers: usize,
) -> Result<Option<Vec<Payment>>, AggregateError>
where
    S: PaymentSource + ?Sized,
    F: Fn(&Payment) -> bool + Send + Sync + 'static,
{
    check_workers(workers)?;
    let snapshot = source.current_payments();
    let ranges = partition(snapshot.len(), workers);
    tracing::debug!(records = snapshot.len(), partitions = ranges.len(), "aggregator.filter.started");

    let predicate = Arc::new(predicate);
    let merged = Arc::new(Mutex::new(Vec::new()));
    let handles = ranges
        .into_iter()
        .map(|range| {
            let snapshot = Arc::clone(&snapshot);
            let predicate = Arc::clone(&predicate);
            let merged = Arc::clone(&merged);
            tokio::spawn(async move {
                let local: Vec<Payment> = snapshot[range]
                    .iter()
                    .filter(|&p| predicate(p))
                    .cloned()
                    .collect();
                if !local.is_empty() {
                    merged.lock().await.extend(local);
                }
                Ok::<(), AggregateError>(())
            })
        })
        .collect();
    join_workers(handles).await?;

    let found = std::mem::take(&mut *merged.lock().await);
    tracing::debug!(matches = found.len(), "aggregator.filter.finished");
    Ok((!found.is_empty()).then_some(found))
}
