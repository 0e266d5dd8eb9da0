// Rust guideline compliant 2026-10-14

//! Parallel summation of payment amounts.

use std::sync::Arc;

use domain::{Money, PaymentSource};
use tokio::sync::Mutex;

use crate::{AggregateError, check_workers, join_workers, partition};

/// Sum the amount of every payment using `workers` parallel tasks.
///
/// Takes one snapshot of `source`, splits it with [`partition`], and lets each
/// task add its partial sum into a shared total under a mutex. Failed payments
/// are counted like any other record. The result does not depend on `workers`.
///
/// # Errors
///
/// Returns [`AggregateError::InvalidConfig`] when `workers` exceeds
/// [`MAX_WORKERS`](crate::MAX_WORKERS), [`AggregateError::SumOverflow`] when
/// the total does not fit in [`Money`], or [`AggregateError::WorkerFailed`]
/// if a worker task fails.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub async fn sum_payments<S>(source: &S, workers: usize) -> Result<Money, AggregateError>
where
    S: PaymentSource + ?Sized,
{
    check_workers(workers)?;
    let snapshot = source.current_payments();
    let ranges = partition(snapshot.len(), workers);
    tracing::debug!(records = snapshot.len(), partitions = ranges.len(), "aggregator.sum.started");

    let total = Arc::new(Mutex::new(Money::ZERO));
    let handles = ranges
        .into_iter()
        .enumerate()
        .map(|(partition, range)| {
            let snapshot = Arc::clone(&snapshot);
            let total = Arc::clone(&total);
            tokio::spawn(async move {
                let overflow = || AggregateError::SumOverflow { partition };
                let partial = Money::checked_sum(snapshot[range].iter().map(|p| p.amount))
                    .ok_or_else(overflow)?;
                let mut total = total.lock().await;
                *total = total.checked_add(partial).ok_or_else(overflow)?;
                Ok::<(), AggregateError>(())
            })
        })
        .collect();
    join_workers(handles).await?;

    let total = *total.lock().await;
    tracing::debug!(%total, "aggregator.sum.finished");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::sum_payments;
    use crate::testing::VecSource;
    use crate::{AggregateError, MAX_WORKERS};
    use domain::Money;

    fn amounts(n: i64) -> Vec<i64> {
        (1..=n).map(|i| i * 7 % 1_000 + 1).collect()
    }

    // SM-T01: sum is independent of the worker count.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn matches_sequential_sum() {
        let source = VecSource::with_amounts(3, &amounts(1_001));
        let expected = source.sequential_sum();
        let total = source.payments.len();
        for workers in [0, 1, 2, 3, 16, total, total + 5] {
            assert_eq!(
                sum_payments(&source, workers).await.unwrap(),
                expected,
                "workers={workers}"
            );
        }
    }

    // SM-T02: empty log sums to zero.
    #[tokio::test]
    async fn empty_log_is_zero() {
        let source = VecSource::with_amounts(1, &[]);
        assert_eq!(sum_payments(&source, 4).await.unwrap(), Money::ZERO);
    }

    // SM-T03: one snapshot per call.
    #[tokio::test]
    async fn single_snapshot_per_call() {
        let source = VecSource::with_amounts(1, &[5, 6, 7]);
        sum_payments(&source, 2).await.unwrap();
        assert_eq!(source.snapshot_count(), 1);
    }

    // SM-T04: a partition whose sum overflows is reported, not wrapped or panicked.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn partial_overflow_reported() {
        let source = VecSource::with_amounts(1, &[i64::MAX, 1, 5, 5]);
        let result = sum_payments(&source, 2).await;
        assert!(
            matches!(result, Err(AggregateError::SumOverflow { partition: 0 })),
            "got {result:?}"
        );
    }

    // SM-T05: partial sums that fit but overflow once merged are reported too.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn merged_overflow_reported() {
        let half = i64::MAX / 2 + 1;
        let source = VecSource::with_amounts(1, &[half, half]);
        let result = sum_payments(&source, 2).await;
        assert!(matches!(result, Err(AggregateError::SumOverflow { .. })), "got {result:?}");
    }

    // SM-T06: worker counts above the cap are refused before the snapshot; the cap itself works.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn worker_cap() {
        let source = VecSource::with_amounts(2, &amounts(50));
        let result = sum_payments(&source, usize::MAX).await;
        assert!(matches!(result, Err(AggregateError::InvalidConfig { .. })), "got {result:?}");
        assert_eq!(source.snapshot_count(), 0);

        let total = sum_payments(&source, MAX_WORKERS).await.unwrap();
        assert_eq!(total, source.sequential_sum());
    }
}
