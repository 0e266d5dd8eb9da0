// Rust guideline compliant 2026-10-14

//! Fan-in of many producer channels into one consumer channel.

use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Merge every `sources` receiver into a single receiver.
///
/// One relay task per source forwards items as they arrive, so the merged
/// order follows arrival, not source order. A closer task owns the original
/// sender and drops it only after every relay has exited; the merged receiver
/// therefore returns `None` exactly when all sources are exhausted. With no
/// sources the merged receiver is closed immediately.
///
/// If the merged receiver is dropped, relays stop and drop their sources.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
#[must_use = "items are only relayed for a live receiver"]
pub fn merge<T>(sources: Vec<mpsc::Receiver<T>>, capacity: usize) -> mpsc::Receiver<T>
where
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let source_count = sources.len();

    let mut relays = JoinSet::new();
    for mut source in sources {
        let tx = tx.clone();
        relays.spawn(async move {
            while let Some(item) = source.recv().await {
                if tx.send(item).await.is_err() {
                    // Consumer gone; dropping `source` closes it for its producer.
                    break;
                }
            }
        });
    }

    tokio::spawn(async move {
        while let Some(result) = relays.join_next().await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "fan_in.relay.failed");
            }
        }
        drop(tx);
        tracing::debug!(sources = source_count, "fan_in.closed");
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::merge;
    use tokio::sync::mpsc;

    /// Spawn a producer that sends `items` on a fresh channel.
    fn producer(items: Vec<u32>) -> mpsc::Receiver<u32> {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            for item in items {
                if tx.send(item).await.is_err() {
                    return;
                }
            }
        });
        rx
    }

    // FI-T01: every item from every source arrives, then the stream ends.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn relays_everything_then_closes() {
        let sources = vec![
            producer((0..10).collect()),
            producer(vec![]),
            producer((100..150).collect()),
            producer(vec![999]),
        ];
        let mut merged = merge(sources, 4);

        let mut received = vec![];
        while let Some(item) = merged.recv().await {
            received.push(item);
        }
        received.sort_unstable();

        let mut expected: Vec<u32> = (0..10).chain(100..150).collect();
        expected.push(999);
        assert_eq!(received, expected);
        // Closed streams stay closed.
        assert_eq!(merged.recv().await, None);
    }

    // FI-T02: no sources closes immediately.
    #[tokio::test]
    async fn no_sources_closes_immediately() {
        let mut merged = merge::<u32>(vec![], 1);
        assert_eq!(merged.recv().await, None);
    }

    // FI-T03: the merged stream stays open while any source is still open.
    #[tokio::test]
    async fn waits_for_slowest_source() {
        let (slow_tx, slow_rx) = mpsc::channel(1);
        let mut merged = merge(vec![producer(vec![1]), slow_rx], 1);

        assert_eq!(merged.recv().await, Some(1));
        slow_tx.send(2).await.unwrap();
        assert_eq!(merged.recv().await, Some(2));
        drop(slow_tx);
        assert_eq!(merged.recv().await, None);
    }

    // FI-T04: dropping the merged receiver releases the producers.
    #[tokio::test]
    async fn dropped_consumer_closes_sources() {
        let (tx, rx) = mpsc::channel(1);
        let merged = merge(vec![rx], 1);
        drop(merged);

        let mut closed = false;
        for i in 0..100 {
            if tx.send(i).await.is_err() {
                closed = true;
                break;
            }
        }
        assert!(closed, "producer never observed the closed stream");
    }
}
