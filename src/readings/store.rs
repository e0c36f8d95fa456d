//! Shared reading store
//!
//! Holds the most recently applied batch from the backend. Each batch is
//! tagged with the sequence number its request was issued under, and a batch
//! is only applied if it is newer than the one already held. A slow response
//! to an old request therefore cannot replace fresher data.

use tokio::sync::RwLock;

use super::series::ReadingSeries;
use super::types::Reading;

/// Outcome of offering a batch to the store
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// Batch replaced the stored series
    Applied {
        /// Whether the newest reading changed
        latest_changed: bool,
        /// Newest reading of this batch, read under the same lock
        latest: Option<Reading>,
    },
    /// A newer batch was already applied; this one was dropped
    Stale { applied_seq: u64 },
}

#[derive(Debug, Default)]
struct StoreInner {
    series: ReadingSeries,
    applied_seq: u64,
    /// Unix seconds when the last batch was applied
    applied_at: Option<i64>,
}

/// Thread-safe holder of the current reading series
#[derive(Debug, Default)]
pub struct ReadingStore {
    inner: RwLock<StoreInner>,
}

impl ReadingStore {
    /// Create an empty store bounded to `capacity` readings
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                series: ReadingSeries::with_capacity(capacity),
                applied_seq: 0,
                applied_at: None,
            }),
        }
    }

    /// Offer a batch fetched under request sequence `seq`
    pub async fn apply(&self, seq: u64, readings: Vec<Reading>) -> ApplyOutcome {
        let mut inner = self.inner.write().await;

        if seq <= inner.applied_seq {
            tracing::debug!(
                seq,
                applied_seq = inner.applied_seq,
                "Dropping stale readings batch"
            );
            return ApplyOutcome::Stale {
                applied_seq: inner.applied_seq,
            };
        }

        let previous_latest = inner.series.latest().map(|r| r.ts);
        inner.series.replace(readings);
        inner.applied_seq = seq;
        inner.applied_at = Some(chrono::Utc::now().timestamp());

        let latest = inner.series.latest().cloned();
        let latest_changed = latest.as_ref().map(|r| r.ts) != previous_latest;
        ApplyOutcome::Applied {
            latest_changed,
            latest,
        }
    }

    /// Clone of the current series
    pub async fn snapshot(&self) -> ReadingSeries {
        self.inner.read().await.series.clone()
    }

    /// Most recent reading
    pub async fn latest(&self) -> Option<Reading> {
        self.inner.read().await.series.latest().cloned()
    }

    /// Most recent reading and the sequence number of the batch it came from
    pub async fn latest_with_seq(&self) -> (Option<Reading>, u64) {
        let inner = self.inner.read().await;
        (inner.series.latest().cloned(), inner.applied_seq)
    }

    /// Sequence number of the applied batch (0 = nothing applied yet)
    pub async fn applied_seq(&self) -> u64 {
        self.inner.read().await.applied_seq
    }

    /// When the last batch was applied
    pub async fn applied_at(&self) -> Option<i64> {
        self.inner.read().await.applied_at
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.series.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readings::Metric;

    fn batch(latest_ts: i64) -> Vec<Reading> {
        (0..5)
            .map(|i| Reading::at(latest_ts - i * 10).with(Metric::Pm25, i as f64))
            .collect()
    }

    #[tokio::test]
    async fn test_apply_newer_batch() {
        let store = ReadingStore::new(100);
        assert!(store.is_empty().await);

        let outcome = store.apply(1, batch(100)).await;
        assert!(matches!(
            outcome,
            ApplyOutcome::Applied { latest_changed: true, latest: Some(ref r) } if r.ts == 100
        ));
        assert_eq!(store.latest().await.unwrap().ts, 100);
        assert_eq!(store.applied_seq().await, 1);
        assert!(store.applied_at().await.is_some());
    }

    #[tokio::test]
    async fn test_stale_response_does_not_overwrite() {
        let store = ReadingStore::new(100);

        // Request 2 answers first, then the slow request 1 arrives
        store.apply(2, batch(200)).await;
        let outcome = store.apply(1, batch(100)).await;

        assert_eq!(outcome, ApplyOutcome::Stale { applied_seq: 2 });
        assert_eq!(store.latest().await.unwrap().ts, 200);
    }

    #[tokio::test]
    async fn test_same_latest_reports_unchanged() {
        let store = ReadingStore::new(100);
        store.apply(1, batch(100)).await;
        let outcome = store.apply(2, batch(100)).await;
        assert!(matches!(outcome, ApplyOutcome::Applied { latest_changed: false, .. }));
    }

    #[tokio::test]
    async fn test_outcome_keeps_its_own_latest() {
        let store = ReadingStore::new(100);
        let first = store.apply(1, batch(100)).await;
        store.apply(2, batch(200)).await;

        // The first outcome still describes batch 1, not what the store holds now
        match first {
            ApplyOutcome::Applied { latest: Some(r), .. } => assert_eq!(r.ts, 100),
            other => panic!("Expected Applied, got {:?}", other),
        }
        assert_eq!(store.latest_with_seq().await.0.map(|r| r.ts), Some(200));
    }

    #[tokio::test]
    async fn test_latest_with_seq() {
        let store = ReadingStore::new(100);
        assert_eq!(store.latest_with_seq().await, (None, 0));

        store.apply(3, batch(300)).await;
        let (latest, seq) = store.latest_with_seq().await;
        assert_eq!(latest.map(|r| r.ts), Some(300));
        assert_eq!(seq, 3);
    }

    #[tokio::test]
    async fn test_snapshot_is_sorted_and_bounded() {
        let store = ReadingStore::new(3);
        store.apply(1, batch(100)).await;
        let snapshot = store.snapshot().await;
        let ts: Vec<i64> = snapshot.as_slice().iter().map(|r| r.ts).collect();
        assert_eq!(ts, vec![80, 90, 100]);
        assert_eq!(store.len().await, 3);
    }
}
