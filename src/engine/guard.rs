// ============================================================================
// Matching Guard
// Mutual exclusion for book mutations, global or per pair
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::{LockGranularity, Pair};

/// Held for the duration of one matching, cancel or recovery step
pub type PairLock = OwnedMutexGuard<()>;

/// Serializes every mutation of a pair's book.
///
/// With `Global` granularity one lock covers every pair. With `PerPair`
/// each pair gets its own lock on first use; passes on different pairs run
/// concurrently while passes on the same pair stay totally ordered.
pub struct MatchingGuard {
    granularity: LockGranularity,
    global: Arc<AsyncMutex<()>>,
    pairs: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl MatchingGuard {
    pub fn new(granularity: LockGranularity) -> Self {
        Self {
            granularity,
            global: Arc::new(AsyncMutex::new(())),
            pairs: Mutex::new(HashMap::new()),
        }
    }

    pub fn granularity(&self) -> LockGranularity {
        self.granularity
    }

    fn lock_for(&self, pair: &Pair) -> Arc<AsyncMutex<()>> {
        match self.granularity {
            LockGranularity::Global => Arc::clone(&self.global),
            LockGranularity::PerPair => {
                let mut pairs = self.pairs.lock();
                Arc::clone(pairs.entry(pair.code()).or_default())
            },
        }
    }

    /// Wait for exclusive access to `pair`'s book
    pub async fn acquire(&self, pair: &Pair) -> PairLock {
        let lock = self.lock_for(pair);
        let guard = lock.lock_owned().await;
        tracing::trace!(pair = %pair, granularity = ?self.granularity, "Matching guard acquired");
        guard
    }

    /// Wait until every pass that currently holds a lock has completed
    pub async fn drain(&self) {
        let locks: Vec<Arc<AsyncMutex<()>>> = match self.granularity {
            LockGranularity::Global => vec![Arc::clone(&self.global)],
            LockGranularity::PerPair => self.pairs.lock().values().cloned().collect(),
        };

        for lock in locks {
            drop(lock.lock().await);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_per_pair_locks_are_independent() {
        let guard = MatchingGuard::new(LockGranularity::PerPair);
        let weth = Pair::new("WETH", "DAI");
        let zrx = Pair::new("ZRX", "WETH");

        let _held = guard.acquire(&weth).await;

        // Another pair is not blocked
        assert!(timeout(Duration::from_millis(50), guard.acquire(&zrx)).await.is_ok());
        // The same pair is
        assert!(timeout(Duration::from_millis(50), guard.acquire(&weth)).await.is_err());
    }

    #[tokio::test]
    async fn test_global_lock_covers_all_pairs() {
        let guard = MatchingGuard::new(LockGranularity::Global);
        let _held = guard.acquire(&Pair::new("WETH", "DAI")).await;

        let zrx = Pair::new("ZRX", "WETH");
        let other = guard.acquire(&zrx);
        assert!(timeout(Duration::from_millis(50), other).await.is_err());
    }

    #[tokio::test]
    async fn test_drain_waits_for_holder() {
        let guard = Arc::new(MatchingGuard::new(LockGranularity::PerPair));
        let held = guard.acquire(&Pair::new("WETH", "DAI")).await;

        assert!(timeout(Duration::from_millis(50), guard.drain()).await.is_err());

        drop(held);
        assert!(timeout(Duration::from_millis(500), guard.drain()).await.is_ok());
    }
}
