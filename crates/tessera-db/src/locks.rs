//! Per-key write locks.
//!
//! Writers to the same pinned list or the same chart queue behind one
//! async mutex per key; writers to different keys proceed in parallel.
//! Slots are dropped from the table once nobody holds or waits on them.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Pinned-list writes, keyed by project (one list per project).
pub(crate) static PINNED_LISTS: LazyLock<KeyedLocks> = LazyLock::new(KeyedLocks::default);

/// Chart writes, keyed by chart id. Taken after [`PINNED_LISTS`] when a
/// writer needs both.
pub(crate) static CHARTS: LazyLock<KeyedLocks> = LazyLock::new(KeyedLocks::default);

#[derive(Default)]
pub(crate) struct KeyedLocks {
    slots: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    fn slot(&self, key: Uuid) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        slots.entry(key).or_default().clone()
    }

    pub(crate) async fn lock(&self, key: Uuid) -> OwnedMutexGuard<()> {
        self.slot(key).lock_owned().await
    }

    /// Lock every key, in ascending order so that two writers asking for
    /// overlapping sets cannot deadlock.
    pub(crate) async fn lock_all(
        &self,
        keys: impl IntoIterator<Item = Uuid>,
    ) -> Vec<OwnedMutexGuard<()>> {
        let mut keys: Vec<Uuid> = keys.into_iter().collect();
        keys.sort_unstable();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.lock(key).await);
        }
        guards
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn distinct_keys_do_not_block_each_other() {
        let locks = KeyedLocks::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let _held = locks.lock(a).await;
        assert!(timeout(SHORT, locks.lock(b)).await.is_ok());
        assert!(timeout(SHORT, locks.lock(a)).await.is_err());
    }

    #[tokio::test]
    async fn released_slots_are_pruned() {
        let locks = KeyedLocks::default();
        let a = Uuid::new_v4();

        drop(locks.lock(a).await);
        let _other = locks.lock(Uuid::new_v4()).await;
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn lock_all_tolerates_duplicates_and_any_order() {
        let locks = Arc::new(KeyedLocks::default());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let guards = locks.lock_all([b, a, b]).await;
        assert_eq!(guards.len(), 2);
        drop(guards);

        let first = tokio::spawn({
            let locks = locks.clone();
            async move {
                for _ in 0..50 {
                    drop(locks.lock_all([a, b]).await);
                }
            }
        });
        let second = tokio::spawn({
            let locks = locks.clone();
            async move {
                for _ in 0..50 {
                    drop(locks.lock_all([b, a]).await);
                }
            }
        });
        timeout(Duration::from_secs(5), async {
            first.await.unwrap();
            second.await.unwrap();
        })
        .await
        .unwrap();
    }
}
