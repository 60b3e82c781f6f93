//! Per-user serialization for the async evaluation path: concurrent
//! transactions from the same user must apply their fraud events in
//! event-log sequence order, while different users stay fully parallel.

use dashmap::DashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Sharded lock keyed by a hash of the user id, not the id itself — bounds
/// memory and contention to `stripe_count` regardless of how many distinct
/// users are active.
pub struct StripeLock {
    stripes: DashMap<usize, Arc<Mutex<()>>>,
    stripe_count: usize,
}

impl StripeLock {
    pub fn new(stripe_count: usize) -> Self {
        Self {
            stripes: DashMap::new(),
            stripe_count: stripe_count.max(1),
        }
    }

    fn stripe_index(&self, user_id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        user_id.hash(&mut hasher);
        (hasher.finish() as usize) % self.stripe_count
    }

    /// Acquire the stripe guarding `user_id`. Held across the evaluation
    /// steps that read-modify-write the user's profile, so the guard should
    /// be dropped as soon as those steps finish.
    pub async fn lock(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let index = self.stripe_index(user_id);
        let mutex = self
            .stripes
            .entry(index)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_user_maps_to_same_stripe() {
        let lock = StripeLock::new(256);
        assert_eq!(lock.stripe_index("user-1"), lock.stripe_index("user-1"));
    }

    #[tokio::test]
    async fn lock_is_exclusive_per_stripe() {
        let lock = Arc::new(StripeLock::new(4));
        let guard = lock.lock("user-1").await;
        let lock2 = lock.clone();
        let handle = tokio::spawn(async move {
            let _guard = lock2.lock("user-1").await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!handle.is_finished());
        drop(guard);
        handle.await.unwrap();
    }
}
