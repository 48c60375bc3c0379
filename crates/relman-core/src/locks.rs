//! Per-application command serialization
//!
//! Commands for the same application read a snapshot and write full tracks
//! back, so two interleaved commands would overwrite each other. [`AppLocks`]
//! hands out one async mutex per application id; commands for different
//! applications never wait on each other.

use crate::types::AppId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed async mutex over application ids
#[derive(Debug, Default)]
pub struct AppLocks {
    inner: DashMap<AppId, Arc<Mutex<()>>>,
}

impl AppLocks {
    /// Create empty lock table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `app_id`
    ///
    /// Released when the returned guard is dropped.
    pub async fn acquire(&self, app_id: &AppId) -> OwnedMutexGuard<()> {
        // Clone the Arc out so no map shard stays locked across the await.
        let lock = self
            .inner
            .entry(app_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        tracing::trace!(%app_id, "acquiring application lock");
        lock.lock_owned().await
    }

    /// Whether `app_id` is currently held
    #[must_use]
    pub fn is_locked(&self, app_id: &AppId) -> bool {
        self.inner
            .get(app_id)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Number of applications seen so far
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no application was ever locked
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn app(name: &str) -> AppId {
        AppId::new(name).unwrap()
    }

    #[tokio::test]
    async fn same_app_waits_for_release() {
        let locks = Arc::new(AppLocks::new());
        let guard = locks.acquire(&app("wallet")).await;
        assert!(locks.is_locked(&app("wallet")));

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(&app("wallet")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert!(!locks.is_locked(&app("wallet")));
    }

    #[tokio::test]
    async fn different_apps_do_not_block() {
        let locks = AppLocks::new();
        let _wallet = locks.acquire(&app("wallet")).await;
        let _maps = locks.acquire(&app("maps")).await;

        assert_eq!(locks.len(), 2);
        assert!(locks.is_locked(&app("maps")));
    }

    #[test]
    fn unseen_app_is_unlocked() {
        let locks = AppLocks::new();
        assert!(locks.is_empty());
        assert!(!locks.is_locked(&app("wallet")));
    }
}
