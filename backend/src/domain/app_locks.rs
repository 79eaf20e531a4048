//! Per-app mutual exclusion for publishing.
//!
//! Publishes against one app must not interleave: two overlapping requests
//! would read the same counter and pending set. The registry hands out one
//! async mutex per app id; publishes of different apps proceed in parallel.
//! An entry is dropped once no guard or waiter references it, so deleted apps
//! do not pin a mutex forever.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::AppId;

/// Registry of publish locks keyed by app id.
#[derive(Debug, Default)]
pub struct AppLocks {
    locks: Mutex<HashMap<AppId, Arc<AsyncMutex<()>>>>,
}

impl AppLocks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<AppId, Arc<AsyncMutex<()>>>> {
        // Every map update is a single insert or remove, so a poisoned guard
        // still holds a consistent map.
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_for(&self, app: AppId) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.registry().entry(app).or_default())
    }

    fn release(&self, app: AppId) {
        let mut locks = self.registry();
        if locks
            .get(&app)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&app);
        }
    }

    /// Wait for exclusive publish access to `app`.
    ///
    /// The guard releases the lock when dropped.
    pub async fn acquire(&self, app: AppId) -> AppLockGuard<'_> {
        let guard = self.lock_for(app).lock_owned().await;
        AppLockGuard {
            registry: self,
            app,
            guard: Some(guard),
        }
    }

    /// Number of apps with a held or awaited lock.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive publish access to one app.
#[derive(Debug)]
pub struct AppLockGuard<'a> {
    registry: &'a AppLocks,
    app: AppId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for AppLockGuard<'_> {
    fn drop(&mut self) {
        // Unlock first so the registry's reference is the last one left.
        drop(self.guard.take());
        self.registry.release(self.app);
    }
}
