//! Per-box mutual exclusion.
//!
//! Every service operation on a box runs inside that box's lock, so a
//! settle-then-act sequence never interleaves with another command from
//! the same user.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use jellybox_types::BoxKey;

/// Idle locks are swept once the table grows past this size.
const SWEEP_THRESHOLD: usize = 1024;

/// A table of async mutexes keyed by box.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    table: Mutex<HashMap<BoxKey, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    /// An empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    ///
    /// The returned guard releases the lock when dropped.
    pub async fn acquire(&self, key: &BoxKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.table.lock().await;
            if table.len() >= SWEEP_THRESHOLD {
                // Only the table holds a reference to an idle lock.
                table.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(table.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of keys currently tracked.
    pub async fn tracked(&self) -> usize {
        self.table.lock().await.len()
    }
}
