//! Per-checklist serialization of item reconciliation.
//!
//! Reconciliation reads the existing item ids and then writes, with nothing
//! tying the two together. When enabled, callers hold the checklist's lock
//! for the whole call so two reconciliations of the same checklist cannot
//! interleave. Different checklists never contend.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct ChecklistLocks {
    /// Entries are weak so a checklist nobody is reconciling costs nothing.
    locks: Mutex<HashMap<String, Weak<Mutex<()>>>>,
}

impl ChecklistLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `checklist_id`. Released on drop.
    pub async fn acquire(&self, checklist_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, weak| weak.strong_count() > 0);

            match locks.get(checklist_id).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(Mutex::new(()));
                    locks.insert(checklist_id.to_string(), Arc::downgrade(&lock));
                    lock
                }
            }
        };

        lock.lock_owned().await
    }

    /// Number of checklists with a live lock.
    pub async fn active(&self) -> usize {
        self.locks
            .lock()
            .await
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}
