//! Per-instrument serialization.
//!
//! Settlement is read-then-write against the holding, so two settlements on
//! the same instrument must not interleave. Each instrument name maps to its
//! own async mutex; different instruments never contend with each other.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct InstrumentLocks {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InstrumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `name`. Released when the guard drops.
    pub async fn lock(&self, name: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().await;
            // Only the map holds an idle slot; anything else is a holder or waiter.
            slots.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(slots.entry(name.to_string()).or_default())
        };
        slot.lock_owned().await
    }

    /// Number of instruments with a live slot (held or awaited).
    pub async fn active(&self) -> usize {
        self.slots
            .lock()
            .await
            .values()
            .filter(|m| Arc::strong_count(m) > 1)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_name_waits_for_release() {
        let locks = Arc::new(InstrumentLocks::new());
        let guard = locks.lock("INFY").await;

        let l2 = Arc::clone(&locks);
        let waiter = tokio::spawn(async move {
            let _g = l2.lock("INFY").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished(), "second lock on INFY must wait");

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should acquire after release")
            .unwrap();
    }

    #[tokio::test]
    async fn different_names_do_not_contend() {
        let locks = InstrumentLocks::new();
        let _a = locks.lock("INFY").await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.lock("TCS")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn idle_slots_are_pruned() {
        let locks = InstrumentLocks::new();
        drop(locks.lock("INFY").await);
        drop(locks.lock("TCS").await);
        let _g = locks.lock("ITC").await;
        assert_eq!(locks.active().await, 1);
        assert_eq!(locks.slots.lock().await.len(), 1);
    }
}
