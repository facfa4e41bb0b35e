//! Per-service-name shared state.
//!
//! # Design Decisions
//! - Snapshot uses arc-swap: the resolver replaces it atomically, readers
//!   never take the watcher lock
//! - Watcher slots are capacity 1; a full slot means an undrained update,
//!   which the new snapshot supersedes (coalescing)

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use arc_swap::ArcSwap;
use tokio::sync::mpsc;

use crate::registry::ServiceInstance;

pub(crate) struct ServiceSet {
    pub(crate) service_name: String,
    snapshot: ArcSwap<Vec<ServiceInstance>>,
    watchers: Mutex<HashMap<u64, mpsc::Sender<()>>>,
    next_watcher_id: AtomicU64,
}

impl ServiceSet {
    pub(crate) fn new(service_name: String) -> Self {
        Self {
            service_name,
            snapshot: ArcSwap::from_pointee(Vec::new()),
            watchers: Mutex::new(HashMap::new()),
            next_watcher_id: AtomicU64::new(0),
        }
    }

    /// Latest known instance list.
    pub(crate) fn snapshot(&self) -> std::sync::Arc<Vec<ServiceInstance>> {
        self.snapshot.load_full()
    }

    /// Swap the snapshot, then arm every watcher slot that is not already
    /// armed. The store happens before any slot send, so a woken watcher
    /// always observes at least this snapshot.
    pub(crate) fn broadcast(&self, services: Vec<ServiceInstance>) {
        self.snapshot.store(std::sync::Arc::new(services));
        let watchers = self.watchers.lock().unwrap();
        for slot in watchers.values() {
            let _ = slot.try_send(());
        }
    }

    pub(crate) fn add_watcher(&self, slot: mpsc::Sender<()>) -> u64 {
        let id = self.next_watcher_id.fetch_add(1, Ordering::Relaxed);
        self.watchers.lock().unwrap().insert(id, slot);
        id
    }

    pub(crate) fn remove_watcher(&self, id: u64) {
        self.watchers.lock().unwrap().remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(id: &str) -> ServiceInstance {
        ServiceInstance {
            id: id.into(),
            name: "orders".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_broadcast_coalesces_into_one_pending_event() {
        let set = ServiceSet::new("orders".into());
        let (tx, mut rx) = mpsc::channel(1);
        set.add_watcher(tx);

        set.broadcast(vec![instance("a")]);
        set.broadcast(vec![instance("a"), instance("b")]);

        // One pending event, carrying the latest snapshot.
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        assert_eq!(set.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_removed_watcher_not_armed() {
        let set = ServiceSet::new("orders".into());
        let (tx, mut rx) = mpsc::channel(1);
        let id = set.add_watcher(tx);
        set.remove_watcher(id);

        set.broadcast(vec![instance("a")]);
        assert!(rx.try_recv().is_err());
    }
}
