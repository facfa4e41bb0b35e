//! Consumer-side watch handle.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::discovery::service_set::ServiceSet;
use crate::registry::{RegistryError, ServiceInstance, Watcher};

/// A [`Watcher`] backed by a [`ServiceSet`] slot.
///
/// Holds a capacity-1 pending-notification slot, its own cancellation scope,
/// and a non-owning back-reference to the set, used only to deregister
/// itself on stop.
pub struct ServiceWatcher {
    set: Arc<ServiceSet>,
    id: u64,
    slot: Mutex<mpsc::Receiver<()>>,
    scope: CancellationToken,
}

impl ServiceWatcher {
    /// Create a watcher registered with the set. When the set already holds
    /// a snapshot, the first `next()` call returns immediately with it
    /// instead of blocking until the next membership change.
    pub(crate) fn new(set: Arc<ServiceSet>) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // Join the watcher map before sampling the snapshot: a broadcast
        // landing in between arms the slot itself, so no update is lost in
        // the gap.
        let id = set.add_watcher(tx.clone());
        if !set.snapshot().is_empty() {
            let _ = tx.try_send(());
        }
        Self {
            set,
            id,
            slot: Mutex::new(rx),
            scope: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl Watcher for ServiceWatcher {
    async fn next(&self) -> Result<Vec<ServiceInstance>, RegistryError> {
        if self.scope.is_cancelled() {
            return Err(RegistryError::WatchStopped);
        }
        let mut slot = tokio::select! {
            guard = self.slot.lock() => guard,
            _ = self.scope.cancelled() => return Err(RegistryError::WatchStopped),
        };
        tokio::select! {
            event = slot.recv() => match event {
                // Snapshot is read at wake time, not captured at broadcast.
                Some(()) => Ok(self.set.snapshot().as_ref().clone()),
                None => Err(RegistryError::WatchStopped),
            },
            _ = self.scope.cancelled() => Err(RegistryError::WatchStopped),
        }
    }

    fn stop(&self) {
        if self.scope.is_cancelled() {
            return;
        }
        self.scope.cancel();
        self.set.remove_watcher(self.id);
    }
}

impl Drop for ServiceWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn instance(id: &str) -> ServiceInstance {
        ServiceInstance {
            id: id.into(),
            name: "orders".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_watcher_on_populated_set_is_armed_at_creation() {
        let set = Arc::new(ServiceSet::new("orders".into()));
        set.broadcast(vec![instance("a")]);

        // No broadcast after creation; the arm must come from the cached
        // snapshot alone.
        let watcher = ServiceWatcher::new(set);
        let snapshot = tokio::time::timeout(Duration::from_millis(100), watcher.next())
            .await
            .expect("first next() should not block")
            .unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_after_creation_wakes_unarmed_watcher() {
        let set = Arc::new(ServiceSet::new("orders".into()));
        let watcher = ServiceWatcher::new(set.clone());

        set.broadcast(vec![instance("a"), instance("b")]);
        let snapshot = tokio::time::timeout(Duration::from_millis(100), watcher.next())
            .await
            .expect("broadcast should arm the slot")
            .unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_arm_and_broadcast_coalesce() {
        let set = Arc::new(ServiceSet::new("orders".into()));
        set.broadcast(vec![instance("a")]);

        // Snapshot arm plus a racing broadcast still leaves at most one
        // pending event, carrying the latest list.
        let watcher = ServiceWatcher::new(set.clone());
        set.broadcast(vec![instance("a"), instance("b")]);

        let snapshot = watcher.next().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        let second = tokio::time::timeout(Duration::from_millis(100), watcher.next()).await;
        assert!(second.is_err(), "no second pending event");
    }
}
