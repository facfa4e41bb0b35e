//! Discovery and watch fan-out integration tests.
//!
//! Run under a paused clock so long-poll windows and heartbeat ticks
//! fast-forward deterministically.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use svckit::discovery::{MemoryBackend, Registry, RegistryOptions};
use svckit::registry::{Discovery, Registrar, RegistryError, ServiceInstance};

fn instance(id: &str, name: &str, port: u16) -> ServiceInstance {
    ServiceInstance {
        id: id.into(),
        name: name.into(),
        version: "1.0.0".into(),
        metadata: Default::default(),
        endpoints: vec![format!("http://127.0.0.1:{port}")],
    }
}

fn ids(instances: &[ServiceInstance]) -> BTreeSet<String> {
    instances.iter().map(|i| i.id.clone()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_register_deregister_roundtrip() {
    let backend = Arc::new(MemoryBackend::new());
    let registry = Registry::new(backend.clone());

    let inst = instance("inst-1", "orders", 9000);
    registry.register(&inst).await.unwrap();
    assert_eq!(backend.service_ids("orders"), vec!["inst-1".to_string()]);

    registry.deregister(&inst).await.unwrap();
    assert!(backend.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_register_empty_id_rejected() {
    let registry = Registry::new(Arc::new(MemoryBackend::new()));
    let err = registry
        .register(&instance("", "orders", 9000))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidInstance(_)));
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_renews_until_deregistered() {
    let backend = Arc::new(MemoryBackend::new());
    let registry = Registry::with_options(
        backend.clone(),
        RegistryOptions {
            heartbeat: true,
            enable_health_check: true,
            health_check_interval: Duration::from_secs(10),
        },
    );

    let inst = instance("inst-1", "orders", 9000);
    registry.register(&inst).await.unwrap();

    // Settle pass at 1s, then renewals every 2x the interval.
    tokio::time::sleep(Duration::from_secs(45)).await;
    let passes = backend.ttl_passes("service:inst-1");
    assert!(passes >= 3, "expected at least 3 renewals, saw {passes}");

    registry.deregister(&inst).await.unwrap();
    let after_stop = backend.ttl_passes("service:inst-1");
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(
        backend.ttl_passes("service:inst-1"),
        after_stop,
        "renewals stop after deregister"
    );
}

#[tokio::test(start_paused = true)]
async fn test_get_service_returns_registered_instances() {
    let registry = Registry::new(Arc::new(MemoryBackend::new()));
    registry.register(&instance("inst-1", "orders", 9000)).await.unwrap();

    let services = registry.get_service("orders").await.unwrap();
    assert_eq!(ids(&services), BTreeSet::from(["inst-1".to_string()]));
    assert_eq!(services[0].version, "1.0.0");
    assert_eq!(services[0].endpoints, vec!["http://127.0.0.1:9000".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_watchers_observe_membership_changes() {
    let registry = Registry::new(Arc::new(MemoryBackend::new()));
    let w1 = registry.watch("orders").await.unwrap();
    let w2 = registry.watch("orders").await.unwrap();

    registry.register(&instance("inst-1", "orders", 9000)).await.unwrap();
    let s1 = w1.next().await.unwrap();
    let s2 = w2.next().await.unwrap();
    assert_eq!(ids(&s1), BTreeSet::from(["inst-1".to_string()]));
    assert_eq!(ids(&s1), ids(&s2), "watchers never diverge");

    registry.register(&instance("inst-2", "orders", 9001)).await.unwrap();
    let s1 = w1.next().await.unwrap();
    let s2 = w2.next().await.unwrap();
    assert_eq!(
        ids(&s1),
        BTreeSet::from(["inst-1".to_string(), "inst-2".to_string()])
    );
    assert_eq!(ids(&s1), ids(&s2));
}

#[tokio::test(start_paused = true)]
async fn test_late_watcher_pre_armed_with_cached_snapshot() {
    let registry = Registry::new(Arc::new(MemoryBackend::new()));
    let early = registry.watch("orders").await.unwrap();

    registry.register(&instance("inst-1", "orders", 9000)).await.unwrap();
    early.next().await.unwrap();

    // The set now holds a non-empty snapshot; a fresh watcher must not block
    // waiting for a new backend change.
    let late = registry.watch("orders").await.unwrap();
    let snapshot = tokio::time::timeout(Duration::from_secs(1), late.next())
        .await
        .expect("first next() should be immediate")
        .unwrap();
    assert_eq!(ids(&snapshot), BTreeSet::from(["inst-1".to_string()]));
}

#[tokio::test(start_paused = true)]
async fn test_undrained_updates_coalesce_to_latest_snapshot() {
    let registry = Registry::new(Arc::new(MemoryBackend::new()));
    let watcher = registry.watch("orders").await.unwrap();

    registry.register(&instance("inst-1", "orders", 9000)).await.unwrap();
    registry.register(&instance("inst-2", "orders", 9001)).await.unwrap();
    registry.register(&instance("inst-3", "orders", 9002)).await.unwrap();
    // Let the resolver chew through all changes while the slot stays full.
    tokio::time::sleep(Duration::from_secs(10)).await;

    let snapshot = watcher.next().await.unwrap();
    assert_eq!(
        ids(&snapshot),
        BTreeSet::from([
            "inst-1".to_string(),
            "inst-2".to_string(),
            "inst-3".to_string()
        ])
    );

    // Exactly one notification was pending; the next call blocks.
    let second = tokio::time::timeout(Duration::from_secs(1), watcher.next()).await;
    assert!(second.is_err(), "no second pending notification");
}

#[tokio::test(start_paused = true)]
async fn test_stop_unblocks_pending_next() {
    let registry = Registry::new(Arc::new(MemoryBackend::new()));
    let watcher = registry.watch("ghost").await.unwrap();

    let pending = tokio::spawn({
        let watcher = watcher.clone();
        async move { watcher.next().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!pending.is_finished());

    watcher.stop();
    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, RegistryError::WatchStopped));

    // Idempotent.
    watcher.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stopped_watcher_next_returns_stopped() {
    let registry = Registry::new(Arc::new(MemoryBackend::new()));
    let watcher = registry.watch("orders").await.unwrap();
    watcher.stop();
    let err = watcher.next().await.unwrap_err();
    assert!(matches!(err, RegistryError::WatchStopped));
}
