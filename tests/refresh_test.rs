use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stickerbot::aliases::{AliasMap, AliasTable};
use stickerbot::catalog::{CatalogStore, StickerRecord};
use stickerbot::error::Result;
use stickerbot::refresh::{RefreshOutcome, RefreshScheduler, RefreshState};
use stickerbot::resolver::{MatchKind, Resolver};
use stickerbot::types::CatalogSource;
use tokio::sync::Notify;

fn record(id: &str, name: &str) -> StickerRecord {
    StickerRecord {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

fn swarm_catalog() -> Vec<StickerRecord> {
    vec![
        record("4f4a7c3ce4b0f1a2b3c4d5e6", "Explorer"),
        record("5a1b2c3d4e5f60718293a4b5", "Swarm Pin"),
    ]
}

/// Blocks inside `fetch` until released.
struct GatedSource {
    started: Notify,
    release: Notify,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl CatalogSource for GatedSource {
    async fn fetch(&self) -> Result<Vec<StickerRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(swarm_catalog())
    }
}

struct CountingSource {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl CatalogSource for CountingSource {
    async fn fetch(&self) -> Result<Vec<StickerRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(swarm_catalog())
    }
}

#[tokio::test]
async fn trigger_during_fetch_is_dropped() {
    let catalog = Arc::new(CatalogStore::new());
    let source = Arc::new(GatedSource {
        started: Notify::new(),
        release: Notify::new(),
        calls: AtomicUsize::new(0),
    });
    let scheduler = Arc::new(RefreshScheduler::new(
        catalog.clone(),
        source.clone(),
        Duration::from_secs(3600),
    ));

    let first = scheduler.refresh();
    let overlapping = async {
        source.started.notified().await;
        assert_eq!(scheduler.state(), RefreshState::Fetching);
        let outcome = scheduler.refresh().await;
        source.release.notify_one();
        outcome
    };
    let (first, overlapping) = tokio::join!(first, overlapping);

    assert_eq!(first, RefreshOutcome::Replaced { entries: 2, dropped: 0 });
    assert_eq!(overlapping, RefreshOutcome::Skipped);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.state(), RefreshState::Idle);
    assert_eq!(catalog.len(), 2);
}

#[tokio::test]
async fn schedule_refreshes_at_startup_and_then_repeatedly() {
    let catalog = Arc::new(CatalogStore::new());
    let source = Arc::new(CountingSource {
        calls: AtomicUsize::new(0),
    });
    let scheduler = Arc::new(RefreshScheduler::new(
        catalog.clone(),
        source.clone(),
        Duration::from_millis(40),
    ));

    let task = scheduler.spawn();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(catalog.len(), 2);

    tokio::time::sleep(Duration::from_millis(150)).await;
    task.abort();
    assert!(source.calls.load(Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn alias_round_trip_through_the_resolver() {
    let catalog = Arc::new(CatalogStore::new());
    let scheduler = RefreshScheduler::new(
        catalog.clone(),
        Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        }),
        Duration::from_secs(3600),
    );
    scheduler.refresh().await;

    let aliases = Arc::new(AliasTable::in_memory(AliasMap::new()));
    let resolver = Resolver::new(catalog, aliases.clone());

    let before = resolver.resolve("pin").unwrap();
    assert!(matches!(before.kind, MatchKind::Fuzzy { .. }));

    aliases.add("5a1b2c3d4e5f60718293a4b5", "Pin");
    let aliased = resolver.resolve("pin").unwrap();
    assert_eq!(aliased.kind, MatchKind::Alias);
    assert_eq!(aliased.entry.name(), "Swarm Pin");

    assert!(aliases.remove("pin"));
    let after = resolver.resolve("pin").unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn aborting_the_schedule_cancels_the_running_fetch() {
    let catalog = Arc::new(CatalogStore::new());
    let source = Arc::new(GatedSource {
        started: Notify::new(),
        release: Notify::new(),
        calls: AtomicUsize::new(0),
    });
    let scheduler = Arc::new(RefreshScheduler::new(
        catalog.clone(),
        source.clone(),
        Duration::from_secs(3600),
    ));

    let task = scheduler.clone().spawn();
    source.started.notified().await;
    assert_eq!(scheduler.state(), RefreshState::Fetching);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(scheduler.state(), RefreshState::Idle);
    assert!(catalog.is_empty());
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}
