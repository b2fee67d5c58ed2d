use super::entry::CatalogEntry;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Holds the active catalog snapshot.
///
/// Readers load an `Arc` to a complete snapshot; `replace` swaps the pointer, so a reader
/// sees either the old list or the new one.
pub struct CatalogStore {
    snapshot: ArcSwap<Vec<CatalogEntry>>,
    refreshed_at: Mutex<Option<DateTime<Utc>>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Vec::new()),
            refreshed_at: Mutex::new(None),
        }
    }

    /// Swaps in a new snapshot, keeping only valid entries. Returns the number kept.
    pub fn replace(&self, entries: Vec<CatalogEntry>) -> usize {
        let valid: Vec<CatalogEntry> = entries.into_iter().filter(|e| e.is_valid()).collect();
        let count = valid.len();
        self.snapshot.store(Arc::new(valid));
        *self.refreshed_at.lock() = Some(Utc::now());
        debug!("Catalog snapshot replaced with {} entries", count);
        count
    }

    pub fn find_by_id(&self, id: &str) -> Option<CatalogEntry> {
        self.snapshot.load().iter().find(|e| e.id() == id).cloned()
    }

    pub fn all(&self) -> Arc<Vec<CatalogEntry>> {
        self.snapshot.load_full()
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// When the last successful refresh landed, if any.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        *self.refreshed_at.lock()
    }
}
