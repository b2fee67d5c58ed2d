use super::{sanitize_alias, AliasMap, AliasStore};
use crate::metrics::AliasMetrics;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

enum WriteJob {
    Save(AliasMap),
    Flush(oneshot::Sender<()>),
}

/// The shared alias table.
///
/// Mutations take the write lock, change the map, and enqueue a full copy for the
/// background writer before releasing the lock, so saves reach the store in mutation order.
/// Callers never wait for the store.
pub struct AliasTable {
    map: RwLock<AliasMap>,
    writer: Option<mpsc::UnboundedSender<WriteJob>>,
}

impl AliasTable {
    /// A table that is never persisted.
    pub fn in_memory(initial: AliasMap) -> Self {
        Self {
            map: RwLock::new(initial),
            writer: None,
        }
    }

    /// A table that writes through to `store`. Must be called inside a tokio runtime.
    pub fn with_store(initial: AliasMap, store: Arc<dyn AliasStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(store, rx));
        Self {
            map: RwLock::new(initial),
            writer: Some(tx),
        }
    }

    /// Loads the saved document from `store`, starting empty when it is missing or unreadable.
    pub async fn load(store: Option<Arc<dyn AliasStore>>) -> Self {
        let Some(store) = store else {
            warn!("No alias store configured, aliases won't be persisted");
            return Self::in_memory(AliasMap::new());
        };

        let initial = match store.load().await {
            Ok(Some(map)) => {
                info!(store = %store.describe(), groups = map.len(), "Loaded aliases");
                map
            }
            Ok(None) => {
                info!(store = %store.describe(), "No saved aliases found");
                AliasMap::new()
            }
            Err(e) => {
                warn!(store = %store.describe(), error = %e, "Failed to load aliases, starting empty");
                AliasMap::new()
            }
        };
        Self::with_store(initial, store)
    }

    pub fn is_persistent(&self) -> bool {
        self.writer.is_some()
    }

    /// Adds an alias for `id`, moving it to the front if it is already there.
    /// Returns the alias as stored.
    pub fn add(&self, id: &str, raw_alias: &str) -> String {
        let alias = sanitize_alias(raw_alias);
        let mut map = self.map.write();
        let aliases = map.entry(id.to_string()).or_default();
        aliases.retain(|existing| existing != &alias);
        aliases.insert(0, alias.clone());
        debug!(id, alias = %alias, "Added alias");
        AliasMetrics::record_added();
        self.persist(&map);
        alias
    }

    /// Removes an alias from the first identifier that owns it. An identifier left without
    /// aliases is dropped from the table.
    pub fn remove(&self, raw_alias: &str) -> bool {
        let alias = sanitize_alias(raw_alias);
        let mut map = self.map.write();

        let Some((index, aliases)) = map
            .values_mut()
            .enumerate()
            .find(|(_, aliases)| aliases.contains(&alias))
        else {
            return false;
        };

        aliases.retain(|existing| existing != &alias);
        if aliases.is_empty() {
            map.shift_remove_index(index);
        }
        debug!(alias = %alias, "Removed alias");
        AliasMetrics::record_removed();
        self.persist(&map);
        true
    }

    pub fn aliases_for(&self, id: &str) -> Vec<String> {
        self.map.read().get(id).cloned().unwrap_or_default()
    }

    /// The first identifier whose aliases contain `alias`.
    pub fn reverse_lookup(&self, alias: &str) -> Option<String> {
        let alias = sanitize_alias(alias);
        self.map
            .read()
            .iter()
            .find(|(_, aliases)| aliases.contains(&alias))
            .map(|(id, _)| id.clone())
    }

    pub fn snapshot(&self) -> AliasMap {
        self.map.read().clone()
    }

    /// Resolves once every save enqueued before this call has been attempted.
    pub async fn flush(&self) {
        let Some(writer) = &self.writer else {
            return;
        };
        let (ack, done) = oneshot::channel();
        if writer.send(WriteJob::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    fn persist(&self, map: &AliasMap) {
        match &self.writer {
            Some(writer) => {
                if writer.send(WriteJob::Save(map.clone())).is_err() {
                    warn!("Alias writer has stopped, change kept in memory only");
                    AliasMetrics::record_persist_error();
                }
            }
            None => warn!("Aliases not getting persisted, no alias store configured"),
        }
    }
}

async fn run_writer(store: Arc<dyn AliasStore>, mut jobs: mpsc::UnboundedReceiver<WriteJob>) {
    while let Some(job) = jobs.recv().await {
        match job {
            WriteJob::Save(map) => match store.save(&map).await {
                Ok(()) => {
                    debug!(store = %store.describe(), groups = map.len(), "Persisted aliases");
                    AliasMetrics::record_persisted();
                }
                Err(e) => {
                    warn!(store = %store.describe(), error = %e, "Failed to persist aliases");
                    AliasMetrics::record_persist_error();
                }
            },
            WriteJob::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
