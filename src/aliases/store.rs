use super::AliasMap;
use crate::constants::ALIASES_DOCUMENT_ID;
use crate::error::{Result, StickerError};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Durable home of the alias mapping, stored as one document that is replaced wholesale.
#[async_trait]
pub trait AliasStore: Send + Sync {
    /// Human-readable location for log lines.
    fn describe(&self) -> String;

    /// Reads the stored document; `None` when nothing was saved yet.
    async fn load(&self) -> Result<Option<AliasMap>>;

    /// Upserts the whole mapping under the fixed document id.
    async fn save(&self, aliases: &AliasMap) -> Result<()>;
}

/// In-memory store for development/testing
#[derive(Default)]
pub struct InMemoryAliasStore {
    document: Mutex<Option<AliasMap>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryAliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(aliases: AliasMap) -> Self {
        let store = Self::new();
        *store.document.lock() = Some(aliases);
        store
    }

    pub fn document(&self) -> Option<AliasMap> {
        self.document.lock().clone()
    }

    /// Number of successful saves.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every following `save` fail, to exercise the persistence-failure path.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AliasStore for InMemoryAliasStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn load(&self) -> Result<Option<AliasMap>> {
        Ok(self.document.lock().clone())
    }

    async fn save(&self, aliases: &AliasMap) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StickerError::Database {
                message: "in-memory store rejected the write".to_string(),
            });
        }
        *self.document.lock() = Some(aliases.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// SQLite-file store. The document table holds JSON bodies keyed by document id.
pub struct SqliteAliasStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl SqliteAliasStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS documents (
                id          TEXT PRIMARY KEY,
                body        TEXT NOT NULL,
                updated_at  INTEGER NOT NULL
            );
            "#,
        )?;
        info!("Opened alias store at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    fn read_document(conn: &Connection) -> Result<Option<String>> {
        let mut stmt = conn.prepare("SELECT body FROM documents WHERE id = ?1")?;
        let mut rows = stmt.query(params![ALIASES_DOCUMENT_ID])?;
        if let Some(row) = rows.next()? {
            let body: String = row.get(0)?;
            Ok(Some(body))
        } else {
            Ok(None)
        }
    }

    fn write_document(conn: &Connection, body: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO documents (id, body, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET body=excluded.body, updated_at=excluded.updated_at",
            params![ALIASES_DOCUMENT_ID, body, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }
}

fn join_error(e: tokio::task::JoinError) -> StickerError {
    StickerError::Database {
        message: format!("alias store task failed: {e}"),
    }
}

#[async_trait]
impl AliasStore for SqliteAliasStore {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }

    async fn load(&self) -> Result<Option<AliasMap>> {
        let conn = self.conn.clone();
        let body = tokio::task::spawn_blocking(move || Self::read_document(&conn.lock()))
            .await
            .map_err(join_error)??;
        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, aliases: &AliasMap) -> Result<()> {
        let body = serde_json::to_string(aliases)?;
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || Self::write_document(&conn.lock(), &body))
            .await
            .map_err(join_error)??;
        debug!("Saved {} alias groups to {}", aliases.len(), self.path.display());
        Ok(())
    }
}
