use super::store::AliasStore;
use super::AliasMap;
use crate::config::LibsqlConfig;
use crate::constants::ALIASES_DOCUMENT_ID;
use crate::error::{Result, StickerError};
use async_trait::async_trait;
use libsql::{Builder, Connection, Database};
use tracing::info;

/// Alias document stored in a remote Turso/libSQL database.
pub struct LibsqlAliasStore {
    db: Database,
    url: String,
}

impl LibsqlAliasStore {
    /// Connects to Turso and makes sure the document table exists.
    pub async fn connect(config: &LibsqlConfig) -> Result<Self> {
        info!("Connecting to Turso database at {}", config.url);

        let db = Builder::new_remote(config.url.clone(), config.auth_token.clone())
            .build()
            .await
            .map_err(|e| StickerError::Database {
                message: format!("Failed to connect to database: {e}"),
            })?;

        let store = Self {
            db,
            url: config.url.clone(),
        };
        store.run_migrations().await?;
        Ok(store)
    }

    fn get_connection(&self) -> Result<Connection> {
        self.db.connect().map_err(|e| StickerError::Database {
            message: format!("Failed to get database connection: {e}"),
        })
    }

    async fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                id          TEXT PRIMARY KEY,
                body        TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );",
        )
        .await
        .map_err(|e| StickerError::Database {
            message: format!("Failed to run migrations: {e}"),
        })?;
        Ok(())
    }
}

#[async_trait]
impl AliasStore for LibsqlAliasStore {
    fn describe(&self) -> String {
        format!("libsql:{}", self.url)
    }

    async fn load(&self) -> Result<Option<AliasMap>> {
        let conn = self.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT body FROM documents WHERE id = ?",
                libsql::params![ALIASES_DOCUMENT_ID],
            )
            .await
            .map_err(|e| StickerError::Database {
                message: format!("Failed to query aliases: {e}"),
            })?;

        let Some(row) = rows.next().await.map_err(|e| StickerError::Database {
            message: format!("Failed to read row: {e}"),
        })?
        else {
            return Ok(None);
        };

        let body: String = row.get(0).map_err(|e| StickerError::Database {
            message: format!("Failed to get body: {e}"),
        })?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn save(&self, aliases: &AliasMap) -> Result<()> {
        let body = serde_json::to_string(aliases)?;
        let conn = self.get_connection()?;

        // INSERT OR REPLACE keeps one row per document id
        conn.execute(
            "INSERT OR REPLACE INTO documents (id, body, updated_at) VALUES (?, ?, datetime('now'))",
            libsql::params![ALIASES_DOCUMENT_ID, body],
        )
        .await
        .map_err(|e| StickerError::Database {
            message: format!("Failed to upsert aliases: {e}"),
        })?;

        Ok(())
    }
}
