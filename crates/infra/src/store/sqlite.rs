//! SQLite-backed document store
//!
//! Documents are stored as JSON text in a single `documents` table keyed by
//! `(collection, key)`. Connections come from an r2d2 pool and all blocking
//! work runs on `spawn_blocking`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use profilesync_core::DocumentStore;
use profilesync_domain::{
    DocumentFields, ProfileSyncError, Result as DomainResult, StoreConfig, UserDocument,
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde_json::{Map, Value};
use tokio::task;
use tracing::{debug, info};

use super::clock::{Clock, SystemClock};
use crate::errors::InfraError;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    key        TEXT NOT NULL,
    body       TEXT NOT NULL,
    PRIMARY KEY (collection, key)
);
";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite implementation of `DocumentStore`
pub struct SqliteDocumentStore {
    pool: Pool<SqliteConnectionManager>,
    clock: Arc<dyn Clock>,
}

impl SqliteDocumentStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P, pool_size: u32) -> DomainResult<Self> {
        Self::open_with_clock(path, pool_size, Arc::new(SystemClock))
    }

    pub fn open_with_clock<P: AsRef<Path>>(
        path: P,
        pool_size: u32,
        clock: Arc<dyn Clock>,
    ) -> DomainResult<Self> {
        let path = path.as_ref();
        let manager =
            SqliteConnectionManager::file(path).with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));

        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .map_err(|err| ProfileSyncError::from(InfraError::from(err)))?;

        let store = Self { pool, clock };
        store.run_migrations()?;

        info!(db_path = %path.display(), pool_size = pool_size.max(1), "sqlite document store opened");
        Ok(store)
    }

    /// Open the store described by the `store` section of the configuration.
    pub fn from_config(config: &StoreConfig) -> DomainResult<Self> {
        let path = config.sqlite_path.as_deref().ok_or_else(|| {
            ProfileSyncError::Config("store.sqlite_path is required for sqlite backend".into())
        })?;
        Self::open(path, config.pool_size)
    }

    /// Ensure the `documents` table exists.
    pub fn run_migrations(&self) -> DomainResult<()> {
        let conn = self.pool.get().map_err(InfraError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(InfraError::from)?;
        Ok(())
    }

    /// Copy of the raw stored document.
    pub async fn raw(&self, collection: &str, key: &str) -> DomainResult<Option<Map<String, Value>>> {
        let pool = self.pool.clone();
        let collection = collection.to_string();
        let key = key.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<Map<String, Value>>> {
            let conn = pool.get().map_err(InfraError::from)?;
            load_body(&conn, &collection, &key)
        })
        .await
        .map_err(InfraError::from)?
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> DomainResult<Option<UserDocument>> {
        Ok(self.raw(collection, key).await?.map(UserDocument::from_json))
    }

    async fn set(&self, collection: &str, key: &str, fields: DocumentFields) -> DomainResult<()> {
        let pool = self.pool.clone();
        let clock = Arc::clone(&self.clock);
        let collection = collection.to_string();
        let key = key.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut conn = pool.get().map_err(InfraError::from)?;
            // Take the write lock up front: a deferred transaction that reads
            // first fails its lock upgrade with SQLITE_BUSY without waiting.
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(InfraError::from)?;

            let mut body = load_body(&tx, &collection, &key)?.unwrap_or_default();
            fields.apply_to(&mut body, clock.now());
            let encoded = serde_json::to_string(&body).map_err(InfraError::from)?;

            tx.execute(
                "INSERT INTO documents (collection, key, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT (collection, key) DO UPDATE SET body = excluded.body",
                params![&collection, &key, &encoded],
            )
            .map_err(InfraError::from)?;
            tx.commit().map_err(InfraError::from)?;

            debug!(collection = %collection, key = %key, fields = fields.len(), "document written");
            Ok(())
        })
        .await
        .map_err(InfraError::from)?
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn load_body(
    conn: &Connection,
    collection: &str,
    key: &str,
) -> DomainResult<Option<Map<String, Value>>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND key = ?2",
            params![collection, key],
            |row| row.get(0),
        )
        .optional()
        .map_err(InfraError::from)?;

    body.map(|text| -> DomainResult<Map<String, Value>> {
        match serde_json::from_str::<Value>(&text).map_err(InfraError::from)? {
            Value::Object(map) => Ok(map),
            other => Err(ProfileSyncError::Store(format!(
                "document {collection}/{key} is not a JSON object: {other}"
            ))),
        }
    })
    .transpose()
}
