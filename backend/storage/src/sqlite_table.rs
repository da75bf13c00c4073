//! SQLite-backed results table for local deployments.
//!
//! One row per detection event, keyed like the cloud table by
//! `(partition_key, row_key)`. Rows are only ever inserted.

use std::path::Path;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use roachwatch_core::{DetectionEvent, ResultStore, WatchError};
use rusqlite::{Connection, params};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct SqliteResultStore {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteResultStore {
    /// Create or open a database at the given path.
    pub fn open(path: impl AsRef<Path>, table: &str) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).context("Failed to open SQLite results database")?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to enable WAL")?;
        let store = Self::with_connection(conn, table)?;
        info!(path = ?path.as_ref(), table = %table, "SqliteResultStore opened");
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory(table: &str) -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        Self::with_connection(conn, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            bail!("invalid results table name '{table}'");
        }
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" (
                 partition_key TEXT NOT NULL,
                 row_key       TEXT NOT NULL,
                 image_url     TEXT NOT NULL,
                 timestamp     TEXT NOT NULL,
                 predictions   TEXT NOT NULL,
                 PRIMARY KEY (partition_key, row_key)
             );"
        ))
        .context("Failed to initialize results schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
        })
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, event: &DetectionEvent) -> Result<(), WatchError> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT INTO \"{}\" (partition_key, row_key, image_url, timestamp, predictions)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                self.table
            ),
            params![
                event.partition_key,
                event.row_key.to_string(),
                event.image_url,
                event.timestamp_iso(),
                event.predictions,
            ],
        )
        .map_err(|e| WatchError::Table(format!("insert failed: {e}")))?;
        debug!(row_key = %event.row_key, "Inserted detection row");
        Ok(())
    }
}
