//! Snapshot cache storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use super::model::{CacheKey, CacheStatus};
use crate::Result;
use crate::verdict::{EmailVerdict, Snapshot};

/// Repository for the persisted snapshot.
///
/// Values are stored as text in a single flat table keyed by [`CacheKey`].
/// A snapshot is always written in one transaction, so readers observe
/// either the previous snapshot or the new one, never a mix.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    pool: SqlitePool,
}

impl SnapshotStore {
    /// Create a new store with the given database path.
    ///
    /// Creates the database and table if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replace the cached snapshot and mark the server online.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database transaction fails.
    /// On error nothing is written.
    pub async fn replace_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let entries = [
            (CacheKey::FlaggedEmails, serde_json::to_string(&snapshot.emails)?),
            (CacheKey::LastUpdate, snapshot.fetched_at.to_rfc3339()),
            (CacheKey::TotalCount, snapshot.total_count.to_string()),
            (CacheKey::TotalEmails, snapshot.total_emails.to_string()),
            (CacheKey::ServerOnline, true.to_string()),
        ];

        let mut tx = self.pool.begin().await?;
        for (key, value) in &entries {
            sqlx::query(
                r"
                INSERT INTO cache_entries (key, value) VALUES (?, ?)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                ",
            )
            .bind(key.as_str())
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!(
            emails = snapshot.emails.len(),
            total_count = snapshot.total_count,
            "Snapshot replaced"
        );
        Ok(())
    }

    /// Mark the server offline, leaving any cached snapshot untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn mark_offline(&self) -> Result<()> {
        self.set(CacheKey::ServerOnline, &false.to_string()).await
    }

    /// Load the cached snapshot, if one has ever been stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the stored email list
    /// cannot be decoded.
    pub async fn load_snapshot(&self) -> Result<Option<Snapshot>> {
        let Some(emails) = self.get(CacheKey::FlaggedEmails).await? else {
            return Ok(None);
        };
        let emails: Vec<EmailVerdict> = serde_json::from_str(&emails)?;
        let status = self.read_scalars().await?;

        Ok(Some(Snapshot {
            total_count: status.total_count.unwrap_or(emails.len() as u64),
            emails,
            fetched_at: status.last_update.unwrap_or_default(),
            total_emails: status.total_emails,
            online: status.server_online,
        }))
    }

    /// Read every key, with defaults for those that are missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the stored email list
    /// cannot be decoded.
    pub async fn status(&self) -> Result<CacheStatus> {
        let mut status = self.read_scalars().await?;
        if let Some(emails) = self.get(CacheKey::FlaggedEmails).await? {
            status.emails = serde_json::from_str(&emails)?;
        }
        Ok(status)
    }

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn clear(&self) -> Result<()> {
        sqlx::query(r"DELETE FROM cache_entries")
            .execute(&self.pool)
            .await?;
        debug!("Cache cleared");
        Ok(())
    }

    /// Number of keys currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn key_count(&self) -> Result<usize> {
        let row = sqlx::query(r"SELECT COUNT(*) as count FROM cache_entries")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.get("count");
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn read_scalars(&self) -> Result<CacheStatus> {
        let last_update = self
            .get(CacheKey::LastUpdate)
            .await?
            .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|ts| ts.with_timezone(&Utc));
        let total_count = self
            .get(CacheKey::TotalCount)
            .await?
            .and_then(|v| v.parse().ok());
        let total_emails = self
            .get(CacheKey::TotalEmails)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let server_online = self
            .get(CacheKey::ServerOnline)
            .await?
            .is_some_and(|v| v == "true");

        Ok(CacheStatus {
            emails: Vec::new(),
            last_update,
            total_count,
            total_emails,
            server_online,
        })
    }

    async fn get(&self, key: CacheKey) -> Result<Option<String>> {
        let row = sqlx::query(r"SELECT value FROM cache_entries WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("value")))
    }

    async fn set(&self, key: CacheKey, value: &str) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO cache_entries (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(key.as_str())
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
