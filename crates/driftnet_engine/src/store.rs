use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use driftnet_core::{canonicalize, CanonicalLink, DeviceProfile, Item, Job};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store setup failed: {0}")]
    Setup(#[from] std::io::Error),
    #[error("corrupt store record: {0}")]
    Corrupt(String),
}

/// A random item pulled back out of the store for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledItem {
    pub title: String,
    pub link: CanonicalLink,
    pub content: Vec<u8>,
}

/// Narrow adapter over the persistent content store. Items live in a
/// partition per device profile; jobs are a single shared pool.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    async fn exists(
        &self,
        link: &CanonicalLink,
        profile: DeviceProfile,
    ) -> Result<bool, StoreError>;

    /// Insert an item; returns false when an item already holds the
    /// (link, profile) slot. Duplicate inserts are not errors.
    async fn put(&self, item: &Item, profile: DeviceProfile) -> Result<bool, StoreError>;

    async fn sample_random(
        &self,
        profile: DeviceProfile,
    ) -> Result<Option<SampledItem>, StoreError>;

    /// Snapshot of the current job pool, oldest first.
    async fn list_jobs(&self) -> Result<Vec<Job>, StoreError>;

    /// Insert a job; returns false when a job for the same link is
    /// already queued.
    async fn insert_job_if_absent(&self, job: &Job) -> Result<bool, StoreError>;

    async fn delete_job(
        &self,
        link: &CanonicalLink,
        submitted_by: &str,
    ) -> Result<(), StoreError>;
}

/// SQLite-backed store. Uniqueness of (link, profile) for items and of
/// link for jobs is enforced at the schema level, so racing writers
/// collapse to a single row instead of duplicating.
#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS items (
                link TEXT NOT NULL,
                profile TEXT NOT NULL,
                title TEXT NOT NULL,
                feed_source TEXT NOT NULL,
                submitted_by TEXT NOT NULL,
                content BLOB NOT NULL,
                UNIQUE (link, profile)
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS jobs (
                link TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                submitted_by TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl ContentStore for SqliteStore {
    async fn exists(
        &self,
        link: &CanonicalLink,
        profile: DeviceProfile,
    ) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM items WHERE link = ? AND profile = ? LIMIT 1")
            .bind(link.as_str())
            .bind(profile.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn put(&self, item: &Item, profile: DeviceProfile) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO items (link, profile, title, feed_source, submitted_by, content)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (link, profile) DO NOTHING",
        )
        .bind(item.link.as_str())
        .bind(profile.as_str())
        .bind(&item.metadata.title)
        .bind(&item.metadata.feed_source)
        .bind(&item.metadata.submitted_by)
        .bind(item.content.as_slice())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn sample_random(
        &self,
        profile: DeviceProfile,
    ) -> Result<Option<SampledItem>, StoreError> {
        let row = sqlx::query(
            "SELECT title, link, content FROM items WHERE profile = ? ORDER BY RANDOM() LIMIT 1",
        )
        .bind(profile.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let link: String = row.get("link");
        Ok(Some(SampledItem {
            title: row.get("title"),
            link: stored_link(&link)?,
            content: row.get("content"),
        }))
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query(
            "SELECT link, title, submitted_by, created_at FROM jobs ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut jobs = Vec::with_capacity(rows.len());
        for row in rows {
            let link: String = row.get("link");
            let created_at: String = row.get("created_at");
            jobs.push(Job {
                link: stored_link(&link)?,
                title: row.get("title"),
                submitted_by: row.get("submitted_by"),
                created_at: stored_timestamp(&created_at)?,
            });
        }
        Ok(jobs)
    }

    async fn insert_job_if_absent(&self, job: &Job) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO jobs (link, title, submitted_by, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (link) DO NOTHING",
        )
        .bind(job.link.as_str())
        .bind(&job.title)
        .bind(&job.submitted_by)
        .bind(job.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_job(
        &self,
        link: &CanonicalLink,
        submitted_by: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM jobs WHERE link = ? AND submitted_by = ?")
            .bind(link.as_str())
            .bind(submitted_by)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// Links are canonical on the way in; canonicalization is idempotent, so
// stored values round-trip through it unchanged.
fn stored_link(raw: &str) -> Result<CanonicalLink, StoreError> {
    canonicalize(raw).map_err(|err| StoreError::Corrupt(err.to_string()))
}

fn stored_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| StoreError::Corrupt(format!("bad created_at {raw:?}: {err}")))
}
