//! SQLite event store
//!
//! Events live in a single `events` table with the timestamp stored as
//! `YYYY-MM-DDTHH:MM:SS` text. Fixed-width text sorts the same as the
//! timestamps, so range filtering and grouping happen in SQL:
//!
//! ```text
//! SELECT strftime(<key format>, dt), SUM(value)
//! FROM events WHERE dt BETWEEN start AND end
//! GROUP BY 1 ORDER BY 1
//! ```
//!
//! The connection is opened once and shared; every query runs on the
//! blocking thread pool.

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::series::Granularity;
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::store::EventStore;
use crate::storage::types::{format_timestamp, BucketedSum, EventRecord, TimeRange};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        dt TEXT NOT NULL,
        value REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_events_dt ON events(dt);
";

const GROUPED_SUM_SQL: &str = "
    SELECT strftime(?1, dt) AS bucket, SUM(value)
    FROM events
    WHERE dt >= ?2 AND dt <= ?3
    GROUP BY bucket
    ORDER BY bucket
";

/// Event store backed by a single SQLite connection
pub struct SqliteEventStore {
    /// std::sync::Mutex because the connection is used from blocking tasks only
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteEventStore {
    /// Create or open a store at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let store = Self::with_connection(conn, Some(path))?;
        tracing::info!("Opened SQLite event store at {:?}", store.path);
        Ok(store)
    }

    /// Create a private in-memory store
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Database file path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Total number of stored events
    pub async fn event_count(&self) -> StoreResult<u64> {
        self.run(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    /// Run `f` against the connection on the blocking pool
    async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            f(&mut *guard)
        })
        .await?
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn grouped_sum(
        &self,
        range: TimeRange,
        granularity: Granularity,
    ) -> StoreResult<Vec<BucketedSum>> {
        let start = format_timestamp(&range.start);
        let end = format_timestamp(&range.end);

        let rows = self
            .run(move |conn| {
                let mut stmt = conn.prepare_cached(GROUPED_SUM_SQL)?;
                let rows = stmt
                    .query_map(params![granularity.key_format(), start, end], |row| {
                        Ok((row.get::<_, Option<String>>(0)?, row.get::<_, f64>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        rows.into_iter()
            .map(|(key, sum)| {
                let key = key.ok_or_else(|| {
                    StoreError::InvalidBucketKey("unparseable event timestamp".to_string())
                })?;
                let bucket = granularity
                    .bucket_from_key(&key)
                    .ok_or(StoreError::InvalidBucketKey(key))?;
                Ok(BucketedSum::new(bucket, sum))
            })
            .collect()
    }

    async fn append(&self, events: &[EventRecord]) -> StoreResult<usize> {
        if events.is_empty() {
            return Ok(0);
        }

        let rows: Vec<(String, f64)> = events
            .iter()
            .map(|e| (format_timestamp(&e.timestamp), e.value))
            .collect();

        self.run(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached("INSERT INTO events (dt, value) VALUES (?1, ?2)")?;
                for (dt, value) in &rows {
                    stmt.execute(params![dt, value])?;
                }
            }
            tx.commit()?;
            Ok(rows.len())
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.run(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::parse_timestamp;
    use tempfile::tempdir;

    fn event(dt: &str, value: f64) -> EventRecord {
        EventRecord::new(parse_timestamp(dt).unwrap(), value)
    }

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::parse(start, end).unwrap()
    }

    #[tokio::test]
    async fn test_grouped_sum_by_hour() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        store
            .append(&[
                event("2022-09-01T10:15:00", 1.0),
                event("2022-09-01T10:45:00", 2.0),
                event("2022-09-01T12:00:00", 4.0),
            ])
            .await
            .unwrap();

        let rows = store
            .grouped_sum(
                range("2022-09-01T00:00:00", "2022-09-01T23:00:00"),
                Granularity::Hour,
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bucket.label(), "2022-09-01T10:00:00");
        assert_eq!(rows[0].sum, 3.0);
        assert_eq!(rows[1].bucket.label(), "2022-09-01T12:00:00");
        assert_eq!(rows[1].sum, 4.0);
    }

    #[tokio::test]
    async fn test_grouped_sum_by_month_normalizes_keys() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        store
            .append(&[
                event("2022-09-03T08:00:00", 10.0),
                event("2022-09-30T23:59:00", 5.0),
                event("2022-11-15T12:00:00", 7.0),
            ])
            .await
            .unwrap();

        let rows = store
            .grouped_sum(
                range("2022-09-01T00:00:00", "2022-12-31T23:59:00"),
                Granularity::Month,
            )
            .await
            .unwrap();

        let labels: Vec<String> = rows.iter().map(|r| r.bucket.label()).collect();
        assert_eq!(labels, vec!["2022-09-01T00:00:00", "2022-11-01T00:00:00"]);
        assert_eq!(rows[0].sum, 15.0);
        assert_eq!(rows[1].sum, 7.0);
    }

    #[tokio::test]
    async fn test_range_is_inclusive() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        store
            .append(&[
                event("2022-01-01T00:00:00", 1.0),
                event("2022-01-03T00:00:00", 2.0),
                event("2022-01-03T00:00:01", 100.0),
            ])
            .await
            .unwrap();

        let rows = store
            .grouped_sum(
                range("2022-01-01T00:00:00", "2022-01-03T00:00:00"),
                Granularity::Day,
            )
            .await
            .unwrap();

        let total: f64 = rows.iter().map(|r| r.sum).sum();
        assert_eq!(total, 3.0);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("events.db");

        {
            let store = SqliteEventStore::open(&path).unwrap();
            store.append(&[event("2022-09-01T11:00:00", 5.0)]).await.unwrap();
            assert_eq!(store.path(), Some(path.as_path()));
        }

        let store = SqliteEventStore::open(&path).unwrap();
        assert_eq!(store.event_count().await.unwrap(), 1);
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_append_empty_is_noop() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        assert_eq!(store.append(&[]).await.unwrap(), 0);
        assert_eq!(store.event_count().await.unwrap(), 0);
    }
}
