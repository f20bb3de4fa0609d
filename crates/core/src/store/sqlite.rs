//! SQLite-backed podcast store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, warn};

use super::{
    CacheEntry, CacheStore, PodcastRecord, PodcastStore, PodcastUpsert, StoreError, UpsertSummary,
};

const PODCAST_COLUMNS: &str = "id, external_id, title, publisher, description, image_url,
    artwork_small, artwork_medium, artwork_large, feed_url, total_episodes, listen_score,
    genre_ids, catalog_url, itunes_id, featured, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpsertOutcome {
    Inserted,
    Updated,
}

/// SQLite-backed store for podcasts and cache entries.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS podcasts (
                id TEXT PRIMARY KEY,
                external_id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                publisher TEXT,
                description TEXT,
                image_url TEXT,
                artwork_small TEXT,
                artwork_medium TEXT,
                artwork_large TEXT,
                feed_url TEXT UNIQUE,
                total_episodes INTEGER,
                listen_score INTEGER,
                genre_ids TEXT,
                catalog_url TEXT,
                itunes_id TEXT,
                featured INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_podcasts_featured_score
                ON podcasts(featured, listen_score);

            -- One row per logical cache key
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                last_refreshed_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn upsert_one(
        conn: &Connection,
        podcast: &PodcastUpsert,
        now: &str,
    ) -> rusqlite::Result<UpsertOutcome> {
        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM podcasts WHERE external_id = ?",
                params![&podcast.external_id],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE podcasts SET
                        title = ?, publisher = ?, description = ?, image_url = ?,
                        artwork_small = ?, artwork_medium = ?, artwork_large = ?,
                        feed_url = ?, total_episodes = ?, listen_score = ?, genre_ids = ?,
                        catalog_url = ?, itunes_id = ?, featured = 1, updated_at = ?
                     WHERE id = ?",
                    params![
                        &podcast.title,
                        &podcast.publisher,
                        &podcast.description,
                        &podcast.image_url,
                        &podcast.artwork_small,
                        &podcast.artwork_medium,
                        &podcast.artwork_large,
                        &podcast.feed_url,
                        podcast.total_episodes,
                        podcast.listen_score,
                        &podcast.genre_ids,
                        &podcast.catalog_url,
                        &podcast.itunes_id,
                        now,
                        &id,
                    ],
                )?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO podcasts (id, external_id, title, publisher, description, image_url,
                        artwork_small, artwork_medium, artwork_large, feed_url, total_episodes,
                        listen_score, genre_ids, catalog_url, itunes_id, featured, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
                    params![
                        &id,
                        &podcast.external_id,
                        &podcast.title,
                        &podcast.publisher,
                        &podcast.description,
                        &podcast.image_url,
                        &podcast.artwork_small,
                        &podcast.artwork_medium,
                        &podcast.artwork_large,
                        &podcast.feed_url,
                        podcast.total_episodes,
                        podcast.listen_score,
                        &podcast.genre_ids,
                        &podcast.catalog_url,
                        &podcast.itunes_id,
                        now,
                        now,
                    ],
                )?;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    fn row_to_podcast(row: &rusqlite::Row) -> rusqlite::Result<PodcastRecord> {
        Ok(PodcastRecord {
            id: row.get(0)?,
            external_id: row.get(1)?,
            title: row.get(2)?,
            publisher: row.get(3)?,
            description: row.get(4)?,
            image_url: row.get(5)?,
            artwork_small: row.get(6)?,
            artwork_medium: row.get(7)?,
            artwork_large: row.get(8)?,
            feed_url: row.get(9)?,
            total_episodes: row.get(10)?,
            listen_score: row.get(11)?,
            genre_ids: row.get(12)?,
            catalog_url: row.get(13)?,
            itunes_id: row.get(14)?,
            featured: row.get(15)?,
            created_at: parse_timestamp(16, row.get(16)?)?,
            updated_at: parse_timestamp(17, row.get(17)?)?,
        })
    }
}

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl PodcastStore for SqliteStore {
    fn upsert_featured(
        &self,
        podcasts: &[PodcastUpsert],
        now: DateTime<Utc>,
    ) -> Result<UpsertSummary, StoreError> {
        let mut conn = self.lock()?;
        let now_str = now.to_rfc3339();
        let mut summary = UpsertSummary::default();

        let mut tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        for podcast in podcasts {
            let savepoint = tx
                .savepoint()
                .map_err(|e| StoreError::Database(e.to_string()))?;

            match Self::upsert_one(&savepoint, podcast, &now_str) {
                Ok(outcome) => {
                    savepoint
                        .commit()
                        .map_err(|e| StoreError::Database(e.to_string()))?;
                    match outcome {
                        UpsertOutcome::Inserted => summary.inserted += 1,
                        UpsertOutcome::Updated => summary.updated += 1,
                    }
                }
                Err(e) if is_constraint_violation(&e) => {
                    // Dropping the savepoint rolls this entry back.
                    warn!(
                        "Skipping podcast '{}' ({}): {}",
                        podcast.title, podcast.external_id, e
                    );
                    summary.skipped += 1;
                }
                Err(e) => return Err(StoreError::Database(e.to_string())),
            }
        }

        tx.commit()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!(
            "Upserted podcasts: {} inserted, {} updated, {} skipped",
            summary.inserted, summary.updated, summary.skipped
        );
        Ok(summary)
    }

    fn list_featured(&self, limit: u32) -> Result<Vec<PodcastRecord>, StoreError> {
        let conn = self.lock()?;

        let sql = format!(
            "SELECT {} FROM podcasts
             WHERE featured = 1
             ORDER BY listen_score IS NULL, listen_score DESC, title ASC
             LIMIT ?",
            PODCAST_COLUMNS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit], Self::row_to_podcast)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut podcasts = Vec::new();
        for row in rows {
            podcasts.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(podcasts)
    }

    fn get(&self, id: &str) -> Result<PodcastRecord, StoreError> {
        let conn = self.lock()?;

        let sql = format!("SELECT {} FROM podcasts WHERE id = ?", PODCAST_COLUMNS);
        conn.query_row(&sql, params![id], Self::row_to_podcast)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(id.to_string()),
                _ => StoreError::Database(e.to_string()),
            })
    }

    fn count_featured(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM podcasts WHERE featured = 1",
                [],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(count as u64)
    }
}

impl CacheStore for SqliteStore {
    fn get_cache_entry(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT key, last_refreshed_at FROM cache_entries WHERE key = ?",
            params![key],
            |row| {
                Ok(CacheEntry {
                    key: row.get(0)?,
                    last_refreshed_at: parse_timestamp(1, row.get(1)?)?,
                })
            },
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn touch_cache_entry(&self, key: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO cache_entries (key, last_refreshed_at) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET last_refreshed_at = excluded.last_refreshed_at",
            params![key, at.to_rfc3339()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}
