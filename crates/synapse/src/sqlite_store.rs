//! SQLite-backed [`EntryStore`] implementation.
//!
//! Maps each store operation to SQL against the `entries` table. Embedding
//! vectors are stored as little-endian f32 BLOBs via the core vector codec;
//! tags as a JSON array column.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use synapse_core::models::{Entry, EntryStats, EntryType};
use synapse_core::store::EntryStore;
use synapse_core::vector::{blob_to_vec, vec_to_blob};

/// SQLite implementation of the [`EntryStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<Entry> {
    let kind: String = row.get("kind");
    let tags_json: String = row.get("tags_json");
    let blob: Option<Vec<u8>> = row.get("embedding");

    Ok(Entry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind: kind.parse::<EntryType>()?,
        title: row.get("title"),
        content: row.get("content"),
        source: row.get("source"),
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        embedding: blob.map(|b| blob_to_vec(&b)),
        content_hash: row.get("content_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const ENTRY_COLUMNS: &str = "id, user_id, kind, title, content, source, tags_json, embedding, content_hash, created_at, updated_at";

#[async_trait]
impl EntryStore for SqliteStore {
    async fn insert_entry(&self, entry: &Entry) -> Result<String> {
        let tags_json = serde_json::to_string(&entry.tags)?;
        let blob = entry.embedding.as_ref().map(|v| vec_to_blob(v));

        sqlx::query(
            r#"
            INSERT INTO entries (id, user_id, kind, title, content, source,
                                 tags_json, embedding, content_hash,
                                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, content_hash) DO UPDATE SET
                title = excluded.title,
                source = excluded.source,
                tags_json = excluded.tags_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(entry.kind.as_str())
        .bind(&entry.title)
        .bind(&entry.content)
        .bind(&entry.source)
        .bind(&tags_json)
        .bind(&blob)
        .bind(&entry.content_hash)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;

        // The conflict path keeps the existing row's id; report the id the
        // entry is actually stored under.
        let id: String =
            sqlx::query_scalar("SELECT id FROM entries WHERE user_id = ? AND content_hash = ?")
                .bind(&entry.user_id)
                .bind(&entry.content_hash)
                .fetch_one(&self.pool)
                .await?;

        Ok(id)
    }

    async fn get_entry(&self, user_id: &str, id: &str) -> Result<Option<Entry>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM entries WHERE user_id = ? AND id = ?",
            ENTRY_COLUMNS
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn list_entries(&self, user_id: &str) -> Result<Vec<Entry>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM entries WHERE user_id = ? ORDER BY created_at DESC, id ASC",
            ENTRY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn delete_entry(&self, user_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entries WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_by_kind(&self, user_id: &str) -> Result<EntryStats> {
        let rows = sqlx::query(
            "SELECT kind, COUNT(*) AS n FROM entries WHERE user_id = ? GROUP BY kind",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut stats = EntryStats::default();
        for row in &rows {
            let kind: String = row.get("kind");
            let n: i64 = row.get("n");
            stats.total += n;
            match kind.as_str() {
                "quote" => stats.quotes = n,
                "note" => stats.notes = n,
                "link" => stats.links = n,
                _ => {}
            }
        }

        Ok(stats)
    }
}
