//! Storage abstraction for Synapse.
//!
//! The [`EntryStore`] trait defines all storage operations needed by the
//! capture and recall pipeline, enabling pluggable backends (SQLite,
//! in-memory for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Entry, EntryStats};

/// Abstract storage backend for entries.
///
/// Every operation is scoped to an owning `user_id` — no method can see
/// another user's entries.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_entry`](EntryStore::insert_entry) | Insert, or refresh metadata on a duplicate |
/// | [`get_entry`](EntryStore::get_entry) | Fetch one entry by id |
/// | [`list_entries`](EntryStore::list_entries) | All of a user's entries, newest first |
/// | [`delete_entry`](EntryStore::delete_entry) | Remove an entry |
/// | [`count_by_kind`](EntryStore::count_by_kind) | Per-kind counts |
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Insert an entry, deduplicating on `(user_id, content_hash)`.
    ///
    /// When the user already has an entry with the same content hash, the
    /// existing row keeps its id, embedding, content, and `created_at`;
    /// only title, source, tags, and `updated_at` are refreshed. Returns
    /// the id the entry is actually stored under.
    async fn insert_entry(&self, entry: &Entry) -> Result<String>;

    /// Fetch one entry by id, scoped to its owner.
    async fn get_entry(&self, user_id: &str, id: &str) -> Result<Option<Entry>>;

    /// All entries for a user, ordered `created_at` descending with id
    /// ascending as the tiebreak (deterministic listing order).
    async fn list_entries(&self, user_id: &str) -> Result<Vec<Entry>>;

    /// Delete an entry. Returns true when a row was removed.
    async fn delete_entry(&self, user_id: &str, id: &str) -> Result<bool>;

    /// Per-kind entry counts for a user.
    async fn count_by_kind(&self, user_id: &str) -> Result<EntryStats>;
}
