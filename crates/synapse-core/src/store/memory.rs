//! In-memory [`EntryStore`] implementation for tests.
//!
//! A `Vec<Entry>` behind `std::sync::RwLock`. Lookups are linear scans —
//! fine at test scale, and it keeps the implementation honest about the
//! trait's ordering and dedup contracts without a database.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Entry, EntryStats, EntryType};

use super::EntryStore;

/// In-memory store used by unit tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn insert_entry(&self, entry: &Entry) -> Result<String> {
        let mut entries = self.entries.write().unwrap();

        if let Some(existing) = entries
            .iter_mut()
            .find(|e| e.user_id == entry.user_id && e.content_hash == entry.content_hash)
        {
            existing.title = entry.title.clone();
            existing.source = entry.source.clone();
            existing.tags = entry.tags.clone();
            existing.updated_at = entry.updated_at;
            return Ok(existing.id.clone());
        }

        entries.push(entry.clone());
        Ok(entry.id.clone())
    }

    async fn get_entry(&self, user_id: &str, id: &str) -> Result<Option<Entry>> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .find(|e| e.user_id == user_id && e.id == id)
            .cloned())
    }

    async fn list_entries(&self, user_id: &str) -> Result<Vec<Entry>> {
        let entries = self.entries.read().unwrap();
        let mut result: Vec<Entry> = entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    async fn delete_entry(&self, user_id: &str, id: &str) -> Result<bool> {
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|e| !(e.user_id == user_id && e.id == id));
        Ok(entries.len() < before)
    }

    async fn count_by_kind(&self, user_id: &str) -> Result<EntryStats> {
        let entries = self.entries.read().unwrap();
        let mut stats = EntryStats::default();
        for e in entries.iter().filter(|e| e.user_id == user_id) {
            stats.total += 1;
            match e.kind {
                EntryType::Quote => stats.quotes += 1,
                EntryType::Note => stats.notes += 1,
                EntryType::Link => stats.links += 1,
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewEntry;

    fn draft(kind: EntryType, content: &str) -> NewEntry {
        NewEntry {
            kind,
            title: None,
            content: content.to_string(),
            source: None,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new();
        let entry = Entry::from_new("u1", draft(EntryType::Note, "hello"), None);
        let id = store.insert_entry(&entry).await.unwrap();

        let fetched = store.get_entry("u1", &id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "hello");

        // Scoped by owner: another user sees nothing.
        assert!(store.get_entry("u2", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_content_keeps_original_id() {
        let store = MemoryStore::new();
        let first = Entry::from_new("u1", draft(EntryType::Note, "same text"), None);
        let id1 = store.insert_entry(&first).await.unwrap();

        let mut second = Entry::from_new("u1", draft(EntryType::Note, "same text"), None);
        second.title = Some("retitled".to_string());
        let id2 = store.insert_entry(&second).await.unwrap();

        assert_eq!(id1, id2);
        let all = store.list_entries("u1").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title.as_deref(), Some("retitled"));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = MemoryStore::new();
        let mut older = Entry::from_new("u1", draft(EntryType::Note, "older"), None);
        older.created_at = 100;
        let mut newer = Entry::from_new("u1", draft(EntryType::Note, "newer"), None);
        newer.created_at = 200;
        store.insert_entry(&older).await.unwrap();
        store.insert_entry(&newer).await.unwrap();

        let all = store.list_entries("u1").await.unwrap();
        assert_eq!(all[0].content, "newer");
        assert_eq!(all[1].content, "older");
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let entry = Entry::from_new("u1", draft(EntryType::Link, "x"), None);
        let id = store.insert_entry(&entry).await.unwrap();

        assert!(!store.delete_entry("u2", &id).await.unwrap());
        assert!(store.delete_entry("u1", &id).await.unwrap());
        assert!(!store.delete_entry("u1", &id).await.unwrap());
    }

    #[tokio::test]
    async fn test_count_by_kind() {
        let store = MemoryStore::new();
        for (kind, content) in [
            (EntryType::Quote, "q1"),
            (EntryType::Note, "n1"),
            (EntryType::Note, "n2"),
        ] {
            let entry = Entry::from_new("u1", draft(kind, content), None);
            store.insert_entry(&entry).await.unwrap();
        }
        let stats = store.count_by_kind("u1").await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.quotes, 1);
        assert_eq!(stats.notes, 2);
        assert_eq!(stats.links, 0);

        let empty = store.count_by_kind("u2").await.unwrap();
        assert_eq!(empty.total, 0);
    }
}
