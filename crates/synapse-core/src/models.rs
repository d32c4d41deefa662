//! Core data models used throughout Synapse.
//!
//! These types represent the entries, search results, and per-user counts
//! that flow through the capture and recall pipeline.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// The category of a stored entry.
///
/// Purely descriptive — nothing in the ranking core branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Quote,
    Note,
    Link,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Quote => "quote",
            EntryType::Note => "note",
            EntryType::Link => "link",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quote" => Ok(EntryType::Quote),
            "note" => Ok(EntryType::Note),
            "link" => Ok(EntryType::Link),
            other => bail!("invalid entry kind: '{}'. Use quote, note, or link.", other),
        }
    }
}

/// A unit of stored knowledge, owned by a single user.
///
/// Entries are immutable after creation: `content` and `embedding` never
/// change. Resubmitting identical content updates only the descriptive
/// metadata (title, source, tags) on the existing row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// UUID assigned at creation.
    pub id: String,
    /// Owning user; every store query is scoped by this field.
    pub user_id: String,
    pub kind: EntryType,
    pub title: Option<String>,
    /// Primary text payload. Required, non-empty.
    pub content: String,
    /// Free-text provenance (book, URL, conversation, ...).
    pub source: Option<String>,
    pub tags: Vec<String>,
    /// Vector produced by the model provider at creation time. Absent when
    /// the provider was disabled. Never serialized in API responses — it is
    /// an index detail, not user data.
    #[serde(default, skip_serializing)]
    pub embedding: Option<Vec<f32>>,
    /// SHA-256 hex of `content`; duplicate-submission key per user.
    pub content_hash: String,
    /// Unix timestamp, set at creation.
    pub created_at: i64,
    /// Unix timestamp, refreshed on metadata updates.
    pub updated_at: i64,
}

/// Fields a caller supplies when creating an entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEntry {
    pub kind: EntryType,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Entry {
    /// Build a full entry from a draft: mints the UUID, stamps both
    /// timestamps, and computes the content hash.
    pub fn from_new(user_id: &str, draft: NewEntry, embedding: Option<Vec<f32>>) -> Self {
        let now = chrono::Utc::now().timestamp();
        let hash = content_hash(&draft.content);
        Entry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind: draft.kind,
            title: draft.title,
            content: draft.content,
            source: draft.source,
            tags: draft.tags,
            embedding,
            content_hash: hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An entry paired with its relevance score, the output of ranking.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub entry: Entry,
    /// Cosine similarity to the query vector, in `[-1.0, 1.0]`.
    pub score: f64,
}

/// Ranked results plus the generated natural-language answer.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub answer: String,
}

/// Per-kind entry counts for one user.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EntryStats {
    pub total: i64,
    pub quotes: i64,
    pub notes: i64,
    pub links: i64,
}

/// SHA-256 hex digest of entry content, used for duplicate detection.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Format a Unix timestamp as ISO 8601.
pub fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in ["quote", "note", "link"] {
            let parsed: EntryType = kind.parse().unwrap();
            assert_eq!(parsed.as_str(), kind);
        }
    }

    #[test]
    fn test_kind_rejects_unknown() {
        assert!("bookmark".parse::<EntryType>().is_err());
    }

    #[test]
    fn test_content_hash_stable() {
        let a = content_hash("the map is not the territory");
        let b = content_hash("the map is not the territory");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, content_hash("something else"));
    }

    #[test]
    fn test_from_new_stamps_fields() {
        let draft = NewEntry {
            kind: EntryType::Note,
            title: Some("t".to_string()),
            content: "body".to_string(),
            source: None,
            tags: vec!["a".to_string()],
        };
        let entry = Entry::from_new("alice", draft, Some(vec![0.1, 0.2]));
        assert_eq!(entry.user_id, "alice");
        assert_eq!(entry.created_at, entry.updated_at);
        assert_eq!(entry.content_hash, content_hash("body"));
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn test_embedding_not_serialized() {
        let draft = NewEntry {
            kind: EntryType::Quote,
            title: None,
            content: "q".to_string(),
            source: None,
            tags: Vec::new(),
        };
        let entry = Entry::from_new("u", draft, Some(vec![1.0, 2.0]));
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("embedding"));
        assert!(json.contains("\"kind\":\"quote\""));
    }
}
