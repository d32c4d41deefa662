//! Entry capture and retrieval pipelines.
//!
//! [`add_entry`] is the shared creation path: validate, embed (when a
//! provider is configured), stamp, store. The `run_*` functions wrap the
//! store operations for the CLI; the HTTP server calls the shared
//! functions directly with its own state.

use anyhow::{bail, Context, Result};

use synapse_core::models::{format_ts_iso, Entry, NewEntry};
use synapse_core::provider::ModelProvider;
use synapse_core::store::EntryStore;

use crate::config::Config;
use crate::db;
use crate::provider::create_provider;
use crate::sqlite_store::SqliteStore;

/// Create an entry: validate, embed the content, and store it.
///
/// With a disabled provider the entry is stored without an embedding —
/// it will simply never surface in semantic search. A provider failure
/// aborts the whole operation; no half-made entry is stored.
///
/// Returns the stored entry carrying the id it actually lives under
/// (duplicate content resolves to the existing row's id).
pub async fn add_entry(
    store: &dyn EntryStore,
    provider: &dyn ModelProvider,
    user_id: &str,
    draft: NewEntry,
) -> Result<Entry> {
    if draft.content.trim().is_empty() {
        bail!("content must not be empty");
    }

    let embedding = if provider.is_enabled() {
        let vec = provider
            .embed(&draft.content)
            .await
            .context("embedding provider request failed")?;
        Some(vec)
    } else {
        None
    };

    let mut entry = Entry::from_new(user_id, draft, embedding);
    let id = store.insert_entry(&entry).await?;
    entry.id = id;

    Ok(entry)
}

/// CLI `synapse add`.
pub async fn run_add(config: &Config, user_id: &str, draft: NewEntry) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let provider = create_provider(&config.model)?;

    let entry = add_entry(&store, provider.as_ref(), user_id, draft).await?;

    println!("Added entry {}", entry.id);
    println!("  kind: {}", entry.kind);
    match &entry.embedding {
        Some(vec) => println!("  embedding: {} dims ({})", vec.len(), provider.name()),
        None => println!("  embedding: skipped (provider disabled)"),
    }

    store.pool().close().await;
    Ok(())
}

/// CLI `synapse list`.
pub async fn run_list(config: &Config, user_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let entries = store.list_entries(user_id).await?;

    if entries.is_empty() {
        println!("No entries.");
    } else {
        for (i, entry) in entries.iter().enumerate() {
            print_entry_line(i + 1, entry);
        }
    }

    store.pool().close().await;
    Ok(())
}

/// CLI `synapse get`.
pub async fn run_get(config: &Config, user_id: &str, id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let entry = store.get_entry(user_id, id).await?;
    let entry = match entry {
        Some(entry) => entry,
        None => {
            store.pool().close().await;
            bail!("entry not found: {}", id);
        }
    };

    println!("id:      {}", entry.id);
    println!("kind:    {}", entry.kind);
    if let Some(ref title) = entry.title {
        println!("title:   {}", title);
    }
    if let Some(ref source) = entry.source {
        println!("source:  {}", source);
    }
    if !entry.tags.is_empty() {
        println!("tags:    {}", entry.tags.join(", "));
    }
    println!("created: {}", format_ts_iso(entry.created_at));
    println!("updated: {}", format_ts_iso(entry.updated_at));
    match &entry.embedding {
        Some(vec) => println!("embedded: yes ({} dims)", vec.len()),
        None => println!("embedded: no"),
    }
    println!();
    println!("{}", entry.content);

    store.pool().close().await;
    Ok(())
}

/// CLI `synapse rm`.
pub async fn run_rm(config: &Config, user_id: &str, id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let deleted = store.delete_entry(user_id, id).await?;
    store.pool().close().await;

    if !deleted {
        bail!("entry not found: {}", id);
    }
    println!("Deleted entry {}", id);
    Ok(())
}

fn print_entry_line(index: usize, entry: &Entry) {
    let title_display = entry.title.as_deref().unwrap_or("(untitled)");
    let date = format_ts_iso(entry.created_at);

    println!("{}. [{}] {}", index, entry.kind, title_display);
    println!("    added: {}", date);
    if !entry.tags.is_empty() {
        println!("    tags: {}", entry.tags.join(", "));
    }
    println!("    excerpt: \"{}\"", excerpt(&entry.content, 120));
    println!("    id: {}", entry.id);
    println!();
}

/// First `max_chars` of the content, newlines flattened.
fn excerpt(content: &str, max_chars: usize) -> String {
    content
        .replace('\n', " ")
        .trim()
        .chars()
        .take(max_chars)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use synapse_core::models::EntryType;
    use synapse_core::store::memory::MemoryStore;

    struct FixedProvider {
        vec: Vec<f32>,
    }

    #[async_trait]
    impl ModelProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.vec.clone())
        }
        async fn answer(&self, _question: &str, _context: &[String]) -> Result<String> {
            Ok("ok".to_string())
        }
    }

    fn draft(content: &str) -> NewEntry {
        NewEntry {
            kind: EntryType::Note,
            title: None,
            content: content.to_string(),
            source: None,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_add_entry_embeds_content() {
        let store = MemoryStore::new();
        let provider = FixedProvider {
            vec: vec![0.1, 0.2],
        };
        let entry = add_entry(&store, &provider, "u1", draft("remember this"))
            .await
            .unwrap();
        assert_eq!(entry.embedding.as_deref(), Some(&[0.1f32, 0.2][..]));
        assert!(store.get_entry("u1", &entry.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_add_entry_rejects_blank_content() {
        let store = MemoryStore::new();
        let provider = FixedProvider { vec: vec![1.0] };
        let err = add_entry(&store, &provider, "u1", draft("   "))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[tokio::test]
    async fn test_add_entry_without_provider_stores_unembedded() {
        let store = MemoryStore::new();
        let provider = crate::provider::DisabledProvider;
        let entry = add_entry(&store, &provider, "u1", draft("offline note"))
            .await
            .unwrap();
        assert!(entry.embedding.is_none());
    }

    #[tokio::test]
    async fn test_add_entry_duplicate_returns_existing_id() {
        let store = MemoryStore::new();
        let provider = FixedProvider { vec: vec![1.0] };
        let first = add_entry(&store, &provider, "u1", draft("same"))
            .await
            .unwrap();
        let second = add_entry(&store, &provider, "u1", draft("same"))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
    }
}
