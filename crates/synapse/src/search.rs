//! Search boundary: embed the query, rank the caller's entries, and
//! generate an answer grounded in the top results.
//!
//! The in-process ranker is the canonical retrieval architecture here —
//! the store returns a user's entries and [`rank`](synapse_core::rank::rank)
//! does cosine top-K. There is no delegation to a native vector-search
//! operator, so the scoring behavior is identical everywhere the search
//! runs.

use anyhow::{bail, Context, Result};

use synapse_core::models::SearchResponse;
use synapse_core::provider::ModelProvider;
use synapse_core::rank::rank;
use synapse_core::store::EntryStore;

use crate::config::Config;
use crate::db;
use crate::provider::create_provider;
use crate::sqlite_store::SqliteStore;

/// Answer returned when ranking produced no results. The generation
/// provider is not called on this path.
pub const NO_CONTEXT_ANSWER: &str =
    "I don't have enough information to answer that question.";

/// Run a semantic search for one user.
///
/// 1. Embed the query text.
/// 2. Fetch the user's entries.
/// 3. Rank by cosine similarity, keep the top `top_k`.
/// 4. Generate an answer from the top results' content.
pub async fn search_entries(
    store: &dyn EntryStore,
    provider: &dyn ModelProvider,
    user_id: &str,
    query: &str,
    top_k: usize,
) -> Result<SearchResponse> {
    if query.trim().is_empty() {
        bail!("query must not be empty");
    }
    if !provider.is_enabled() {
        bail!("model provider is disabled; search requires an embedding provider");
    }

    let query_vec = provider
        .embed(query)
        .await
        .context("embedding provider request failed")?;

    let candidates = store.list_entries(user_id).await?;
    let results = rank(&query_vec, candidates, top_k);

    let answer = if results.is_empty() {
        NO_CONTEXT_ANSWER.to_string()
    } else {
        let context: Vec<String> = results.iter().map(|r| r.entry.content.clone()).collect();
        provider
            .answer(query, &context)
            .await
            .context("generation provider request failed")?
    };

    Ok(SearchResponse { results, answer })
}

/// CLI `synapse search`.
pub async fn run_search(
    config: &Config,
    user_id: &str,
    query: &str,
    limit: Option<usize>,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let provider = create_provider(&config.model)?;

    let top_k = limit.unwrap_or(config.retrieval.top_k);
    let response = search_entries(&store, provider.as_ref(), user_id, query, top_k).await?;

    if response.results.is_empty() {
        println!("No results.");
    } else {
        for (i, result) in response.results.iter().enumerate() {
            let title_display = result.entry.title.as_deref().unwrap_or("(untitled)");
            println!(
                "{}. [{:.2}] {} / {}",
                i + 1,
                result.score,
                result.entry.kind,
                title_display
            );
            println!(
                "    excerpt: \"{}\"",
                result
                    .entry
                    .content
                    .replace('\n', " ")
                    .trim()
                    .chars()
                    .take(120)
                    .collect::<String>()
            );
            println!("    id: {}", result.entry.id);
            println!();
        }
    }

    println!("Answer:");
    println!("  {}", response.answer);

    store.pool().close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use synapse_core::models::{Entry, EntryType, NewEntry};
    use synapse_core::store::memory::MemoryStore;

    /// Scripted provider: axis-aligned query vector, canned answer that
    /// records how much context it was given.
    struct ScriptedProvider {
        query_vec: Vec<f32>,
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.query_vec.clone())
        }
        async fn answer(&self, _question: &str, context: &[String]) -> Result<String> {
            Ok(format!("answer from {} entries", context.len()))
        }
    }

    async fn seed(store: &MemoryStore, content: &str, embedding: Option<Vec<f32>>) {
        let entry = Entry::from_new(
            "u1",
            NewEntry {
                kind: EntryType::Note,
                title: None,
                content: content.to_string(),
                source: None,
                tags: Vec::new(),
            },
            embedding,
        );
        store.insert_entry(&entry).await.unwrap();
    }

    #[tokio::test]
    async fn test_search_ranks_and_answers() {
        let store = MemoryStore::new();
        seed(&store, "aligned", Some(vec![1.0, 0.0])).await;
        seed(&store, "orthogonal", Some(vec![0.0, 1.0])).await;
        seed(&store, "unembedded", None).await;

        let provider = ScriptedProvider {
            query_vec: vec![1.0, 0.0],
        };
        let response = search_entries(&store, &provider, "u1", "anything", 5)
            .await
            .unwrap();

        // Unembedded entry is skipped; the aligned one ranks first.
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].entry.content, "aligned");
        assert!((response.results[0].score - 1.0).abs() < 1e-9);
        assert_eq!(response.answer, "answer from 2 entries");
    }

    #[tokio::test]
    async fn test_search_empty_store_short_circuits_answer() {
        let store = MemoryStore::new();
        let provider = ScriptedProvider {
            query_vec: vec![1.0, 0.0],
        };
        let response = search_entries(&store, &provider, "u1", "anything", 5)
            .await
            .unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.answer, NO_CONTEXT_ANSWER);
    }

    #[tokio::test]
    async fn test_search_rejects_blank_query() {
        let store = MemoryStore::new();
        let provider = ScriptedProvider {
            query_vec: vec![1.0],
        };
        let err = search_entries(&store, &provider, "u1", "  ", 5)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[tokio::test]
    async fn test_search_rejects_disabled_provider() {
        let store = MemoryStore::new();
        let provider = crate::provider::DisabledProvider;
        let err = search_entries(&store, &provider, "u1", "query", 5)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let store = MemoryStore::new();
        for i in 0..4 {
            seed(&store, &format!("entry {}", i), Some(vec![1.0, i as f32])).await;
        }
        let provider = ScriptedProvider {
            query_vec: vec![1.0, 0.0],
        };
        let response = search_entries(&store, &provider, "u1", "q", 2).await.unwrap();
        assert_eq!(response.results.len(), 2);
    }
}
