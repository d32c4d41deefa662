//! Model provider implementations.
//!
//! Concrete [`ModelProvider`] backends behind the capability interface:
//! - **[`DisabledProvider`]** — returns errors; used when no provider is configured.
//! - **[`GeminiProvider`]** — Google Generative Language API (`embedContent` / `generateContent`).
//! - **[`OpenAiProvider`]** — OpenAI embeddings and chat completions.
//!
//! # Provider Selection
//!
//! Use [`create_provider`] to instantiate the appropriate provider based
//! on the `[model]` section of the configuration.
//!
//! # Retry Strategy
//!
//! Both remote providers use exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use synapse_core::provider::ModelProvider;

use crate::config::ModelConfig;

/// Instruction given to the generation model so answers stay grounded in
/// the retrieved entries instead of the model's own knowledge.
const SYSTEM_INSTRUCTION: &str = "You are an assistant that answers questions using only the \
    user's personal knowledge base. Use only the context provided in the prompt to craft your \
    answer. If the context does not contain enough information, reply that you do not have \
    enough information to answer the question. Do not speculate beyond the given context.";

/// Returned when generation succeeds but the model produced no text.
const FALLBACK_ANSWER: &str = "Sorry, I couldn't generate an answer.";

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Create the appropriate [`ModelProvider`] based on configuration.
///
/// | Config value | Provider |
/// |--------------|----------|
/// | `"disabled"` | [`DisabledProvider`] |
/// | `"gemini"` | [`GeminiProvider`] |
/// | `"openai"` | [`OpenAiProvider`] |
///
/// # Errors
///
/// Returns an error for unknown provider names or when a remote provider
/// cannot be initialized (missing `dims` or API key).
pub fn create_provider(config: &ModelConfig) -> Result<Arc<dyn ModelProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledProvider)),
        "gemini" => Ok(Arc::new(GeminiProvider::new(config)?)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config)?)),
        other => bail!("Unknown model provider: {}", other),
    }
}

/// Join the question and context strings into the generation prompt.
fn build_prompt(question: &str, context: &[String]) -> String {
    let context_text = context.join("\n\n");
    format!(
        "Context:\n{}\n\nQuestion: {}\n\nAnswer:",
        context_text, question
    )
}

/// POST a JSON body with the shared retry/backoff policy.
///
/// Retries 429, 5xx, and transport errors with exponential backoff;
/// fails immediately on other 4xx responses.
async fn post_json_with_retry(
    client: &reqwest::Client,
    url: &str,
    headers: &[(&'static str, &str)],
    body: &serde_json::Value,
    max_retries: u32,
) -> Result<serde_json::Value> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let mut request = client.post(url).header("Content-Type", "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let resp = request.json(body).send().await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response.json().await?);
                }

                // Rate limited or server error — retry
                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow!("API error {}: {}", status, body_text));
                    continue;
                }

                // Client error (not 429) — don't retry
                let body_text = response.text().await.unwrap_or_default();
                bail!("API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("request failed after retries")))
}

fn f32_array(value: &serde_json::Value) -> Option<Vec<f32>> {
    value.as_array().map(|arr| {
        arr.iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect()
    })
}

// ============ Disabled Provider ============

/// A no-op provider that always returns errors.
///
/// Used when `model.provider = "disabled"`. Entries are then stored
/// without embeddings and search is rejected up front.
pub struct DisabledProvider;

#[async_trait]
impl ModelProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        bail!("model provider is disabled")
    }

    async fn answer(&self, _question: &str, _context: &[String]) -> Result<String> {
        bail!("model provider is disabled")
    }
}

// ============ Gemini Provider ============

/// Provider backed by the Google Generative Language API.
///
/// Embeddings via `models/{model}:embedContent`, answers via
/// `models/{model}:generateContent` with a fixed system instruction.
/// Requires the `GEMINI_API_KEY` environment variable.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    embedding_model: String,
    generation_model: String,
    dims: usize,
    max_retries: u32,
}

impl GeminiProvider {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY environment variable not set"))?;

        let dims = config
            .dims
            .ok_or_else(|| anyhow!("model.dims required for the gemini provider"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            embedding_model: config
                .embedding_model
                .clone()
                .unwrap_or_else(|| "text-embedding-004".to_string()),
            generation_model: config
                .generation_model
                .clone()
                .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            dims,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/models/{}:embedContent",
            GEMINI_API_BASE, self.embedding_model
        );
        let body = serde_json::json!({
            "content": { "parts": [{ "text": text }] },
        });

        let json = post_json_with_retry(
            &self.client,
            &url,
            &[("x-goog-api-key", self.api_key.as_str())],
            &body,
            self.max_retries,
        )
        .await?;

        let vec = parse_gemini_embedding(&json)?;
        if vec.len() != self.dims {
            bail!(
                "embedding dimensionality mismatch: model '{}' returned {} dims, config says {}",
                self.embedding_model,
                vec.len(),
                self.dims
            );
        }
        Ok(vec)
    }

    async fn answer(&self, question: &str, context: &[String]) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            GEMINI_API_BASE, self.generation_model
        );
        let body = serde_json::json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "parts": [{ "text": build_prompt(question, context) }] }],
            "generationConfig": { "maxOutputTokens": 300, "temperature": 0.5 },
        });

        let json = post_json_with_retry(
            &self.client,
            &url,
            &[("x-goog-api-key", self.api_key.as_str())],
            &body,
            self.max_retries,
        )
        .await?;

        parse_gemini_answer(&json)
    }
}

/// Extract `embedding.values` from an `embedContent` response.
fn parse_gemini_embedding(json: &serde_json::Value) -> Result<Vec<f32>> {
    json.get("embedding")
        .and_then(|e| e.get("values"))
        .and_then(f32_array)
        .ok_or_else(|| anyhow!("Invalid Gemini response: missing embedding values"))
}

/// Extract the concatenated candidate text from a `generateContent` response.
fn parse_gemini_answer(json: &serde_json::Value) -> Result<String> {
    let parts = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| anyhow!("Invalid Gemini response: missing candidates"))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        Ok(FALLBACK_ANSWER.to_string())
    } else {
        Ok(text)
    }
}

// ============ OpenAI Provider ============

/// Provider backed by the OpenAI API.
///
/// Embeddings via `POST /v1/embeddings`, answers via
/// `POST /v1/chat/completions`. Requires the `OPENAI_API_KEY`
/// environment variable.
pub struct OpenAiProvider {
    client: reqwest::Client,
    bearer: String,
    embedding_model: String,
    generation_model: String,
    dims: usize,
    max_retries: u32,
}

impl OpenAiProvider {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let dims = config
            .dims
            .ok_or_else(|| anyhow!("model.dims required for the openai provider"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            bearer: format!("Bearer {}", api_key),
            embedding_model: config
                .embedding_model
                .clone()
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            generation_model: config
                .generation_model
                .clone()
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            dims,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", OPENAI_API_BASE);
        let body = serde_json::json!({
            "model": self.embedding_model,
            "input": [text],
        });

        let json = post_json_with_retry(
            &self.client,
            &url,
            &[("Authorization", self.bearer.as_str())],
            &body,
            self.max_retries,
        )
        .await?;

        let vec = parse_openai_embedding(&json)?;
        if vec.len() != self.dims {
            bail!(
                "embedding dimensionality mismatch: model '{}' returned {} dims, config says {}",
                self.embedding_model,
                vec.len(),
                self.dims
            );
        }
        Ok(vec)
    }

    async fn answer(&self, question: &str, context: &[String]) -> Result<String> {
        let url = format!("{}/chat/completions", OPENAI_API_BASE);
        let body = serde_json::json!({
            "model": self.generation_model,
            "messages": [
                { "role": "system", "content": SYSTEM_INSTRUCTION },
                { "role": "user", "content": build_prompt(question, context) },
            ],
            "temperature": 0.5,
            "max_tokens": 500,
        });

        let json = post_json_with_retry(
            &self.client,
            &url,
            &[("Authorization", self.bearer.as_str())],
            &body,
            self.max_retries,
        )
        .await?;

        parse_openai_answer(&json)
    }
}

/// Extract `data[0].embedding` from an embeddings response.
fn parse_openai_embedding(json: &serde_json::Value) -> Result<Vec<f32>> {
    json.get("data")
        .and_then(|d| d.get(0))
        .and_then(|item| item.get("embedding"))
        .and_then(f32_array)
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing embedding"))
}

/// Extract `choices[0].message.content` from a chat completions response.
fn parse_openai_answer(json: &serde_json::Value) -> Result<String> {
    let text = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing message content"))?;

    if text.trim().is_empty() {
        Ok(FALLBACK_ANSWER.to_string())
    } else {
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt(
            "what is a monad?",
            &["a monoid in the category of endofunctors".to_string()],
        );
        assert!(prompt.starts_with("Context:\n"));
        assert!(prompt.contains("Question: what is a monad?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_parse_gemini_embedding() {
        let json = serde_json::json!({ "embedding": { "values": [0.1, 0.2, 0.3] } });
        let vec = parse_gemini_embedding(&json).unwrap();
        assert_eq!(vec.len(), 3);
        assert!((vec[1] - 0.2).abs() < 1e-6);

        assert!(parse_gemini_embedding(&serde_json::json!({})).is_err());
    }

    #[test]
    fn test_parse_gemini_answer() {
        let json = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hello " }, { "text": "world" }] } }]
        });
        assert_eq!(parse_gemini_answer(&json).unwrap(), "Hello world");

        let empty = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "  " }] } }]
        });
        assert_eq!(parse_gemini_answer(&empty).unwrap(), FALLBACK_ANSWER);

        assert!(parse_gemini_answer(&serde_json::json!({})).is_err());
    }

    #[test]
    fn test_parse_openai_embedding() {
        let json = serde_json::json!({ "data": [{ "embedding": [1.0, -2.5] }] });
        assert_eq!(parse_openai_embedding(&json).unwrap(), vec![1.0, -2.5]);

        assert!(parse_openai_embedding(&serde_json::json!({ "data": [] })).is_err());
    }

    #[test]
    fn test_parse_openai_answer() {
        let json = serde_json::json!({
            "choices": [{ "message": { "content": "an answer" } }]
        });
        assert_eq!(parse_openai_answer(&json).unwrap(), "an answer");

        assert!(parse_openai_answer(&serde_json::json!({ "choices": [] })).is_err());
    }

    #[test]
    fn test_disabled_provider() {
        let provider = DisabledProvider;
        assert!(!provider.is_enabled());
        assert_eq!(provider.name(), "disabled");
    }

    #[test]
    fn test_create_provider_rejects_unknown() {
        let config = ModelConfig {
            provider: "anthropic".to_string(),
            ..ModelConfig::default()
        };
        assert!(create_provider(&config).is_err());
    }
}
