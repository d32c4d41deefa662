//! Model provider capability trait.
//!
//! Defines the narrow interface the rest of the system needs from a
//! language-model service: turn text into a fixed-length vector, and turn
//! a question plus context strings into an answer. Concrete providers
//! (Gemini, OpenAI, disabled) live in the `synapse` app crate so this
//! crate stays free of HTTP dependencies.

use anyhow::Result;
use async_trait::async_trait;

/// Capability interface for the embedding/answer service.
///
/// Implementations are created by the application at startup and passed
/// into the boundary layer — never held as global singletons.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider identifier (e.g. `"gemini"`), used in logs and errors.
    fn name(&self) -> &str;

    /// Whether this provider can serve requests. The disabled provider
    /// returns false; callers then store entries without embeddings and
    /// reject searches up front.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Map text to a fixed-length embedding vector.
    ///
    /// All vectors from one provider configuration have the same
    /// dimensionality; implementations verify the configured `dims`
    /// against the response before returning it.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Produce a natural-language answer to `question` grounded in the
    /// given context strings.
    async fn answer(&self, question: &str, context: &[String]) -> Result<String>;
}
