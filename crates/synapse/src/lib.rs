//! # Synapse
//!
//! **A personal knowledge base with semantic recall.**
//!
//! Synapse captures entries (quotes, notes, links), embeds them with a
//! language-model provider at creation time, and recalls them by meaning:
//! a query is embedded, the caller's entries are ranked by cosine
//! similarity, and the top matches ground a generated natural-language
//! answer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌──────────┐
//! │ Capture  │──▶│ Embed + Store │──▶│  SQLite   │
//! │ CLI/HTTP │   │   (provider)  │   │  entries  │
//! └──────────┘   └───────────────┘   └────┬─────┘
//!                                         │
//!                     ┌───────────────────┤
//!                     ▼                   ▼
//!                ┌──────────┐       ┌──────────┐
//!                │   CLI    │       │   HTTP   │
//!                │(synapse) │       │  (Axum)  │
//!                └──────────┘       └──────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. A caller submits an entry; the **model provider** ([`provider`])
//!    embeds its content and the **store** ([`sqlite_store`]) persists it.
//! 2. A search request embeds the query the same way.
//! 3. The **ranker** ([`synapse_core::rank`]) scores every entry by cosine
//!    similarity and keeps the top K.
//! 4. The top entries' content grounds an answer generated by the same
//!    provider ([`search`]).
//! 5. Both surfaces — the CLI and the bearer-token HTTP API ([`server`]) —
//!    share these pipelines.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |
//! | [`sqlite_store`] | `EntryStore` implementation over sqlx |
//! | [`provider`] | Model providers: Gemini, OpenAI, disabled |
//! | [`auth`] | HMAC-SHA256 bearer tokens and the Axum extractor |
//! | [`entries`] | Entry capture and retrieval pipelines |
//! | [`search`] | Embed → rank → answer search boundary |
//! | [`stats`] | Per-kind entry counts |
//! | [`server`] | JSON HTTP API (Axum) with CORS and request traces |

pub mod auth;
pub mod config;
pub mod db;
pub mod entries;
pub mod migrate;
pub mod provider;
pub mod search;
pub mod server;
pub mod sqlite_store;
pub mod stats;

pub use synapse_core::models;
pub use synapse_core::provider::ModelProvider;
pub use synapse_core::rank;
pub use synapse_core::store;
pub use synapse_core::vector;
