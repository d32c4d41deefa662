//! # Synapse Core
//!
//! Shared logic for Synapse: entry models, the retrieval ranker, the
//! embedding vector codec, the store abstraction, and the model-provider
//! trait.
//!
//! This crate contains no tokio runtime setup, sqlx, HTTP, or other
//! application concerns. Everything here is either a pure function or a
//! trait that the `synapse` application crate implements.

pub mod models;
pub mod provider;
pub mod rank;
pub mod store;
pub mod vector;
