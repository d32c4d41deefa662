//! HTTP API server.
//!
//! Exposes the knowledge base over a JSON HTTP API. All `/api` routes
//! require a bearer token (see [`crate::auth`]); the caller's user id
//! comes from the token, never from the request body or query string.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `POST`   | `/api/entries` | Create an entry |
//! | `GET`    | `/api/entries` | List the caller's entries, newest first |
//! | `GET`    | `/api/entries/{id}` | Fetch one entry |
//! | `DELETE` | `/api/entries/{id}` | Delete an entry |
//! | `GET`    | `/api/search?q=…&limit=…` | Ranked results plus generated answer |
//! | `GET`    | `/api/stats` | Per-kind entry counts |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unauthorized` (401), `not_found` (404),
//! `upstream_unavailable` (502), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use synapse_core::models::{Entry, EntryStats, NewEntry, SearchResponse};
use synapse_core::provider::ModelProvider;
use synapse_core::store::EntryStore;

use crate::auth::{self, AuthUser};
use crate::config::Config;
use crate::db;
use crate::entries::add_entry;
use crate::migrate;
use crate::provider::create_provider;
use crate::search::search_entries;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers.
///
/// Every client handle lives here, constructed once at startup — nothing
/// is held in process-global singletons.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn EntryStore>,
    pub provider: Arc<dyn ModelProvider>,
    pub auth_secret: Arc<String>,
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and serves until the
/// process is terminated. Schema migrations run on startup (idempotent),
/// so `synapse serve` works against a fresh database path.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    init_tracing();

    let secret = auth::load_secret()?;
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;

    let store: Arc<dyn EntryStore> = Arc::new(SqliteStore::new(pool));
    let provider = create_provider(&config.model)?;

    if !provider.is_enabled() {
        warn!("model provider is disabled; /api/search will reject requests");
    }

    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        provider,
        auth_secret: Arc::new(secret),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route(
            "/api/entries",
            get(handle_list_entries).post(handle_create_entry),
        )
        .route(
            "/api/entries/{id}",
            get(handle_get_entry).delete(handle_delete_entry),
        )
        .route("/api/search", get(handle_search))
        .route("/api/stats", get(handle_stats))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!(bind = %bind_addr, "starting HTTP server");
    println!("Synapse API listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("synapse=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 401 Unauthorized error.
pub(crate) fn unauthorized(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized".to_string(),
        message: message.into(),
    }
}

/// Constructs a 404 Not Found error.
fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// Constructs a 502 error for model-provider failures.
fn upstream_unavailable(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream_unavailable".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 Internal Server Error.
fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Maps pipeline errors to the most appropriate HTTP status. Validation
/// failures signal with fixed phrases ("must not be empty", "not found")
/// so the boundary can categorize without a custom error type.
fn classify_api_error(err: anyhow::Error) -> AppError {
    let msg = format!("{:#}", err);

    if msg.contains("not found") {
        not_found(msg)
    } else if msg.contains("must not be empty")
        || msg.contains("disabled")
        || msg.contains("invalid")
    {
        bad_request(msg)
    } else if msg.contains("provider") || msg.contains("API error") {
        upstream_unavailable(msg)
    } else {
        internal(msg)
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /api/entries ============

/// JSON response body for `POST /api/entries`.
#[derive(Serialize)]
struct CreateEntryResponse {
    id: String,
}

async fn handle_create_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(draft): Json<NewEntry>,
) -> Result<(StatusCode, Json<CreateEntryResponse>), AppError> {
    let entry = add_entry(state.store.as_ref(), state.provider.as_ref(), &user_id, draft)
        .await
        .map_err(classify_api_error)?;

    info!(user = %user_id, entry = %entry.id, kind = %entry.kind, "entry created");

    Ok((
        StatusCode::CREATED,
        Json(CreateEntryResponse { id: entry.id }),
    ))
}

async fn handle_list_entries(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Entry>>, AppError> {
    let entries = state
        .store
        .list_entries(&user_id)
        .await
        .map_err(classify_api_error)?;

    Ok(Json(entries))
}

async fn handle_get_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Entry>, AppError> {
    let entry = state
        .store
        .get_entry(&user_id, &id)
        .await
        .map_err(classify_api_error)?;

    match entry {
        Some(entry) => Ok(Json(entry)),
        None => Err(not_found(format!("entry not found: {}", id))),
    }
}

/// JSON response body for `DELETE /api/entries/{id}`.
#[derive(Serialize)]
struct DeleteEntryResponse {
    deleted: bool,
}

async fn handle_delete_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteEntryResponse>, AppError> {
    let deleted = state
        .store
        .delete_entry(&user_id, &id)
        .await
        .map_err(classify_api_error)?;

    if !deleted {
        return Err(not_found(format!("entry not found: {}", id)));
    }

    Ok(Json(DeleteEntryResponse { deleted: true }))
}

// ============ GET /api/search ============

/// Query parameters for `GET /api/search`.
#[derive(Deserialize)]
struct SearchParams {
    q: String,
    limit: Option<usize>,
}

async fn handle_search(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let top_k = params.limit.unwrap_or(state.config.retrieval.top_k);

    let response = search_entries(
        state.store.as_ref(),
        state.provider.as_ref(),
        &user_id,
        &params.q,
        top_k,
    )
    .await
    .map_err(classify_api_error)?;

    info!(
        user = %user_id,
        results = response.results.len(),
        "search served"
    );

    Ok(Json(response))
}

// ============ GET /api/stats ============

async fn handle_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<EntryStats>, AppError> {
    let stats = state
        .store
        .count_by_kind(&user_id)
        .await
        .map_err(classify_api_error)?;

    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_classify_validation_as_bad_request() {
        let err = classify_api_error(anyhow!("content must not be empty"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "bad_request");
    }

    #[test]
    fn test_classify_missing_as_not_found() {
        let err = classify_api_error(anyhow!("entry not found: abc"));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_classify_provider_failure_as_upstream() {
        let base = anyhow!("API error 503: overloaded");
        let err = classify_api_error(base.context("embedding provider request failed"));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.code, "upstream_unavailable");
    }

    #[test]
    fn test_classify_disabled_provider_as_bad_request() {
        let err = classify_api_error(anyhow!(
            "model provider is disabled; search requires an embedding provider"
        ));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_classify_unknown_as_internal() {
        let err = classify_api_error(anyhow!("database is on fire"));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "internal");
    }
}
