//! HTTP route handlers for the vector store API.
//!
//! Embeddings arrive already computed; turning text into vectors is the
//! caller's job. Every service call runs on the blocking pool because `add`
//! writes the snapshot to disk while holding the index lock.

use crate::error::VectorStoreError;
use crate::server::AppState;
use crate::service::SearchHit;
use crate::vector::Vector;
use crate::VectorId;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinError;

// --- Request/Response types ---

#[derive(Deserialize)]
pub struct AddRequest {
    pub embedding: Vec<f32>,
    pub text: String,
}

#[derive(Serialize, Deserialize)]
pub struct AddResponse {
    pub id: VectorId,
    pub text: String,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub embedding: Vec<f32>,
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    /// Ids that ranked but had no stored text.
    pub missing: Vec<VectorId>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub vector_count: usize,
    pub dimension: usize,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub total_searches: u64,
    pub total_adds: u64,
    pub failed_adds: u64,
    pub missing_records: u64,
    pub avg_search_latency_us: f64,
    pub p50_search_latency_us: f64,
    pub p95_search_latency_us: f64,
    pub p99_search_latency_us: f64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn store_error(e: VectorStoreError) -> ApiError {
    let status = match &e {
        VectorStoreError::DimensionMismatch { .. }
        | VectorStoreError::InvalidVector { .. }
        | VectorStoreError::InvalidText { .. } => StatusCode::BAD_REQUEST,
        VectorStoreError::ReadOnly => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e)
}

fn join_error(e: JoinError) -> ApiError {
    tracing::error!(error = %e, "blocking task failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal task failure")
}

// --- Router ---

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/add", post(add_vector))
        .route("/search", post(search_vectors))
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

// --- Handlers ---

async fn add_vector(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddRequest>,
) -> Result<(StatusCode, Json<AddResponse>), ApiError> {
    let AddRequest { embedding, text } = req;
    let service = Arc::clone(&state.service);
    let stored_text = text.trim().to_string();

    let result = tokio::task::spawn_blocking(move || service.add(Vector::new(embedding), text))
        .await
        .map_err(join_error)?;

    match result {
        Ok(id) => {
            if let Ok(mut metrics) = state.metrics.write() {
                metrics.record_add();
            }
            Ok((
                StatusCode::CREATED,
                Json(AddResponse {
                    id,
                    text: stored_text,
                }),
            ))
        }
        Err(e) => {
            if let Ok(mut metrics) = state.metrics.write() {
                metrics.record_failed_add();
            }
            Err(store_error(e))
        }
    }
}

async fn search_vectors(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = Vector::new(req.embedding);
    let k = req.k.unwrap_or(state.service.config().default_k);
    let service = Arc::clone(&state.service);

    let start = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || service.search(&query, k))
        .await
        .map_err(join_error)?
        .map_err(store_error)?;
    let elapsed = start.elapsed();

    if let Ok(mut metrics) = state.metrics.write() {
        metrics.record_search(elapsed, outcome.missing.len());
    }

    Ok(Json(SearchResponse {
        results: outcome.hits,
        missing: outcome.missing,
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    let service = Arc::clone(&state.service);
    let stats = tokio::task::spawn_blocking(move || service.stats())
        .await
        .map_err(join_error)?
        .map_err(store_error)?;

    Ok(Json(HealthResponse {
        status: if stats.read_only { "read_only" } else { "ok" }.to_string(),
        vector_count: stats.vector_count,
        dimension: stats.dimension,
    }))
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> Result<Json<MetricsResponse>, ApiError> {
    let metrics = state
        .metrics
        .read()
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "Lock poisoned"))?;

    Ok(Json(MetricsResponse {
        total_searches: metrics.total_searches(),
        total_adds: metrics.total_adds(),
        failed_adds: metrics.failed_adds(),
        missing_records: metrics.missing_records(),
        avg_search_latency_us: metrics.avg_search_latency_us(),
        p50_search_latency_us: metrics.percentile_search_latency_us(50.0),
        p95_search_latency_us: metrics.percentile_search_latency_us(95.0),
        p99_search_latency_us: metrics.percentile_search_latency_us(99.0),
    }))
}
