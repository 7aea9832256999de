use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{extract::{Path, Query, State}, routing::{get, post}, Json, Router};
use retriever::{Bm25Params, DocId, Retriever};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;

pub use config::Args;
pub use error::ApiError;

#[derive(Deserialize)]
pub struct ContextRequest {
    pub query: String,
    /// Signed so that a negative count reaches validation instead of failing
    /// deserialization.
    #[serde(default)]
    pub top_k: Option<i64>,
}

#[derive(Serialize)]
pub struct ContextResponse {
    pub contexts: Vec<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub k: Option<i64>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub content: String,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub doc_id: DocId,
    pub content: String,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub num_docs: usize,
    pub num_terms: usize,
    pub avg_doc_len: f64,
    #[serde(flatten)]
    pub bm25: Bm25Params,
}

#[derive(Clone)]
pub struct AppState {
    pub retriever: Arc<Retriever>,
    pub default_top_k: usize,
}

pub fn build_app(retriever: Arc<Retriever>, default_top_k: usize) -> Router {
    let app_state = AppState { retriever, default_top_k };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/get_contexts/", post(get_contexts))
        .route("/get_contexts", post(get_contexts))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/stats", get(stats_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Shared `top_k` validation for every route that ranks passages.
fn result_count(requested: Option<i64>, default_top_k: usize) -> Result<usize, ApiError> {
    match requested {
        None => Ok(default_top_k),
        Some(k) if k < 0 => Err(ApiError::BadRequest(format!("top_k must be >= 0, got {k}"))),
        Some(k) => Ok(usize::try_from(k).unwrap_or(usize::MAX)),
    }
}

pub async fn get_contexts(State(state): State<AppState>, payload: Result<Json<ContextRequest>, JsonRejection>) -> Result<Json<ContextResponse>, ApiError> {
    let Json(req) = payload?;
    let k = result_count(req.top_k, state.default_top_k)?;
    let top_k = i64::try_from(k).unwrap_or(i64::MAX);
    let contexts = state.retriever.retrieve(&req.query, top_k)?;
    tracing::debug!(query = %req.query, top_k, returned = contexts.len(), "contexts");
    Ok(Json(ContextResponse { contexts }))
}

pub async fn search_handler(State(state): State<AppState>, params: Result<Query<SearchParams>, QueryRejection>) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params?;
    let start = std::time::Instant::now();
    let k = result_count(params.k, state.default_top_k)?;
    let outcome = state.retriever.search(&params.q, k)?;

    let mut results = Vec::with_capacity(outcome.hits.len());
    for hit in outcome.hits {
        if let Some(doc) = state.retriever.document(hit.doc_id) {
            results.push(SearchHit { doc_id: hit.doc_id, score: hit.score, content: doc.content.clone() });
        }
    }

    let took_ms = start.elapsed().as_millis();
    tracing::debug!(query = %params.q, k, total_hits = outcome.total_hits, took_ms = took_ms as u64, "search");
    Ok(Json(SearchResponse { query: params.q, took_ms, total_hits: outcome.total_hits, results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<DocResponse>, ApiError> {
    match state.retriever.document(doc_id) {
        Some(doc) => Ok(Json(DocResponse { doc_id: doc.id, content: doc.content.clone() })),
        None => Err(ApiError::NotFound(format!("no passage with id {doc_id}"))),
    }
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let index = state.retriever.index();
    Json(StatsResponse {
        num_docs: index.num_docs(),
        num_terms: index.num_terms(),
        avg_doc_len: index.avg_doc_length(),
        bm25: state.retriever.params(),
    })
}
