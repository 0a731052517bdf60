use anyhow::Result;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{extract::{Path, Query, State}, http::StatusCode, response::{IntoResponse, Response}, routing::get, Json, Router};
use search_core::{Corpus, CorpusOptions, DocId, Index, IndexConfig, QueryError, SearchEngine, SearchHit};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const MAX_TOP_K: usize = 50;

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_top_k")]
    pub k: usize,
}
fn default_top_k() -> usize { 5 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub total_results: usize,
    pub took_s: f64,
    pub results: Vec<SearchResult>,
}

#[derive(Serialize)]
pub struct SearchResult {
    pub rank: usize,
    pub doc_id: DocId,
    pub score: f32,
    pub tweet: String,
    pub cleaned_tweet: String,
}

impl From<SearchHit> for SearchResult {
    fn from(hit: SearchHit) -> Self {
        Self { rank: hit.rank, doc_id: hit.doc_id, score: hit.score, tweet: hit.text, cleaned_tweet: hit.cleaned_text }
    }
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub total_documents: usize,
    pub vocabulary_size: usize,
    pub tfidf_shape: (usize, usize),
    pub max_features: usize,
    pub min_df: u32,
    pub max_df: f64,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub total_tweets: usize,
}

#[derive(Debug)]
pub enum ApiError {
    Invalid(String),
    NotReady,
    BuildFailed(String),
    NotFound(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self { ApiError::Invalid(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self { ApiError::Invalid(rejection.body_text()) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Invalid(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::NotReady => (StatusCode::SERVICE_UNAVAILABLE, "search engine not initialized, please retry shortly".to_string()),
            ApiError::BuildFailed(reason) => (StatusCode::INTERNAL_SERVER_ERROR, format!("search engine failed to initialize: {reason}")),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
}

impl AppState {
    fn reject(&self, err: QueryError) -> ApiError {
        match err {
            QueryError::IndexNotReady => ApiError::NotReady,
            QueryError::BuildFailed => ApiError::BuildFailed(self.engine.failure().unwrap_or("unknown error").to_string()),
            QueryError::InvalidTopK(_) => ApiError::Invalid(err.to_string()),
        }
    }
}

/// Where the corpus comes from and how to index it.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub corpus_path: PathBuf,
    pub corpus: CorpusOptions,
    pub index: IndexConfig,
}

/// Load the corpus, build the index and publish it. Blocking.
pub fn load_and_publish(engine: &SearchEngine, settings: &BuildSettings) -> Result<()> {
    settings.index.validate()?;
    let corpus = Corpus::load(&settings.corpus_path, &settings.corpus)?;
    let index = Index::build_or_empty(corpus.texts(), settings.index)?;
    engine.publish(index, corpus)?;
    Ok(())
}

/// Run `load_and_publish` off the async runtime so the listener can serve
/// health checks (and 503s) while the index is built. A failed build is
/// recorded on the engine so `/` and `/health` report it.
pub fn spawn_index_build(engine: Arc<SearchEngine>, settings: BuildSettings) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        if let Err(err) = load_and_publish(&engine, &settings) {
            tracing::error!(error = %err, corpus = %settings.corpus_path.display(), "index build failed");
            engine.fail(format!("{err:#}"));
        }
    })
}

pub fn build_app(engine: Arc<SearchEngine>) -> Router {
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
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/search", get(search_get_handler).post(search_handler))
        .route("/stats", get(stats_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(AppState { engine })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn root_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    if state.engine.is_ready() {
        Json(StatusResponse { status: "healthy", message: "tweet search API is running".into() })
    } else if let Some(reason) = state.engine.failure() {
        Json(StatusResponse { status: "failed", message: format!("search engine failed to initialize: {reason}") })
    } else {
        Json(StatusResponse { status: "initializing", message: "search engine is still loading".into() })
    }
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    match state.engine.corpus() {
        Ok(corpus) => Json(HealthResponse { status: "ok", total_tweets: corpus.len() }),
        Err(QueryError::BuildFailed) => Json(HealthResponse { status: "failed", total_tweets: 0 }),
        Err(_) => Json(HealthResponse { status: "loading", total_tweets: 0 }),
    }
}

pub async fn search_handler(State(state): State<AppState>, req: Result<Json<SearchRequest>, JsonRejection>) -> Result<Json<SearchResponse>, ApiError> {
    let Json(req) = req?;
    run_search(&state, req.query, req.top_k).map(Json)
}

pub async fn search_get_handler(State(state): State<AppState>, params: Result<Query<SearchParams>, QueryRejection>) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params?;
    run_search(&state, params.q, params.k).map(Json)
}

fn run_search(state: &AppState, query: String, top_k: usize) -> Result<SearchResponse, ApiError> {
    let start = Instant::now();
    if query.is_empty() {
        return Err(ApiError::Invalid("query must not be empty".into()));
    }
    if !(1..=MAX_TOP_K).contains(&top_k) {
        return Err(ApiError::Invalid(format!("top_k must be between 1 and {MAX_TOP_K}, got {top_k}")));
    }
    // Zero-score documents are padding from the ranker, not matches.
    let results: Vec<SearchResult> = state
        .engine
        .search(&query, top_k)
        .map_err(|e| state.reject(e))?
        .into_iter()
        .filter(|hit| hit.score > 0.0)
        .map(SearchResult::from)
        .collect();
    let elapsed = start.elapsed();
    tracing::info!(query = %query, top_k, hits = results.len(), took_ms = elapsed.as_millis() as u64, "search");
    Ok(SearchResponse { query, total_results: results.len(), took_s: elapsed.as_secs_f64(), results })
}

pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.engine.stats().map_err(|e| state.reject(e))?;
    Ok(Json(StatsResponse {
        total_documents: stats.document_count,
        vocabulary_size: stats.vocabulary_size,
        tfidf_shape: (stats.document_count, stats.vocabulary_size),
        max_features: stats.max_vocabulary_size,
        min_df: stats.min_document_frequency,
        max_df: stats.max_document_frequency_ratio,
    }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<u32>) -> Result<Json<serde_json::Value>, ApiError> {
    match state.engine.document_text(doc_id).map_err(|e| state.reject(e))? {
        Some(text) => Ok(Json(serde_json::json!({ "doc_id": doc_id, "tweet": text }))),
        None => Err(ApiError::NotFound(format!("document {doc_id} not found"))),
    }
}
