use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sift_core::{
    BuildError, BuildSummary, RawDocument, ScoringMode, SearchEngine, SearchError,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_k")]
    pub k: i64,
    #[serde(default)]
    pub mode: Option<String>,
}
fn default_k() -> i64 { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub ids: Vec<String>,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub ready: bool,
    pub documents: u32,
    pub terms: usize,
    pub average_document_length: f64,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub admin_token: Option<String>,
}

/// Error body shared by every endpoint: `{"error": kind, "message": text}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    fn unauthorized(message: &str) -> Self {
        ApiError { status: StatusCode::UNAUTHORIZED, kind: "unauthorized", message: message.into() }
    }

    fn internal(message: String) -> Self {
        ApiError { status: StatusCode::INTERNAL_SERVER_ERROR, kind: "internal", message }
    }
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        let status = match e {
            SearchError::QuerySyntax(_) | SearchError::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            SearchError::IndexUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        ApiError { status, kind: e.kind(), message: e.to_string() }
    }
}

impl From<BuildError> for ApiError {
    fn from(e: BuildError) -> Self {
        let status = match e {
            BuildError::MalformedDocument { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BuildError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError { status, kind: e.kind(), message: e.to_string() }
    }
}

/// Query strings that do not deserialize (`k=abc`) are bad search arguments.
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_argument",
            message: rejection.body_text(),
        }
    }
}

/// A body that parses as JSON but not as documents is a malformed document;
/// a missing content type or unreadable body is a bad request.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let (status, kind) = match &rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "malformed_document")
            }
            _ => (rejection.status(), "invalid_argument"),
        };
        ApiError { status, kind, message: rejection.body_text() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.kind, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Router over an engine, taking the admin token and CORS origins from the
/// environment.
pub fn build_app(engine: Arc<SearchEngine>) -> Router {
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    router(AppState { engine, admin_token })
}

pub fn router(state: AppState) -> Router {
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
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/stats", get(stats_handler))
        .route("/index", post(index_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = query?;
    let start = std::time::Instant::now();
    let mode: ScoringMode = match params.mode.as_deref() {
        Some(m) => m.parse()?,
        None => ScoringMode::default(),
    };
    // negative k is as invalid as zero
    let k = usize::try_from(params.k).unwrap_or(0);
    let hits = state.engine.search_scored(mode, k, &params.q)?;

    let ids = hits.iter().map(|h| h.id.clone()).collect();
    let results: Vec<SearchHit> =
        hits.into_iter().map(|h| SearchHit { id: h.id, score: h.score }).collect();
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        mode: mode.to_string(),
        took_s: elapsed.as_secs_f64(),
        total_hits: results.len(),
        ids,
        results,
    }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = match state.engine.store().snapshot() {
        Ok(seg) => StatsResponse {
            ready: true,
            documents: seg.document_count(),
            terms: seg.term_count(),
            average_document_length: seg.average_document_length(),
        },
        Err(_) => StatsResponse {
            ready: false,
            documents: 0,
            terms: 0,
            average_document_length: 0.0,
        },
    };
    Json(stats)
}

/// Replace the active index with one built from the posted documents.
pub async fn index_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Vec<RawDocument>>, JsonRejection>,
) -> Result<Json<BuildSummary>, ApiError> {
    authorize(&state, &headers)?;
    let Json(docs) = body?;
    let engine = Arc::clone(&state.engine);
    let summary = tokio::task::spawn_blocking(move || engine.build_index(docs))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))??;
    Ok(Json(summary))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError::unauthorized("ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::unauthorized("invalid admin token"))
    }
}
