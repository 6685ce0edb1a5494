//! HTTP API server for the concept mapping service.
//!
//! Binds first and ingests while serving, so early requests get a 503 until
//! the index is ready.

use super::ingest::prepare_orchestrator;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::ConceptMapError;
use crate::rag::{ConceptMapper, ContextChunk};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    mapper: ConceptMapper,
}

impl AppState {
    pub fn new(mapper: ConceptMapper) -> Self {
        Self { mapper }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/map", post(map))
        .route("/search", post(search))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = prepare_orchestrator(settings)?;
    let app = router(AppState::new(orchestrator.mapper()));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("conceptmap API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Map concepts", "POST /map");
    Output::kv("Search", "POST /search");
    println!();

    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    Output::info("Indexing documents, /map answers 503 until this finishes...");
    match orchestrator.ingest().await {
        Ok(report) => {
            Output::success(&format!(
                "Indexed {} chunks from {} documents",
                report.chunks, report.documents
            ));
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            server.abort();
            return Err(e.into());
        }
    }
    Output::info("Press Ctrl+C to stop the server.");

    server.await??;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct MapRequest {
    transcript: String,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    5
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<ContextChunk>,
}

/// Library error rendered as an HTTP response.
struct ApiError(ConceptMapError);

impl From<ConceptMapError> for ApiError {
    fn from(e: ConceptMapError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ConceptMapError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            ConceptMapError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ConceptMapError::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match self.0.raw_response() {
            Some(raw) => json!({ "message": self.0.to_string(), "raw_response": raw }),
            None => json!({ "message": self.0.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

// === Handlers ===

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "index": state.mapper.gate().status() }))
}

async fn map(State(state): State<AppState>, payload: Result<Json<MapRequest>, JsonRejection>) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("map_request", %request_id);

    let mut response = async move {
        let transcript = match payload {
            Ok(Json(req)) => req.transcript,
            Err(rejection) => {
                // Readiness is reported before body problems.
                if let Err(e) = state.mapper.gate().ready() {
                    return ApiError(e).into_response();
                }
                warn!("Rejected /map body: {}", rejection.body_text());
                return ApiError(ConceptMapError::InvalidInput(
                    "Transcript segment is required for concept mapping.".to_string(),
                ))
                .into_response();
            }
        };

        match state.mapper.map_concepts(&transcript).await {
            Ok(mapping) => {
                info!("Returning {} concepts", mapping.concepts.len());
                Json(mapping.concepts).into_response()
            }
            Err(e) => ApiError(e).into_response(),
        }
    }
    .instrument(span)
    .await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(req) = payload
        .map_err(|rejection| ConceptMapError::InvalidInput(format!("Invalid search request: {}", rejection.body_text())))?;

    let context = state.mapper.retrieve(&req.query, req.limit).await?;
    Ok(Json(SearchResponse {
        results: context.into_chunks(),
    }))
}
