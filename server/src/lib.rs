use anyhow::Result;
use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use docsearch_core::persist::{self, DataPaths};
use docsearch_core::{DocId, EngineConfig, Request, RequestError, SearchEngine};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Which evaluation a `POST /search` body asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Query,
    Word,
    Doc,
    PrintWord,
    PrintDoc,
}

impl SearchMode {
    pub fn request(self, value: &str) -> Result<Request, RequestError> {
        let doc_id = || -> Result<DocId, RequestError> {
            value.trim().parse().map_err(|_| RequestError::InvalidDocId(value.to_string()))
        };
        Ok(match self {
            SearchMode::Query => Request::Query(value.to_string()),
            SearchMode::Word => Request::Word(value.to_string()),
            SearchMode::Doc => Request::Document(doc_id()?),
            SearchMode::PrintWord => Request::PrintWord(value.to_string()),
            SearchMode::PrintDoc => Request::PrintDocument(doc_id()?),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    pub query: Option<String>,
    #[serde(default)]
    pub mode: SearchMode,
}

pub type AppState = Arc<SearchEngine>;

type ApiError = (StatusCode, Json<Value>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message.into() })))
}

/// Load the data directory into a shareable engine.
pub fn load_state<P: AsRef<Path>>(data_dir: P, config: EngineConfig) -> Result<AppState> {
    let engine = persist::load_engine(&DataPaths::new(data_dir), config)?;
    tracing::info!(
        terms = engine.index().num_terms(),
        entries = engine.entries().len(),
        documents = engine.documents().len(),
        stemming = config.stemming,
        "engine ready"
    );
    Ok(Arc::new(engine))
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
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", post(search_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub fn build_app<P: AsRef<Path>>(data_dir: P, config: EngineConfig) -> Result<Router> {
    Ok(router(load_state(data_dir, config)?))
}

pub async fn search_handler(
    State(engine): State<AppState>,
    Json(body): Json<SearchBody>,
) -> Result<Json<Value>, ApiError> {
    let query = body.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(bad_request("Query required"));
    }
    let request = body.mode.request(query).map_err(|err| bad_request(err.to_string()))?;
    tracing::debug!(?request, "search");
    let result = engine.run(&request);
    Ok(Json(result.to_json(engine.documents())))
}
