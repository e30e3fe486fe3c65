use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{RawQuery, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};
use url::form_urlencoded;

use crate::config::Config;
use crate::error::QueryError;
use crate::search::{MatchMode, QueryEngine, SearchOptions};

pub const MISSING_QUERY_MESSAGE: &str = "missing search query in URL params";
pub const ENCODING_FAILURE_MESSAGE: &str = "encoding failure";
pub const INDEX_UNAVAILABLE_MESSAGE: &str = "search index unavailable";
pub const SEARCH_FAILURE_MESSAGE: &str = "search failure";

/// State shared by all request handlers
pub struct AppState {
    pub engine: Arc<QueryEngine>,
    /// Mode used when a request has no `fuzzy` parameter
    pub default_mode: MatchMode,
}

/// Parameters of a `/search` request.
///
/// Parsed leniently: the first occurrence of a key wins and values that do
/// not parse fall back to their defaults, so a bad `from` never hides a
/// missing `q`.
#[derive(Debug, Default)]
pub struct SearchParams {
    pub q: Option<String>,
    pub fuzzy: Option<bool>,
    pub from: Option<usize>,
    pub size: Option<usize>,
}

impl SearchParams {
    pub fn parse(raw: Option<&str>) -> Self {
        let mut params = Self::default();
        let raw = raw.unwrap_or_default();

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "q" if params.q.is_none() => params.q = Some(value.into_owned()),
                "fuzzy" if params.fuzzy.is_none() => params.fuzzy = parse_flag(&value),
                "from" if params.from.is_none() => params.from = value.trim().parse().ok(),
                "size" if params.size.is_none() => params.size = value.trim().parse().ok(),
                _ => {}
            }
        }
        params
    }

    fn options(&self, default_mode: MatchMode) -> SearchOptions {
        let mode = match self.fuzzy {
            Some(true) => MatchMode::Fuzzy,
            Some(false) => MatchMode::Exact,
            None => default_mode,
        };
        SearchOptions {
            mode,
            from: self.from.unwrap_or(0),
            size: self.size,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `/search` plus static files for every other path
pub fn create_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/search", get(handle_search))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

/// Bind the configured port and serve until Ctrl+C
pub async fn serve(config: &Config, engine: Arc<QueryEngine>) -> Result<()> {
    let state = AppState {
        engine,
        default_mode: config.default_mode(),
    };
    let app = create_router(state, &config.static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;

    info!("Listening on port {}...", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

pub async fn handle_search(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> Response {
    let params = SearchParams::parse(raw.as_deref());
    let options = params.options(state.default_mode);
    let Some(query) = params.q.filter(|q| !q.is_empty()) else {
        return (StatusCode::BAD_REQUEST, MISSING_QUERY_MESSAGE).into_response();
    };

    let engine = Arc::clone(&state.engine);
    let outcome = tokio::task::spawn_blocking(move || engine.search(&query, &options)).await;

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(QueryError::IndexUnavailable(e))) => {
            error!("Search rejected, index unavailable: {}", e);
            return (StatusCode::SERVICE_UNAVAILABLE, INDEX_UNAVAILABLE_MESSAGE).into_response();
        }
        Ok(Err(e)) => {
            error!("Search failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, SEARCH_FAILURE_MESSAGE).into_response();
        }
        Err(e) => {
            error!("Search task panicked: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, SEARCH_FAILURE_MESSAGE).into_response();
        }
    };

    match serde_json::to_vec(&result.to_lines()) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!("Failed to encode search response: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, ENCODING_FAILURE_MESSAGE).into_response()
        }
    }
}
