//! Router assembly: HTTP endpoints, the player WebSocket, static files,
//! CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - player WebSocket at `/ws/play/{id}`
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback; the creator and player pages route
    // client-side from index.html.
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // Player WebSocket
        .route("/ws/play/:game_id", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/start", post(http::http_start))
        .route("/api/v1/creator/:game_id", get(http::http_creator))
        .route("/api/v1/chat", post(http::http_chat))
        .route("/api/v1/save_experience", post(http::http_save_experience))
        .route("/api/v1/player/:game_id", get(http::http_player))
        .route("/api/v1/pay/:game_id", post(http::http_pay))
        .route("/api/v1/templates", get(http::http_templates))
        .route("/api/v1/templates/:name", get(http::http_template))
        .route("/api/v1/modules", get(http::http_modules))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
