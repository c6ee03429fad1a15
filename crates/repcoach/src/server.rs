use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::SharedVerifier;
use crate::chat::ChatOrchestrator;
use crate::gate::RouteTable;
use crate::handlers;
use crate::store::WorkoutStore;

// ============================================================================
// Application State
// ============================================================================

/// Shared, immutable services handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub verifier: SharedVerifier,
    pub store: Arc<dyn WorkoutStore>,
    pub chat: Arc<ChatOrchestrator>,
    pub keep_alive_interval_seconds: u64,
    pub max_connections: usize,
}

// ============================================================================
// Server Setup
// ============================================================================

pub fn build_app(state: AppState, request_timeout_seconds: u64) -> Router {
    let max_connections = state.max_connections;

    // SSE route: bounded by the chat budget, not the request timeout
    let streaming_routes = Router::new()
        .route("/chat", post(handlers::chat))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/routines", get(handlers::list_routines))
        .route("/workout-programs", get(handlers::list_workout_programs))
        .with_state(state.clone())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_seconds),
        ));

    let api = Router::new()
        .merge(streaming_routes)
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024)); // 2 MB

    // Every page added before `route_layer` is guarded; the login page is not.
    let pages = Router::new()
        .route("/routines", get(handlers::routines_page))
        .route("/programs", get(handlers::programs_page))
        .route_layer(from_fn_with_state(
            state.clone(),
            handlers::require_page_session,
        ))
        .route("/login", get(handlers::login_page))
        .with_state(state.clone());

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .route("/version", get(handlers::version))
        .nest("/api", api)
        .merge(pages)
        .layer(from_fn_with_state(state, handlers::session_gate))
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(max_connections))
}
