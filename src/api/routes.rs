//! API route definitions

use super::handlers::{self, ApiState};
use super::note_handlers;
use axum::{
    http::HeaderValue,
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// CORS layer admitting the configured origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the API router
pub fn create_router(state: ApiState, cors_origins: &[String]) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // ====================================================================
        // Projects
        // ====================================================================
        .route("/api/projects", get(note_handlers::list_projects))
        .route(
            "/api/projects/{project}/folders",
            get(note_handlers::get_folder_tree),
        )
        // ====================================================================
        // Experiments
        // ====================================================================
        .route(
            "/api/experiments",
            get(note_handlers::list_experiments).post(note_handlers::create_experiment),
        )
        .route(
            "/api/experiments/{id}",
            get(note_handlers::get_experiment)
                .put(note_handlers::update_experiment)
                .delete(note_handlers::delete_experiment),
        )
        // ====================================================================
        // Search
        // ====================================================================
        .route("/api/search/nodes", get(note_handlers::search_nodes))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}
