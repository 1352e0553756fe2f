use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated endpoints. The page-shell fallback is attached in
/// `create_router` so the edge filter wraps it.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /access-denied?required_role=..&user_role=..&attempted_path=..
        // Terminal explanation for authenticated-but-wrong-role navigations.
        .route("/access-denied", get(handlers::access_denied_page))
}
