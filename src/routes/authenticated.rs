use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every handler here takes `AuthUser`, so a request without a verified token
/// is rejected with 401 before reaching it.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /api/me
        .route("/me", get(handlers::get_me))
        // GET /api/access?path=/competitions/create
        // Server-side decision for the verified principal.
        .route("/access", get(handlers::check_access))
}
