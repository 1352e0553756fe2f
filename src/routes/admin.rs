use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// The role check happens inside each handler after `AuthUser` verified the token.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/admin/permissions
        // The Permission Table as both enforcement points see it.
        .route("/permissions", get(handlers::list_permissions))
}
