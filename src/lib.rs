use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Shared authorization core: one table, one matcher, one decision function.
pub mod decision;
pub mod models;
pub mod permissions;

// Edge enforcement (unverified cookie) and downstream verification.
pub mod auth;
pub mod edge;
pub mod token;

// Client-side enforcement and onboarding.
pub mod auth_api;
pub mod guard;
pub mod navigation;
pub mod onboarding;
pub mod session;

pub mod config;
pub mod error;
pub mod handlers;

pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use decision::{decide, decide_with};
pub use permissions::{PermissionTable, resolve};

/// ApiDoc
///
/// OpenAPI description of the JSON API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_me, handlers::check_access, handlers::list_permissions),
    components(schemas(
        models::Role,
        models::Principal,
        models::Decision,
        models::DenialReason,
        models::PermissionEntry,
    )),
    tags((name = "arena-gate", description = "Route authorization gate"))
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable state for every request: configuration and the compiled
/// Permission Table the edge filter and the API decide against.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub permissions: &'static PermissionTable,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            permissions: PermissionTable::global(),
        }
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles pages, API and docs, puts the edge filter in front of all of
/// them, then applies the observability and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(authenticated::authenticated_routes())
        .nest("/admin", admin::admin_routes());

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .nest("/api", api)
        // Every other path is a page: the edge decides before the shell renders.
        .fallback(handlers::page_shell)
        .layer(middleware::from_fn_with_state(state.clone(), edge::edge_filter))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, correlated by the generated `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
