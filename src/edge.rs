//! Edge filter: cheap, request-time enforcement before any page renders.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;

use crate::{
    AppState,
    decision::decide_with,
    models::{Decision, DenialReason, Principal},
    permissions::{PermissionTable, normalize_path},
    token,
};

pub const AUTH_REQUIRED_REDIRECT: &str = "/?auth=required";
pub const UNAUTHORIZED_REDIRECT: &str = "/?error=unauthorized";

/// Framework, asset and API prefixes. API routes re-verify identity themselves.
const BYPASS_PREFIXES: &[&str] = &[
    "/_next",
    "/static",
    "/assets",
    "/api",
    "/api-docs",
    "/swagger-ui",
];

const PUBLIC_PATHS: &[&str] = &[
    "/",
    "/health",
    "/favicon.ico",
    "/about",
    "/competitions",
    "/access-denied",
    "/login",
    "/signup",
    "/verify-email",
];

static COMPETITION_DETAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/competitions/[^/]+/?$").expect("competition detail pattern is valid")
});

/// What the edge does with one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeVerdict {
    Pass,
    Redirect(&'static str),
}

/// is_allow_listed
///
/// Paths that skip token inspection entirely. A single-level competition detail
/// page is public unless its segment is itself a declared route
/// (`/competitions/create`). Checked against the normalized path, so variants
/// of a protected path never slip through as public.
pub fn is_allow_listed(table: &PermissionTable, path: &str) -> bool {
    let path = normalize_path(path);
    let path = path.as_str();
    if PUBLIC_PATHS.contains(&path) {
        return true;
    }
    if BYPASS_PREFIXES
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{prefix}/")))
    {
        return true;
    }
    COMPETITION_DETAIL.is_match(path) && table.resolve(path).is_none()
}

/// edge_verdict
///
/// Reduced decision for the edge: it reuses the shared matcher but ignores the
/// entry-specific fallbacks and only knows two redirect targets.
pub fn edge_verdict(table: &PermissionTable, path: &str, principal: Option<&Principal>) -> EdgeVerdict {
    match decide_with(table, path, principal) {
        Decision::Allowed => EdgeVerdict::Pass,
        Decision::Denied {
            reason: DenialReason::AuthenticationRequired,
            ..
        } => EdgeVerdict::Redirect(AUTH_REQUIRED_REDIRECT),
        Decision::Denied {
            reason: DenialReason::RoleMismatch { .. },
            ..
        } => EdgeVerdict::Redirect(UNAUTHORIZED_REDIRECT),
    }
}

/// edge_filter
///
/// Axum middleware applied to every page request. Token problems (missing,
/// malformed, expired, unknown role) all degrade to "anonymous"; this function
/// never fails a request, it either passes it through or redirects.
pub async fn edge_filter(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    if is_allow_listed(state.permissions, &path) {
        return next.run(request).await;
    }

    let principal = jar
        .get(&state.config.cookie_name)
        .and_then(|cookie| token::principal_from_token(cookie.value(), Utc::now().timestamp()));

    match edge_verdict(state.permissions, &path, principal.as_ref()) {
        EdgeVerdict::Pass => {
            tracing::debug!(%path, authenticated = principal.is_some(), "edge pass");
            next.run(request).await
        }
        EdgeVerdict::Redirect(target) => {
            tracing::info!(
                %path,
                role = principal.as_ref().map(|p| p.role.as_str()),
                %target,
                "edge redirect"
            );
            Redirect::temporary(target).into_response()
        }
    }
}
