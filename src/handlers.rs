use crate::{
    AppState,
    auth::AuthUser,
    decision::decide_with,
    models::{Decision, PermissionEntry, Principal, Role},
};
use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::Html,
};
use serde::Deserialize;

// --- Query Structs ---

/// AccessQuery
///
/// The path a client wants to reconcile against the server's view of its principal.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct AccessQuery {
    pub path: String,
}

/// AccessDeniedQuery
///
/// Parameters produced by the client redirect contract. All optional: the page
/// still renders a generic explanation when they are missing or garbled.
#[derive(Deserialize, Default)]
pub struct AccessDeniedQuery {
    pub required_role: Option<String>,
    pub user_role: Option<String>,
    pub attempted_path: Option<String>,
}

// --- API Handlers ---

/// get_me
///
/// [Authenticated Route] The verified principal behind the request.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Verified principal", body = Principal),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_me(AuthUser { principal }: AuthUser) -> Json<Principal> {
    Json(principal)
}

/// check_access
///
/// [Authenticated Route] Runs the same decision the edge and the client guard
/// run, but for the signature-verified principal.
#[utoipa::path(
    get,
    path = "/api/access",
    params(AccessQuery),
    responses((status = 200, description = "Decision for the path", body = Decision))
)]
pub async fn check_access(
    AuthUser { principal }: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AccessQuery>,
) -> Json<Decision> {
    let decision = decide_with(state.permissions, &query.path, Some(&principal));
    tracing::debug!(
        path = %query.path,
        role = %principal.role,
        allowed = decision.is_allowed(),
        "access check"
    );
    Json(decision)
}

/// list_permissions
///
/// [Admin Route] The Permission Table in declaration order.
#[utoipa::path(
    get,
    path = "/api/admin/permissions",
    responses(
        (status = 200, description = "Permission table", body = [PermissionEntry]),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_permissions(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PermissionEntry>>, StatusCode> {
    if user.role() != Role::Admin {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.permissions.entries().map(PermissionEntry::from).collect()))
}

// --- Page Handlers ---

/// access_denied_page
///
/// [Public Route] Terminal explanation for role mismatches: which role the page
/// needs and which one the user has. Never redirects anywhere.
pub async fn access_denied_page(Query(query): Query<AccessDeniedQuery>) -> (StatusCode, Html<String>) {
    let describe = |value: Option<String>| {
        value
            .and_then(|raw| {
                raw.split(',')
                    .map(|role| role.parse::<Role>().ok())
                    .collect::<Option<Vec<_>>>()
            })
            .filter(|roles| !roles.is_empty())
            .map(|roles| roles.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(" or "))
            .unwrap_or_else(|| "unknown".to_string())
    };

    let required = describe(query.required_role);
    let actual = describe(query.user_role);
    let attempted = query
        .attempted_path
        .as_deref()
        .map(escape_html)
        .unwrap_or_else(|| "this page".to_string());

    let body = format!(
        "<!doctype html><html><head><title>Access denied</title></head><body>\
         <main><h1>Access denied</h1>\
         <p>You tried to open <code>{attempted}</code>.</p>\
         <p>It requires the <strong>{required}</strong> role; you are signed in as <strong>{actual}</strong>.</p>\
         <p><a href=\"/\">Back to the homepage</a></p></main></body></html>"
    );
    (StatusCode::FORBIDDEN, Html(body))
}

/// page_shell
///
/// [Fallback] Every page request that survived the edge filter receives the
/// application shell; the client hydrates it and re-checks the route.
pub async fn page_shell(uri: Uri) -> Html<String> {
    let path = escape_html(uri.path());
    Html(format!(
        "<!doctype html><html><head><title>Arena</title></head>\
         <body><div id=\"app\" data-route=\"{path}\"></div><script type=\"module\" src=\"/assets/app.js\"></script></body></html>"
    ))
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
