use arena_gate::{
    AppConfig, AppState,
    auth::{AuthUser, Claims},
    config::Env,
    models::Role,
};
use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::SystemTime;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: &str = "user-0001";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn create_token(role: Role, exp: u64, secret: &str) -> String {
    let claims = Claims {
        sub: TEST_USER_ID.to_string(),
        user_id: None,
        email: "test@example.com".to_string(),
        role,
        name: "Test User".to_string(),
        exp: exp as usize,
        iat: now() as usize,
        email_verified: true,
        profile_complete: false,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(env: Env) -> AppState {
    let mut config = AppConfig::default();
    config.env = env;
    config.jwt_secret = TEST_JWT_SECRET.to_string();
    AppState::new(config)
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_header(mut parts: Parts, name: header::HeaderName, value: &str) -> Parts {
    parts
        .headers
        .insert(name, header::HeaderValue::from_str(value).unwrap());
    parts
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_bearer_token() {
    let token = create_token(Role::Employer, now() + 3600, TEST_JWT_SECRET);
    let app_state = create_app_state(Env::Production);

    let mut parts = with_header(
        get_request_parts(Method::GET, "/api/me".parse().unwrap()),
        header::AUTHORIZATION,
        &format!("Bearer {token}"),
    );

    let user = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .expect("valid token should authenticate");
    assert_eq!(user.principal.id, TEST_USER_ID);
    assert_eq!(user.role(), Role::Employer);
    assert!(user.principal.email_verified);
}

#[tokio::test]
async fn test_auth_success_with_session_cookie() {
    let token = create_token(Role::Employee, now() + 3600, TEST_JWT_SECRET);
    let app_state = create_app_state(Env::Production);

    let mut parts = with_header(
        get_request_parts(Method::GET, "/api/me".parse().unwrap()),
        header::COOKIE,
        &format!("theme=dark; auth-token={token}"),
    );

    let user = AuthUser::from_request_parts(&mut parts, &app_state).await.unwrap();
    assert_eq!(user.role(), Role::Employee);
}

#[tokio::test]
async fn test_auth_failure_with_missing_credentials() {
    let app_state = create_app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/api/me".parse().unwrap());

    let result = AuthUser::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_wrong_signature() {
    // The edge would accept this payload; the API must not.
    let token = create_token(Role::Admin, now() + 3600, "some-other-secret");
    let app_state = create_app_state(Env::Production);

    let mut parts = with_header(
        get_request_parts(Method::GET, "/api/me".parse().unwrap()),
        header::AUTHORIZATION,
        &format!("Bearer {token}"),
    );

    let result = AuthUser::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_expired_token() {
    // Well past the default 60s leeway.
    let token = create_token(Role::Admin, now() - 3600, TEST_JWT_SECRET);
    let app_state = create_app_state(Env::Production);

    let mut parts = with_header(
        get_request_parts(Method::GET, "/api/me".parse().unwrap()),
        header::AUTHORIZATION,
        &format!("Bearer {token}"),
    );

    let result = AuthUser::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_local_bypass_success() {
    let app_state = create_app_state(Env::Local);

    let parts = get_request_parts(Method::GET, "/api/me".parse().unwrap());
    let parts = with_header(parts, header::HeaderName::from_static("x-user-id"), "dev-1");
    let mut parts = with_header(parts, header::HeaderName::from_static("x-user-role"), "admin");

    let user = AuthUser::from_request_parts(&mut parts, &app_state).await.unwrap();
    assert_eq!(user.principal.id, "dev-1");
    assert_eq!(user.role(), Role::Admin);
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let app_state = create_app_state(Env::Production);

    let parts = get_request_parts(Method::GET, "/api/me".parse().unwrap());
    let parts = with_header(parts, header::HeaderName::from_static("x-user-id"), "dev-1");
    let mut parts = with_header(parts, header::HeaderName::from_static("x-user-role"), "admin");

    let result = AuthUser::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_local_bypass_rejects_unknown_role() {
    let app_state = create_app_state(Env::Local);

    let parts = get_request_parts(Method::GET, "/api/me".parse().unwrap());
    let parts = with_header(parts, header::HeaderName::from_static("x-user-id"), "dev-1");
    let mut parts = with_header(parts, header::HeaderName::from_static("x-user-role"), "root");

    let result = AuthUser::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_success_with_user_id_subject() {
    let claims = serde_json::json!({
        "userId": "user-0002",
        "role": "employee",
        "exp": now() + 3600,
    });
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();
    let app_state = create_app_state(Env::Production);

    let mut parts = with_header(
        get_request_parts(Method::GET, "/api/me".parse().unwrap()),
        header::COOKIE,
        &format!("auth-token={token}"),
    );

    let user = AuthUser::from_request_parts(&mut parts, &app_state).await.unwrap();
    assert_eq!(user.principal.id, "user-0002");
    assert_eq!(user.role(), Role::Employee);
}

#[tokio::test]
async fn test_auth_failure_without_subject() {
    let claims = serde_json::json!({ "role": "admin", "exp": now() + 3600 });
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();
    let app_state = create_app_state(Env::Production);

    let mut parts = with_header(
        get_request_parts(Method::GET, "/api/me".parse().unwrap()),
        header::AUTHORIZATION,
        &format!("Bearer {token}"),
    );

    let result = AuthUser::from_request_parts(&mut parts, &app_state).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}
