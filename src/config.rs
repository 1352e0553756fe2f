use std::env;

pub const DEFAULT_COOKIE_NAME: &str = "auth-token";
const LOCAL_JWT_SECRET: &str = "arena-gate-local-development-secret";
const LOCAL_AUTH_API_URL: &str = "http://localhost:8080";

/// AppConfig
///
/// Immutable configuration resolved once at startup and shared with the edge
/// filter and the `AuthUser` extractor through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the local header bypass and log format.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Name of the cookie carrying the session token.
    pub cookie_name: String,
    // HS256 secret used by the API to verify tokens the edge only peeks at.
    pub jwt_secret: String,
    // Base URL of the external Auth API (login, signup, email verification).
    pub auth_api_url: String,
}

/// Env
///
/// Runtime context: `Local` enables development conveniences, `Production`
/// demands every secret explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:3000".to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            auth_api_url: LOCAL_AUTH_API_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads configuration from the environment.
    ///
    /// # Panics
    /// Panics in production when `JWT_SECRET` or `AUTH_API_URL` is missing, so the
    /// gate never starts with an unverifiable API surface.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").unwrap_or_default().as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let cookie_name = env::var("AUTH_COOKIE_NAME")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());

        let (jwt_secret, auth_api_url) = match env {
            Env::Production => (
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production."),
                env::var("AUTH_API_URL").expect("FATAL: AUTH_API_URL must be set in production."),
            ),
            Env::Local => (
                env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                env::var("AUTH_API_URL").unwrap_or_else(|_| LOCAL_AUTH_API_URL.to_string()),
            ),
        };

        Self {
            env,
            bind_addr,
            cookie_name,
            jwt_secret,
            auth_api_url,
        }
    }
}
