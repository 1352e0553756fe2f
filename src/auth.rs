use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    config::{AppConfig, Env},
    models::{Principal, Role},
};

/// Claims
///
/// Payload of the session token as verified downstream of the edge. The edge
/// filter reads the same payload without checking the signature.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Issuers put the subject in `sub` or `userId`; `sub` wins when both are set,
    /// matching the edge.
    #[serde(default)]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub name: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub profile_complete: bool,
}

impl Claims {
    /// The principal these claims describe, or `None` when no subject is present.
    pub fn into_principal(self) -> Option<Principal> {
        let id = Some(self.sub)
            .filter(|sub| !sub.is_empty())
            .or(self.user_id)
            .filter(|id| !id.is_empty())?;
        Some(Principal {
            id,
            role: self.role,
            email: self.email,
            name: self.name,
            email_verified: self.email_verified,
            profile_complete: self.profile_complete,
        })
    }
}

/// AuthUser
///
/// A principal whose token signature and expiry were verified. API handlers take
/// it as an argument; extraction failure rejects with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal: Principal,
}

impl AuthUser {
    pub fn role(&self) -> Role {
        self.principal.role
    }
}

/// Resolution order:
/// 1. Local bypass: `x-user-id` + `x-user-role` headers, only in `Env::Local`.
/// 2. `Authorization: Bearer <token>`.
/// 3. The session cookie the edge filter reads.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            if let Some(principal) = local_bypass(parts) {
                return Ok(AuthUser { principal });
            }
        }

        let token = bearer_token(parts)
            .or_else(|| {
                CookieJar::from_headers(&parts.headers)
                    .get(&config.cookie_name)
                    .map(|cookie| cookie.value().to_string())
            })
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(&token, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                kind => tracing::debug!(?kind, "rejected invalid token"),
            }
            StatusCode::UNAUTHORIZED
        })?;

        let principal = token_data.claims.into_principal().ok_or_else(|| {
            tracing::debug!("rejected token without subject");
            StatusCode::UNAUTHORIZED
        })?;

        Ok(AuthUser { principal })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn local_bypass(parts: &Parts) -> Option<Principal> {
    let id = parts.headers.get("x-user-id")?.to_str().ok()?;
    let role = parts.headers.get("x-user-role")?.to_str().ok()?.parse().ok()?;
    if id.is_empty() {
        return None;
    }
    Some(Principal::new(id, role))
}
