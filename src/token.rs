//! Unverified cookie-token decoding for the edge filter.
//!
//! The signature segment is never checked here. This layer only keeps obviously
//! anonymous traffic and coarse role leakage away from protected pages; the API
//! re-verifies tokens with the signing secret (see `auth`).

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde::Deserialize;

use crate::{
    error::TokenError,
    models::{Principal, Role},
};

/// base64url with or without `=` padding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// TokenPayload
///
/// The claims the edge reads from the middle token segment. Issuers disagree on
/// whether the subject lives in `sub` or `userId`; either is accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    pub sub: Option<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub name: String,
    pub exp: Option<i64>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub profile_complete: bool,
}

impl TokenPayload {
    fn into_principal(self, now: i64) -> Result<Principal, TokenError> {
        let exp = self.exp.ok_or(TokenError::MissingExpiry)?;
        if exp <= now {
            return Err(TokenError::Expired(exp));
        }

        let id = self
            .sub
            .or(self.user_id)
            .filter(|id| !id.is_empty())
            .ok_or(TokenError::MissingSubject)?;
        let role: Role = self
            .role
            .parse()
            .map_err(|_| TokenError::UnknownRole(self.role.clone()))?;

        Ok(Principal {
            id,
            role,
            email: self.email,
            name: self.name,
            email_verified: self.email_verified,
            profile_complete: self.profile_complete,
        })
    }
}

/// Splits a `header.payload.signature` token and decodes the payload JSON.
pub fn decode_payload(token: &str) -> Result<TokenPayload, TokenError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(TokenError::Malformed(segments.len()));
    };

    let bytes = PAYLOAD_ENGINE
        .decode(payload)
        .map_err(|_| TokenError::Base64)?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::Json(e.to_string()))
}

/// decode_unverified
///
/// Full edge-side identity extraction: structure, payload, expiry against `now`
/// (seconds since the epoch), subject and role.
pub fn decode_unverified(token: &str, now: i64) -> Result<Principal, TokenError> {
    decode_payload(token)?.into_principal(now)
}

/// Like `decode_unverified`, but every failure collapses to "anonymous".
pub fn principal_from_token(token: &str, now: i64) -> Option<Principal> {
    match decode_unverified(token, now) {
        Ok(principal) => Some(principal),
        Err(error) => {
            tracing::debug!(%error, "treating request as anonymous");
            None
        }
    }
}
