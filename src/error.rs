use thiserror::Error;

/// Failures while reading an unverified cookie token. The edge maps every
/// variant to "anonymous"; none of them reach the user.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token must have three dot-separated segments, found {0}")]
    Malformed(usize),
    #[error("payload segment is not valid base64url")]
    Base64,
    #[error("payload is not valid JSON: {0}")]
    Json(String),
    #[error("payload has no subject")]
    MissingSubject,
    #[error("payload has no expiry")]
    MissingExpiry,
    #[error("token expired at {0}")]
    Expired(i64),
    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

/// Permission Table construction errors, raised once at startup.
#[derive(Debug, Error)]
pub enum PermissionTableError {
    #[error("route '{0}' requires auth but allows no roles")]
    NoRoles(&'static str),
    #[error("route '{path}' failed to compile: {source}")]
    Pattern {
        path: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Session Store lifecycle misuse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a session is already established")]
    AlreadyEstablished,
    #[error("no session is established")]
    NotEstablished,
}

#[derive(Debug, Error)]
pub enum AuthApiError {
    #[error("auth api request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("auth api rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Errors surfaced by the Onboarding Coordinator's submit flows. The modal
/// stays open in its current mode when any of these is returned.
#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error(transparent)]
    Api(#[from] AuthApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("no verification is pending")]
    NoPendingVerification,
}
