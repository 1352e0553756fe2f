use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::AuthApiError,
    models::{Principal, SignupRequest},
};

/// AuthOutcome
///
/// What a login, signup or verification exchange produced.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuthOutcome {
    Authenticated {
        #[serde(rename = "user")]
        principal: Principal,
    },
    #[serde(rename_all = "camelCase")]
    VerificationRequired { email: String, temp_token: String },
}

/// AuthApi
///
/// The external network collaborator owning login, signup and email
/// verification. Implementations never touch the Session Store; the
/// Onboarding Coordinator populates it from the returned outcome.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome, AuthApiError>;

    async fn signup(&self, request: &SignupRequest) -> Result<AuthOutcome, AuthApiError>;

    async fn verify_email(&self, temp_token: &str, code: &str) -> Result<AuthOutcome, AuthApiError>;
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyBody<'a> {
    temp_token: &'a str,
    code: &'a str,
}

/// HttpAuthApi
///
/// `reqwest` client for the Auth API at `AUTH_API_URL`.
#[derive(Clone)]
pub struct HttpAuthApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize + ?Sized>(&self, route: &str, body: &B) -> Result<AuthOutcome, AuthApiError> {
        let url = format!("{}{route}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "auth api rejected request");
            return Err(AuthApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<AuthOutcome>().await?)
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome, AuthApiError> {
        self.post("/auth/login", &LoginBody { email, password }).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthOutcome, AuthApiError> {
        self.post("/auth/signup", request).await
    }

    async fn verify_email(&self, temp_token: &str, code: &str) -> Result<AuthOutcome, AuthApiError> {
        self.post("/auth/verify-email", &VerifyBody { temp_token, code })
            .await
    }
}
