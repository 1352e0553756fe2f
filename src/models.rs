use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Identity ---

/// Role
///
/// The sole authorization axis besides "authenticated or not".
/// Serialized lowercase on every wire (token payloads, query strings, JSON).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Employer,
    Employee,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Employer, Role::Employee];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employer => "employer",
            Role::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "employer" => Ok(Role::Employer),
            "employee" => Ok(Role::Employee),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Principal
///
/// The decoded identity of the current request or session. The edge builds one
/// from an unverified cookie token, the client from its hydrated session; only
/// `role` is authorization-relevant at the edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Principal {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub profile_complete: bool,
}

impl Principal {
    /// Minimal principal carrying only the fields authorization looks at.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            email: String::new(),
            name: String::new(),
            email_verified: false,
            profile_complete: false,
        }
    }
}

// --- Permission Table ---

/// RoutePermission
///
/// One row of the static Permission Table. `path` is a pattern: literal
/// segments, dynamic segments written `[param]` or `{param}`, and optional
/// `(group)` segments that only mark a layout boundary and never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePermission {
    pub path: &'static str,
    pub allowed_roles: &'static [Role],
    pub requires_auth: bool,
    pub redirect_to: Option<&'static str>,
}

impl RoutePermission {
    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles.is_empty() || self.allowed_roles.contains(&role)
    }
}

/// PermissionEntry
///
/// Owned wire form of a `RoutePermission`, served by the admin permissions endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PermissionEntry {
    pub path: String,
    pub allowed_roles: Vec<Role>,
    pub requires_auth: bool,
    pub redirect_to: Option<String>,
}

impl From<&RoutePermission> for PermissionEntry {
    fn from(entry: &RoutePermission) -> Self {
        Self {
            path: entry.path.to_string(),
            allowed_roles: entry.allowed_roles.to_vec(),
            requires_auth: entry.requires_auth,
            redirect_to: entry.redirect_to.map(str::to_string),
        }
    }
}

// --- Decisions ---

/// DenialReason
///
/// Why a navigation was refused. Unauthenticated denials are recoverable (log
/// in and resume); role mismatches are terminal and carry both roles so the
/// access-denied page can explain them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum DenialReason {
    AuthenticationRequired,
    RoleMismatch { required: Vec<Role>, actual: Role },
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::AuthenticationRequired => f.write_str("authentication required"),
            DenialReason::RoleMismatch { .. } => f.write_str("role mismatch"),
        }
    }
}

/// Decision
///
/// Pure result of evaluating a path against a principal (or the lack of one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export)]
pub enum Decision {
    Allowed,
    Denied {
        reason: DenialReason,
        redirect_to: String,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

// --- Client state slices ---

/// GuardSession
///
/// Transient state owned by the Route Guard for one navigation attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GuardSession {
    pub should_prompt_login: bool,
    pub intended_path: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ModalMode {
    #[default]
    Login,
    Signup,
    Verify,
}

/// ModalState
///
/// Owned by the Onboarding Coordinator. `mode` and `open` together mean at most
/// one of {login/signup, verification} is ever visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ModalState {
    pub mode: ModalMode,
    pub open: bool,
    pub pending_verification_token: Option<String>,
    pub pending_email: Option<String>,
}

impl ModalState {
    pub fn is_auth_modal_open(&self) -> bool {
        self.open && matches!(self.mode, ModalMode::Login | ModalMode::Signup)
    }

    pub fn is_verification_open(&self) -> bool {
        self.open && self.mode == ModalMode::Verify
    }
}

// --- Auth API payloads ---

/// SignupRequest
///
/// Forwarded verbatim to the external Auth API; the password is never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}
