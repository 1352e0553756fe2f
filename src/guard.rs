//! Client Route Guard: the post-hydration re-check of every navigation.
//!
//! Expressed as an explicit state machine driven by two inputs, the current
//! path and the current principal. The modal `open` flag only gates resumption.

use crate::{
    decision::decide_with,
    models::{Decision, GuardSession, Principal, Role},
    permissions::PermissionTable,
    session::SessionSnapshot,
};

/// Public default used when an unauthenticated prompt is dismissed.
pub const PUBLIC_DEFAULT_PATH: &str = "/";

/// Where a freshly authenticated user lands when no navigation was interrupted.
pub fn landing_path(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin",
        Role::Employer => "/employer",
        Role::Employee => "/competitions",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    Idle,
    AwaitingAuth,
}

/// GuardAction
///
/// The imperative effect the caller must apply after an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardAction {
    /// Inputs identical to the last evaluation; nothing to do.
    Unchanged,
    /// Session not hydrated yet, or resumption is waiting for the modal to close.
    Deferred,
    /// Render the page.
    Allow,
    /// Authenticated but denied: client-side redirect.
    Redirect(String),
    /// Anonymous and denied: ask the Coordinator to prompt for login.
    PromptLogin,
    /// Just authenticated: continue to the interrupted (or landing) path.
    Resume(String),
    /// Prompt dismissed while anonymous: leave the protected page.
    ReturnToPublic(String),
}

/// RouteGuard
///
/// Owns the `GuardSession` exclusively. Evaluation is keyed on `(path, principal)`:
/// re-running with the same inputs is a no-op, so hydration, navigation and
/// modal events can arrive in any order and any number of times.
#[derive(Debug)]
pub struct RouteGuard {
    table: &'static PermissionTable,
    phase: GuardPhase,
    session: GuardSession,
    last_inputs: Option<(String, Option<Principal>)>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::with_table(PermissionTable::global())
    }

    pub fn with_table(table: &'static PermissionTable) -> Self {
        Self {
            table,
            phase: GuardPhase::Idle,
            session: GuardSession::default(),
            last_inputs: None,
        }
    }

    pub fn phase(&self) -> GuardPhase {
        self.phase
    }

    pub fn session(&self) -> &GuardSession {
        &self.session
    }

    pub fn should_prompt_login(&self) -> bool {
        self.session.should_prompt_login
    }

    /// evaluate
    ///
    /// Runs the transition function for `path` under `session`. `modal_open` is
    /// the Coordinator's flag; it is only consulted to hold back resumption.
    pub fn evaluate(&mut self, path: &str, session: &SessionSnapshot, modal_open: bool) -> GuardAction {
        if !session.hydrated {
            return GuardAction::Deferred;
        }

        let principal = session.current_principal().cloned();
        if self
            .last_inputs
            .as_ref()
            .is_some_and(|(last_path, last_principal)| last_path == path && *last_principal == principal)
        {
            return GuardAction::Unchanged;
        }

        if self.phase == GuardPhase::AwaitingAuth {
            if let Some(principal) = &principal {
                if modal_open {
                    // Inputs stay unrecorded so the modal-close re-evaluation resumes.
                    tracing::debug!(%path, "resumption deferred until the modal closes");
                    return GuardAction::Deferred;
                }
                let target = self
                    .session
                    .intended_path
                    .take()
                    .unwrap_or_else(|| landing_path(principal.role).to_string());
                self.reset();
                // The resumed target still needs a full decision for the new principal.
                self.last_inputs = None;
                tracing::debug!(%target, "resuming after authentication");
                return GuardAction::Resume(target);
            }
        }

        self.last_inputs = Some((path.to_string(), principal.clone()));

        // Query and fragment never take part in matching.
        let route = path.split(['?', '#']).next().unwrap_or(path);

        match decide_with(self.table, route, principal.as_ref()) {
            Decision::Allowed => {
                self.reset();
                GuardAction::Allow
            }
            Decision::Denied { redirect_to, reason } if principal.is_some() => {
                tracing::debug!(%route, %reason, %redirect_to, "guard redirect");
                self.reset();
                GuardAction::Redirect(redirect_to)
            }
            Decision::Denied { reason, .. } => {
                // Only the most recent denied navigation is remembered; the root
                // is never an intended destination.
                self.session.intended_path = (route != PUBLIC_DEFAULT_PATH).then(|| path.to_string());
                self.session.should_prompt_login = true;
                self.phase = GuardPhase::AwaitingAuth;
                tracing::debug!(%path, %reason, "prompting for login");
                GuardAction::PromptLogin
            }
        }
    }

    /// dismiss
    ///
    /// The user closed the login prompt without authenticating. Clearing is the
    /// only other way out of `AwaitingAuth`.
    pub fn dismiss(&mut self) -> GuardAction {
        if self.phase != GuardPhase::AwaitingAuth {
            return GuardAction::Unchanged;
        }
        self.reset();
        self.last_inputs = None;
        GuardAction::ReturnToPublic(PUBLIC_DEFAULT_PATH.to_string())
    }

    fn reset(&mut self) {
        self.phase = GuardPhase::Idle;
        self.session = GuardSession::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anonymous() -> SessionSnapshot {
        SessionSnapshot {
            principal: None,
            hydrated: true,
            session_id: None,
        }
    }

    fn signed_in(role: Role) -> SessionSnapshot {
        SessionSnapshot {
            principal: Some(Principal::new("u-1", role)),
            hydrated: true,
            session_id: None,
        }
    }

    #[test]
    fn defers_until_hydrated() {
        let mut guard = RouteGuard::new();
        let action = guard.evaluate("/profile", &SessionSnapshot::default(), false);
        assert_eq!(action, GuardAction::Deferred);
        assert!(!guard.should_prompt_login());
        assert_eq!(guard.phase(), GuardPhase::Idle);
    }

    #[test]
    fn anonymous_denial_records_intended_path() {
        let mut guard = RouteGuard::new();
        assert_eq!(guard.evaluate("/profile", &anonymous(), false), GuardAction::PromptLogin);
        assert_eq!(guard.phase(), GuardPhase::AwaitingAuth);
        assert_eq!(
            guard.session(),
            &GuardSession {
                should_prompt_login: true,
                intended_path: Some("/profile".to_string()),
            }
        );
    }

    #[test]
    fn repeated_evaluation_is_idempotent() {
        let mut guard = RouteGuard::new();
        guard.evaluate("/profile", &anonymous(), false);
        let first = guard.session().clone();
        assert_eq!(guard.evaluate("/profile", &anonymous(), false), GuardAction::Unchanged);
        assert_eq!(guard.session(), &first);
    }

    #[test]
    fn new_denial_replaces_stale_intended_path() {
        let mut guard = RouteGuard::new();
        guard.evaluate("/profile", &anonymous(), false);
        guard.evaluate("/settings", &anonymous(), false);
        assert_eq!(guard.session().intended_path.as_deref(), Some("/settings"));
    }

    #[test]
    fn allowed_navigation_clears_pending_prompt() {
        let mut guard = RouteGuard::new();
        guard.evaluate("/profile", &anonymous(), false);
        assert_eq!(guard.evaluate("/about", &anonymous(), false), GuardAction::Allow);
        assert_eq!(guard.phase(), GuardPhase::Idle);
        assert_eq!(guard.session(), &GuardSession::default());
    }

    #[test]
    fn resumes_intended_path_after_login() {
        let mut guard = RouteGuard::new();
        guard.evaluate("/profile", &anonymous(), false);
        assert_eq!(
            guard.evaluate("/profile", &signed_in(Role::Employee), false),
            GuardAction::Resume("/profile".to_string())
        );
        assert_eq!(guard.phase(), GuardPhase::Idle);
        assert_eq!(guard.session(), &GuardSession::default());
    }

    #[test]
    fn resumption_waits_for_modal() {
        let mut guard = RouteGuard::new();
        guard.evaluate("/profile", &anonymous(), false);
        assert_eq!(
            guard.evaluate("/profile", &signed_in(Role::Employee), true),
            GuardAction::Deferred
        );
        assert_eq!(guard.phase(), GuardPhase::AwaitingAuth);
        assert_eq!(
            guard.evaluate("/profile", &signed_in(Role::Employee), false),
            GuardAction::Resume("/profile".to_string())
        );
    }

    #[test]
    fn root_is_never_intended() {
        static TABLE: &[crate::models::RoutePermission] = &[crate::models::RoutePermission {
            path: "/",
            allowed_roles: &[Role::Admin, Role::Employer, Role::Employee],
            requires_auth: true,
            redirect_to: None,
        }];
        static LOCKED: std::sync::LazyLock<PermissionTable> =
            std::sync::LazyLock::new(|| PermissionTable::new(TABLE).unwrap());

        let mut guard = RouteGuard::with_table(&LOCKED);
        assert_eq!(guard.evaluate("/", &anonymous(), false), GuardAction::PromptLogin);
        assert_eq!(guard.session().intended_path, None);
        assert!(guard.should_prompt_login());
        assert_eq!(
            guard.evaluate("/", &signed_in(Role::Employer), false),
            GuardAction::Resume("/employer".to_string())
        );
    }

    #[test]
    fn wrong_role_redirects_without_prompt() {
        let mut guard = RouteGuard::new();
        let action = guard.evaluate("/competitions/create", &signed_in(Role::Employee), false);
        assert_eq!(
            action,
            GuardAction::Redirect(
                "/access-denied?required_role=employer&user_role=employee&attempted_path=/competitions/create"
                    .to_string()
            )
        );
        assert_eq!(guard.phase(), GuardPhase::Idle);
        assert!(!guard.should_prompt_login());
    }

    #[test]
    fn dismissal_returns_to_public_default() {
        let mut guard = RouteGuard::new();
        guard.evaluate("/settings", &anonymous(), false);
        assert_eq!(guard.dismiss(), GuardAction::ReturnToPublic("/".to_string()));
        assert_eq!(guard.phase(), GuardPhase::Idle);
        assert_eq!(guard.session(), &GuardSession::default());
        assert_eq!(guard.dismiss(), GuardAction::Unchanged);
    }

    #[test]
    fn login_evaluates_even_on_same_path() {
        let mut guard = RouteGuard::new();
        guard.evaluate("/about", &anonymous(), false);
        assert_eq!(
            guard.evaluate("/about", &signed_in(Role::Admin), false),
            GuardAction::Allow
        );
    }
}
