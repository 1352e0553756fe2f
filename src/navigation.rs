//! Client runtime: wires the Session Store, Route Guard and Onboarding
//! Coordinator into one single-threaded, event-driven loop.

use tokio::sync::watch;

use crate::{
    auth_api::AuthApi,
    error::OnboardingError,
    guard::{GuardAction, RouteGuard},
    models::{Principal, SignupRequest},
    onboarding::OnboardingCoordinator,
    session::{SessionSnapshot, SessionStore},
};

/// Upper bound on chained guard navigations triggered by one event.
const MAX_CHAINED_NAVIGATIONS: usize = 4;

/// ClientRuntime
///
/// Every event (navigation, hydration, session change, modal close) funnels
/// into `reconcile`, which is the only caller of `RouteGuard::evaluate`.
pub struct ClientRuntime<A> {
    api: A,
    store: SessionStore,
    session_rx: watch::Receiver<SessionSnapshot>,
    guard: RouteGuard,
    onboarding: OnboardingCoordinator,
    current_path: String,
    history: Vec<String>,
}

impl<A: AuthApi> ClientRuntime<A> {
    /// Mounts the runtime on `initial_path`. Nothing is evaluated until the
    /// session is hydrated.
    pub fn new(api: A, store: SessionStore, initial_path: impl Into<String>) -> Self {
        let session_rx = store.subscribe();
        let current_path = initial_path.into();
        Self {
            api,
            store,
            session_rx,
            guard: RouteGuard::new(),
            onboarding: OnboardingCoordinator::new(),
            history: vec![current_path.clone()],
            current_path,
        }
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// Every path the runtime has been on, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn onboarding(&self) -> &OnboardingCoordinator {
        &self.onboarding
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// User or link navigation.
    pub fn navigate(&mut self, path: impl Into<String>) -> GuardAction {
        self.go_to(path.into());
        self.reconcile()
    }

    /// Restores the persisted session (the asynchronous load finished).
    pub fn hydrate(&mut self, restored: Option<Principal>) -> GuardAction {
        self.store.hydrate(restored);
        self.reconcile()
    }

    /// Re-evaluates if the Session Store changed since the last look.
    pub fn sync_session(&mut self) -> Option<GuardAction> {
        if self.session_rx.has_changed().unwrap_or(false) {
            return Some(self.reconcile());
        }
        None
    }

    /// Waits for the next Session Store change, then re-evaluates.
    pub async fn next_session_change(&mut self) -> Option<GuardAction> {
        self.session_rx.changed().await.ok()?;
        Some(self.reconcile())
    }

    /// A manual "Sign in" button.
    pub fn open_sign_in(&mut self) {
        self.onboarding.open_login();
    }

    pub fn open_sign_up(&mut self) {
        self.onboarding.open_signup();
    }

    /// close_modal
    ///
    /// The user closed the modal. Authenticated: a deferred resumption may now
    /// run. Anonymous: the guard is cleared and the user leaves the protected
    /// page for the public default.
    pub fn close_modal(&mut self) -> GuardAction {
        self.onboarding.dismiss();
        if self.store.is_authenticated() {
            return self.reconcile();
        }
        match self.guard.dismiss() {
            GuardAction::ReturnToPublic(target) => {
                self.go_to(target.clone());
                self.reconcile();
                GuardAction::ReturnToPublic(target)
            }
            other => other,
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<GuardAction, OnboardingError> {
        self.onboarding
            .submit_login(&self.api, &self.store, email, password)
            .await?;
        Ok(self.reconcile())
    }

    pub async fn signup(&mut self, request: &SignupRequest) -> Result<GuardAction, OnboardingError> {
        self.onboarding
            .submit_signup(&self.api, &self.store, request)
            .await?;
        Ok(self.reconcile())
    }

    pub async fn verify_email(&mut self, code: &str) -> Result<GuardAction, OnboardingError> {
        self.onboarding
            .submit_verification(&self.api, &self.store, code)
            .await?;
        Ok(self.reconcile())
    }

    pub fn logout(&mut self) -> GuardAction {
        if let Err(error) = self.store.clear() {
            tracing::debug!(%error, "logout without a session");
        }
        self.reconcile()
    }

    /// reconcile
    ///
    /// Evaluates the guard with a fresh snapshot and applies the effect.
    /// Navigations the guard asks for are evaluated in turn (a resumed path may
    /// itself be denied for the new role). Returns the first action, which is
    /// the guard's reaction to the triggering event.
    fn reconcile(&mut self) -> GuardAction {
        let mut first = None;

        for _ in 0..MAX_CHAINED_NAVIGATIONS {
            let snapshot = self.session_rx.borrow_and_update().clone();
            let action = self
                .guard
                .evaluate(&self.current_path, &snapshot, self.onboarding.is_open());

            if !matches!(action, GuardAction::Unchanged | GuardAction::Deferred) {
                self.onboarding.sync_prompt(self.guard.should_prompt_login());
            }

            let target = match &action {
                GuardAction::Redirect(target)
                | GuardAction::Resume(target)
                | GuardAction::ReturnToPublic(target) => Some(target.clone()),
                GuardAction::PromptLogin
                | GuardAction::Unchanged
                | GuardAction::Deferred
                | GuardAction::Allow => None,
            };

            if let Some(target) = target {
                first.get_or_insert(action);
                self.go_to(target);
                continue;
            }
            return first.unwrap_or(action);
        }

        tracing::warn!(path = %self.current_path, "stopped chained guard navigations");
        first.unwrap_or(GuardAction::Unchanged)
    }

    fn go_to(&mut self, path: String) {
        if path != self.current_path {
            tracing::debug!(from = %self.current_path, to = %path, "navigate");
            self.history.push(path.clone());
            self.current_path = path;
        }
    }
}
