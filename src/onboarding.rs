//! Onboarding Coordinator: login/signup/verification modal lifecycle.
//!
//! The Coordinator never calls the Route Guard. A successful exchange populates
//! the Session Store, and the guard's resumption logic reacts to that signal.

use crate::{
    auth_api::{AuthApi, AuthOutcome},
    error::OnboardingError,
    models::{ModalMode, ModalState, SignupRequest},
    session::SessionStore,
};

#[derive(Debug, Default)]
pub struct OnboardingCoordinator {
    modal: ModalState,
    // Set while the open login modal was raised by the guard rather than the user.
    guard_prompted: bool,
}

impl OnboardingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn is_open(&self) -> bool {
        self.modal.open
    }

    /// Opens the login modal. Also reachable manually (a "Sign in" button).
    pub fn open_login(&mut self) {
        self.guard_prompted = false;
        self.transition(ModalState {
            mode: ModalMode::Login,
            open: true,
            ..ModalState::default()
        });
    }

    pub fn open_signup(&mut self) {
        self.guard_prompted = false;
        self.transition(ModalState {
            mode: ModalMode::Signup,
            open: true,
            ..ModalState::default()
        });
    }

    /// sync_prompt
    ///
    /// Bridges the guard's boolean prompt signal. Opens the login modal only when
    /// nothing is open, so a signup or verification already in progress is kept.
    /// When the guard withdraws its prompt, a login modal it raised closes again;
    /// modals the user opened, and verification in progress, stay open.
    pub fn sync_prompt(&mut self, should_prompt: bool) {
        if should_prompt && !self.modal.open {
            self.open_login();
            self.guard_prompted = true;
        } else if !should_prompt && self.guard_prompted && self.modal.is_auth_modal_open() {
            tracing::debug!("guard withdrew its login prompt");
            self.dismiss();
        }
    }

    /// Whether the open modal was raised by the guard.
    pub fn is_guard_prompted(&self) -> bool {
        self.guard_prompted
    }

    /// handle_verification_needed
    ///
    /// Swaps the auth modal for the verification modal in one transition; the two
    /// are never open together.
    pub fn handle_verification_needed(&mut self, email: impl Into<String>, temp_token: impl Into<String>) {
        self.transition(ModalState {
            mode: ModalMode::Verify,
            open: true,
            pending_verification_token: Some(temp_token.into()),
            pending_email: Some(email.into()),
        });
    }

    /// Closes whatever is open after login or verification succeeded.
    pub fn handle_auth_success(&mut self) {
        self.guard_prompted = false;
        self.transition(ModalState::default());
    }

    /// The user closed the modal without finishing.
    pub fn dismiss(&mut self) {
        self.guard_prompted = false;
        self.transition(ModalState::default());
    }

    /// submit_login
    ///
    /// Runs the login exchange. On success the session is established and the
    /// modal closed; on a verification requirement the verify modal replaces it;
    /// on error the modal is left as it was.
    pub async fn submit_login<A>(
        &mut self,
        api: &A,
        store: &SessionStore,
        email: &str,
        password: &str,
    ) -> Result<(), OnboardingError>
    where
        A: AuthApi + ?Sized,
    {
        let outcome = api.login(email, password).await?;
        self.apply_outcome(outcome, store)
    }

    pub async fn submit_signup<A>(
        &mut self,
        api: &A,
        store: &SessionStore,
        request: &SignupRequest,
    ) -> Result<(), OnboardingError>
    where
        A: AuthApi + ?Sized,
    {
        let outcome = api.signup(request).await?;
        self.apply_outcome(outcome, store)
    }

    /// submit_verification
    ///
    /// Completes email verification with the one-time `code`, using the
    /// temporary token handed over by `handle_verification_needed`.
    pub async fn submit_verification<A>(
        &mut self,
        api: &A,
        store: &SessionStore,
        code: &str,
    ) -> Result<(), OnboardingError>
    where
        A: AuthApi + ?Sized,
    {
        let temp_token = self
            .modal
            .pending_verification_token
            .clone()
            .filter(|_| self.modal.is_verification_open())
            .ok_or(OnboardingError::NoPendingVerification)?;

        let outcome = api.verify_email(&temp_token, code).await?;
        self.apply_outcome(outcome, store)
    }

    fn apply_outcome(&mut self, outcome: AuthOutcome, store: &SessionStore) -> Result<(), OnboardingError> {
        match outcome {
            AuthOutcome::Authenticated { principal } => {
                store.establish(principal)?;
                self.handle_auth_success();
            }
            AuthOutcome::VerificationRequired { email, temp_token } => {
                self.handle_verification_needed(email, temp_token);
            }
        }
        Ok(())
    }

    fn transition(&mut self, next: ModalState) {
        tracing::debug!(from = ?self.modal.mode, to = ?next.mode, open = next.open, "modal transition");
        self.modal = next;
    }
}
