use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{error::SessionError, models::Principal};

/// SessionSnapshot
///
/// Immutable copy of the Session Store handed to readers. Nobody holds a live
/// reference into the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub principal: Option<Principal>,
    /// False until the persisted session (if any) has been restored.
    pub hydrated: bool,
    /// Fresh for every successful auth exchange.
    pub session_id: Option<Uuid>,
}

impl SessionSnapshot {
    pub fn current_principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}

/// SessionStore
///
/// Process-wide client session with an explicit lifecycle: starts empty and
/// unhydrated, is hydrated once, established once per successful auth exchange,
/// and cleared once on logout. Backed by a `watch` channel so the Route Guard
/// observes changes without the Coordinator calling it.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn current_principal(&self) -> Option<Principal> {
        self.tx.borrow().principal.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    /// hydrate
    ///
    /// Restores the session loaded asynchronously at startup (e.g. from a refresh
    /// call). Applies only once; returns whether it did.
    pub fn hydrate(&self, restored: Option<Principal>) -> bool {
        self.tx.send_if_modified(|state| {
            if state.hydrated {
                return false;
            }
            state.hydrated = true;
            if let Some(principal) = restored {
                state.principal = Some(principal);
                state.session_id = Some(Uuid::new_v4());
            }
            true
        })
    }

    /// establish
    ///
    /// Populates the store after a successful auth exchange.
    pub fn establish(&self, principal: Principal) -> Result<Uuid, SessionError> {
        let session_id = Uuid::new_v4();
        let mut result = Err(SessionError::AlreadyEstablished);
        self.tx.send_if_modified(|state| {
            if state.principal.is_some() {
                return false;
            }
            tracing::debug!(user = %principal.id, role = %principal.role, "session established");
            state.principal = Some(principal);
            state.session_id = Some(session_id);
            state.hydrated = true;
            result = Ok(session_id);
            true
        });
        result
    }

    /// clear
    ///
    /// Tears the session down on logout.
    pub fn clear(&self) -> Result<(), SessionError> {
        let mut result = Err(SessionError::NotEstablished);
        self.tx.send_if_modified(|state| {
            if state.principal.is_none() {
                return false;
            }
            state.principal = None;
            state.session_id = None;
            result = Ok(());
            true
        });
        if result.is_ok() {
            tracing::debug!("session cleared");
        }
        result
    }
}
