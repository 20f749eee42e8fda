//! The session gate: single source of truth for "who is logged in".
//!
//! State lives in a `tokio::sync::watch` channel. Claiming the
//! initialization slot is a compare-and-set on that channel
//! (`send_if_modified`), so at most one identity lookup runs at a time,
//! and anyone waiting on the state is woken on every change instead of
//! polling.
//!
//! No in-flight call is ever cancelled by a waiter giving up. A lookup that
//! completes after a guard timed out still replaces the session; two
//! overlapping navigations can therefore observe different outcomes.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{AuthError, LOGOUT_FAILED, REGISTER_FAILED};
use crate::identity::IdentityService;
use crate::types::{Credentials, GateSnapshot, GateState, Registration, Session};

/// Authentication state plus the actions that change it.
pub struct SessionGate {
    identity: Arc<dyn IdentityService>,
    state: watch::Sender<GateSnapshot>,
}

impl SessionGate {
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        let (state, _) = watch::channel(GateSnapshot::default());
        Self { identity, state }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> GateSnapshot {
        self.state.borrow().clone()
    }

    pub fn state(&self) -> GateState {
        self.state.borrow().state()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    /// Session present and active, read from the live state.
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_initializing(&self) -> bool {
        self.state.borrow().initializing
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<GateSnapshot> {
        self.state.subscribe()
    }

    /// Bootstrap the session from the identity service.
    ///
    /// Does nothing when a bootstrap is already in flight (callers wait on
    /// [`subscribe`](Self::subscribe) instead) or when a session is already
    /// held. Failures of any kind leave the gate without a session.
    pub async fn initialize(&self) {
        let claimed = self.state.send_if_modified(|s| {
            if s.initializing || s.session.is_some() {
                return false;
            }
            s.initializing = true;
            true
        });
        if !claimed {
            tracing::debug!(state = %self.state(), "Skipping identity bootstrap");
            return;
        }

        let slot = InitSlot {
            state: &self.state,
            armed: true,
        };

        let session = match self.identity.who_am_i().await {
            Ok(reply) if reply.ok() => {
                let session = reply.data.as_ref().and_then(Session::from_identity);
                if session.is_none() {
                    tracing::debug!("Identity lookup named no subject");
                }
                session
            }
            Ok(reply) => {
                tracing::debug!(status = reply.status, "No authenticated subject");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "Identity lookup failed, continuing without session");
                None
            }
        };

        tracing::debug!(
            subject = session.as_ref().map(|s| s.subject_id.as_str()),
            active = session.as_ref().is_some_and(|s| s.active),
            "Identity bootstrap finished"
        );
        slot.complete(session);
    }

    /// Log in and establish the session.
    ///
    /// When the backend accepts the credentials but the follow-up lookup
    /// cannot confirm the subject, the gate still records a session for the
    /// submitted username, marked inactive.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let _busy = Busy::begin(&self.state, true);
        let result = self.try_login(credentials).await;
        self.record(&result);
        result
    }

    async fn try_login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let reply = self.identity.login(credentials).await?;
        if !reply.ok() {
            tracing::info!(
                username = %credentials.username,
                status = reply.status,
                "Login rejected"
            );
            return Err(AuthError::from_login_status(reply.status));
        }

        let me = self.identity.who_am_i().await?;
        let confirmed = if me.ok() {
            me.data.as_ref().and_then(Session::from_identity)
        } else {
            None
        };
        let session = confirmed.unwrap_or_else(|| {
            tracing::warn!(
                username = %credentials.username,
                status = me.status,
                "Login accepted but identity not confirmed; holding unconfirmed session"
            );
            Session::unconfirmed(&credentials.username)
        });

        tracing::info!(subject = %session.subject_id, active = session.active, "Logged in");
        self.state.send_modify(|s| s.session = Some(session));
        Ok(())
    }

    /// Create an account. Never establishes a session.
    pub async fn register(&self, registration: &Registration) -> Result<(), AuthError> {
        let _busy = Busy::begin(&self.state, true);
        let result = self.try_register(registration).await;
        self.record(&result);
        result
    }

    async fn try_register(&self, registration: &Registration) -> Result<(), AuthError> {
        let reply = self.identity.register(registration).await?;
        if reply.ok() {
            tracing::info!(username = %registration.username, "Account registered");
            return Ok(());
        }
        let message = reply
            .data
            .as_ref()
            .and_then(|m| m.detail_text())
            .unwrap_or_else(|| REGISTER_FAILED.to_string());
        Err(AuthError::Unknown {
            status: Some(reply.status),
            message,
        })
    }

    /// End the session on the backend; on success the local session is dropped.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _busy = Busy::begin(&self.state, false);
        let result = match self.identity.logout().await {
            Ok(reply) if reply.ok() => {
                self.state.send_modify(|s| s.session = None);
                tracing::info!("Logged out");
                Ok(())
            }
            Ok(reply) => Err(AuthError::Unknown {
                status: Some(reply.status),
                message: LOGOUT_FAILED.to_string(),
            }),
            Err(e) => Err(AuthError::from(e)),
        };
        self.record(&result);
        result
    }

    fn record(&self, result: &Result<(), AuthError>) {
        if let Err(AuthError::Connection(detail)) = result {
            tracing::warn!(%detail, "Identity service unreachable");
        }
        if let Err(e) = result {
            let message = e.to_string();
            self.state.send_modify(|s| s.error = Some(message));
        }
    }
}

/// Holds the initialization slot; releases it on drop if the lookup never
/// completed (the future was dropped mid-flight).
struct InitSlot<'a> {
    state: &'a watch::Sender<GateSnapshot>,
    armed: bool,
}

impl InitSlot<'_> {
    fn complete(mut self, session: Option<Session>) {
        self.armed = false;
        self.state.send_modify(|s| {
            s.session = session;
            s.initializing = false;
        });
    }
}

impl Drop for InitSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(|s| s.initializing = false);
        }
    }
}

/// Marks an action in flight for as long as it lives.
struct Busy<'a> {
    state: &'a watch::Sender<GateSnapshot>,
}

impl<'a> Busy<'a> {
    fn begin(state: &'a watch::Sender<GateSnapshot>, clear_error: bool) -> Self {
        state.send_modify(|s| {
            s.loading = true;
            if clear_error {
                s.error = None;
            }
        });
        Self { state }
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.loading = false);
    }
}
