//! Navigation guard: decides whether a requested navigation may proceed.
//!
//! Before deciding, the guard lets in-flight session work settle, each wait
//! bounded (5s for a bootstrap, 3s for a login/logout by default). A wait
//! that runs out is not an error; the decision is taken on whatever state
//! holds at that point.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use abate_common::GuardTimings;

use crate::constants::{ENTRY_PATH, HOME_PATH, MAX_GUARD_REDIRECTS};
use crate::gate::SessionGate;
use crate::redirect::RedirectSlot;
use crate::routes::{Destination, RouteTable};
use crate::types::GateSnapshot;

/// Outcome of one guard run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(String),
}

/// Guard consulted before every navigation.
pub struct NavigationGuard {
    gate: Arc<SessionGate>,
    slot: Arc<dyn RedirectSlot>,
    timings: GuardTimings,
}

impl NavigationGuard {
    pub fn new(gate: Arc<SessionGate>, slot: Arc<dyn RedirectSlot>) -> Self {
        Self {
            gate,
            slot,
            timings: GuardTimings::default(),
        }
    }

    pub fn with_timings(mut self, timings: GuardTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn gate(&self) -> &Arc<SessionGate> {
        &self.gate
    }

    /// Run the guard for a navigation from `from` (if any) to `to`.
    pub async fn before_each(&self, to: &Destination, from: Option<&Destination>) -> GuardDecision {
        tracing::debug!(
            from = from.map(|d| d.path.as_str()).unwrap_or("initial"),
            to = %to.path,
            requires_auth = to.meta.requires_auth,
            requires_guest = to.meta.requires_guest,
            "Navigation requested"
        );

        if self.gate.is_initializing() {
            self.settle(
                "identity bootstrap",
                self.timings.init_timeout(),
                |s| !s.initializing,
            )
            .await;
        }

        let snapshot = self.gate.snapshot();
        if snapshot.session.is_none() && !snapshot.loading && !snapshot.initializing {
            self.gate.initialize().await;
        }

        if self.gate.is_loading() {
            self.settle(
                "session action",
                self.timings.loading_timeout(),
                |s| !s.loading,
            )
            .await;
        }

        let decision = self.decide(to, self.gate.is_authenticated());
        tracing::debug!(to = %to.path, ?decision, "Navigation decided");
        decision
    }

    /// Wait until `done` holds or `limit` passes. Returns whether it settled.
    async fn settle(
        &self,
        what: &'static str,
        limit: Duration,
        done: impl FnMut(&GateSnapshot) -> bool,
    ) -> bool {
        let mut changes = self.gate.subscribe();
        let started = Instant::now();
        let settled = tokio::time::timeout(limit, changes.wait_for(done))
            .await
            .map(|waited| waited.is_ok())
            .unwrap_or(false);
        let waited_ms = started.elapsed().as_millis() as u64;
        if settled {
            tracing::debug!(waited_ms, "{what} settled");
        } else {
            tracing::warn!(waited_ms, "Gave up waiting for {what}; deciding on current state");
        }
        settled
    }

    fn decide(&self, to: &Destination, authenticated: bool) -> GuardDecision {
        if to.meta.requires_auth && !authenticated {
            if to.path != ENTRY_PATH {
                tracing::debug!(path = %to.path, "Saving destination for after login");
                self.slot.set(&to.path);
            }
            return GuardDecision::Redirect(ENTRY_PATH.to_string());
        }

        if to.meta.requires_guest && authenticated {
            if let Some(saved) = self.slot.get().filter(|p| p != ENTRY_PATH) {
                self.slot.clear();
                return GuardDecision::Redirect(saved);
            }
            return GuardDecision::Redirect(HOME_PATH.to_string());
        }

        GuardDecision::Proceed
    }
}

/// Errors ending a navigation without reaching a destination.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("no route matches {0}")]
    NotFound(String),

    #[error("too many redirects while navigating to {0}")]
    RedirectLoop(String),
}

/// Route table plus guard: the navigation host.
pub struct Navigator {
    routes: RouteTable,
    guard: NavigationGuard,
    current: Mutex<Option<Destination>>,
}

impl Navigator {
    pub fn new(routes: RouteTable, guard: NavigationGuard) -> Self {
        Self {
            routes,
            guard,
            current: Mutex::new(None),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// Last destination a navigation reached.
    pub fn current(&self) -> Option<Destination> {
        self.current.lock().clone()
    }

    /// Navigate to `path`, following guard redirects, and return where we landed.
    pub async fn navigate(&self, path: &str) -> Result<Destination, NavigationError> {
        let mut target = path.to_string();
        for _ in 0..MAX_GUARD_REDIRECTS {
            let to = self
                .routes
                .resolve(&target)
                .ok_or_else(|| NavigationError::NotFound(target.clone()))?;
            let from = self.current();
            match self.guard.before_each(&to, from.as_ref()).await {
                GuardDecision::Proceed => {
                    *self.current.lock() = Some(to.clone());
                    return Ok(to);
                }
                GuardDecision::Redirect(next) => {
                    tracing::debug!(from = %to.path, to = %next, "Guard redirected");
                    target = next;
                }
            }
        }
        Err(NavigationError::RedirectLoop(path.to_string()))
    }

    /// Where a fresh login lands: the saved destination, else home.
    pub async fn after_login(&self) -> Result<Destination, NavigationError> {
        self.navigate(ENTRY_PATH).await
    }
}
