//! Guard protocol tests against an in-process identity backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::sync::Notify;

use abate_session::{
    ApiMessage, Credentials, Destination, GateState, GuardDecision, IdentityError,
    IdentityRecord, IdentityService, MemoryRedirectSlot, NavigationGuard, Navigator,
    RedirectSlot, Registration, RouteMeta, RouteTable, ServiceResponse, SessionGate,
};

#[derive(Default)]
struct Backend {
    logged_in: Mutex<Option<String>>,
    me_calls: AtomicUsize,
    me_hold: Option<Arc<Notify>>,
    login_hold: Option<Arc<Notify>>,
    me_fails: bool,
}

impl Backend {
    fn signed_in(username: &str) -> Self {
        Self {
            logged_in: Mutex::new(Some(username.to_string())),
            ..Default::default()
        }
    }
}

#[async_trait]
impl IdentityService for Backend {
    async fn who_am_i(&self) -> Result<ServiceResponse<IdentityRecord>, IdentityError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hold) = &self.me_hold {
            hold.notified().await;
        }
        if self.me_fails {
            return Err(IdentityError::Client("backend unreachable".into()));
        }
        let current = self.logged_in.lock().clone();
        Ok(match current {
            Some(username) => ServiceResponse::new(
                200,
                Some(IdentityRecord {
                    username: Some(username),
                    is_active: Some(true),
                    ..Default::default()
                }),
            ),
            None => ServiceResponse::new(401, None),
        })
    }

    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<ServiceResponse<ApiMessage>, IdentityError> {
        if let Some(hold) = &self.login_hold {
            hold.notified().await;
        }
        *self.logged_in.lock() = Some(credentials.username.clone());
        Ok(ServiceResponse::new(200, None))
    }

    async fn logout(&self) -> Result<ServiceResponse<ApiMessage>, IdentityError> {
        *self.logged_in.lock() = None;
        Ok(ServiceResponse::new(200, None))
    }

    async fn register(
        &self,
        _registration: &Registration,
    ) -> Result<ServiceResponse<ApiMessage>, IdentityError> {
        Ok(ServiceResponse::new(201, None))
    }
}

struct Harness {
    backend: Arc<Backend>,
    gate: Arc<SessionGate>,
    slot: Arc<MemoryRedirectSlot>,
    guard: NavigationGuard,
}

fn harness(backend: Backend) -> Harness {
    let backend = Arc::new(backend);
    let gate = Arc::new(SessionGate::new(backend.clone()));
    let slot = Arc::new(MemoryRedirectSlot::new());
    let guard = NavigationGuard::new(gate.clone(), slot.clone());
    Harness {
        backend,
        gate,
        slot,
        guard,
    }
}

fn auth(path: &str) -> Destination {
    Destination::new(path, RouteMeta::AUTH)
}

fn guest(path: &str) -> Destination {
    Destination::new(path, RouteMeta::GUEST)
}

async fn until_initializing(gate: &SessionGate) {
    let mut changes = gate.subscribe();
    changes.wait_for(|s| s.initializing).await.unwrap();
}

async fn until_loading(gate: &SessionGate) {
    let mut changes = gate.subscribe();
    changes.wait_for(|s| s.loading).await.unwrap();
}

#[tokio::test]
async fn auth_destination_without_session_redirects_and_records() {
    let h = harness(Backend::default());

    let decision = h.guard.before_each(&auth("/home/lotes"), None).await;
    assert_eq!(decision, GuardDecision::Redirect("/".to_string()));
    assert_eq!(h.slot.get().as_deref(), Some("/home/lotes"));
    assert_eq!(h.backend.me_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn entry_path_is_never_recorded() {
    let h = harness(Backend::default());

    let decision = h.guard.before_each(&auth("/"), None).await;
    assert_eq!(decision, GuardDecision::Redirect("/".to_string()));
    assert_eq!(h.slot.get(), None);
}

#[tokio::test]
async fn failed_bootstrap_is_treated_as_no_session() {
    let h = harness(Backend {
        me_fails: true,
        ..Default::default()
    });

    let decision = h.guard.before_each(&auth("/home/produtos"), None).await;
    assert_eq!(decision, GuardDecision::Redirect("/".to_string()));
    assert_eq!(h.gate.state(), GateState::NoSession);
}

#[tokio::test]
async fn authenticated_auth_destination_proceeds() {
    let h = harness(Backend::signed_in("ana"));

    let decision = h.guard.before_each(&auth("/home/lotes"), None).await;
    assert_eq!(decision, GuardDecision::Proceed);
    assert!(h.gate.is_authenticated());
}

#[tokio::test]
async fn guest_destination_while_authenticated_prefers_saved_path() {
    let h = harness(Backend::signed_in("ana"));
    h.slot.set("/home/relatorios");

    let decision = h.guard.before_each(&guest("/"), None).await;
    assert_eq!(decision, GuardDecision::Redirect("/home/relatorios".to_string()));
    assert_eq!(h.slot.get(), None, "saved path is one-shot");

    let again = h.guard.before_each(&guest("/"), None).await;
    assert_eq!(again, GuardDecision::Redirect("/home".to_string()));
}

#[tokio::test]
async fn saved_entry_path_is_ignored() {
    let h = harness(Backend::signed_in("ana"));
    h.slot.set("/");

    let decision = h.guard.before_each(&guest("/"), None).await;
    assert_eq!(decision, GuardDecision::Redirect("/home".to_string()));
}

#[tokio::test]
async fn guest_destination_without_session_proceeds() {
    let h = harness(Backend::default());
    let decision = h.guard.before_each(&guest("/"), None).await;
    assert_eq!(decision, GuardDecision::Proceed);
}

#[tokio::test]
async fn concurrent_initialize_issues_one_lookup() {
    let hold = Arc::new(Notify::new());
    let h = harness(Backend {
        logged_in: Mutex::new(Some("ana".into())),
        me_hold: Some(hold.clone()),
        ..Default::default()
    });

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let gate = h.gate.clone();
        tasks.push(tokio::spawn(async move { gate.initialize().await }));
    }
    until_initializing(&h.gate).await;
    // give every other caller a chance to hit the claimed slot
    tokio::task::yield_now().await;
    hold.notify_one();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(h.backend.me_calls.load(Ordering::SeqCst), 1);
    assert!(h.gate.is_authenticated());
}

#[tokio::test]
async fn guard_waits_for_inflight_bootstrap() {
    let hold = Arc::new(Notify::new());
    let h = harness(Backend {
        logged_in: Mutex::new(Some("ana".into())),
        me_hold: Some(hold.clone()),
        ..Default::default()
    });

    let gate = h.gate.clone();
    let bootstrap = tokio::spawn(async move { gate.initialize().await });
    until_initializing(&h.gate).await;

    let release = hold.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        release.notify_one();
    });

    let decision = h.guard.before_each(&auth("/home/dashboard"), None).await;
    bootstrap.await.unwrap();

    assert_eq!(decision, GuardDecision::Proceed);
    assert_eq!(h.backend.me_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn stuck_bootstrap_times_out_softly() {
    let hold = Arc::new(Notify::new());
    let h = harness(Backend {
        logged_in: Mutex::new(Some("ana".into())),
        me_hold: Some(hold),
        ..Default::default()
    });

    let gate = h.gate.clone();
    let _stuck = tokio::spawn(async move { gate.initialize().await });
    until_initializing(&h.gate).await;

    let started = tokio::time::Instant::now();
    let decision = h.guard.before_each(&auth("/home/lotes"), None).await;

    assert!(started.elapsed() >= Duration::from_secs(5));
    assert_eq!(decision, GuardDecision::Redirect("/".to_string()));
    assert_eq!(h.gate.state(), GateState::Initializing);
    assert_eq!(h.backend.me_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn guard_waits_for_inflight_login() {
    let hold = Arc::new(Notify::new());
    let h = harness(Backend {
        login_hold: Some(hold.clone()),
        ..Default::default()
    });

    let gate = h.gate.clone();
    let login = tokio::spawn(async move { gate.login(&Credentials::new("ana", "pw")).await });
    until_loading(&h.gate).await;

    let release = hold.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        release.notify_one();
    });

    let decision = h.guard.before_each(&auth("/home/graficos"), None).await;
    login.await.unwrap().unwrap();

    assert_eq!(decision, GuardDecision::Proceed);
}

#[tokio::test(start_paused = true)]
async fn stuck_login_times_out_softly() {
    let h = harness(Backend {
        login_hold: Some(Arc::new(Notify::new())),
        ..Default::default()
    });

    let gate = h.gate.clone();
    let _stuck = tokio::spawn(async move { gate.login(&Credentials::new("ana", "pw")).await });
    until_loading(&h.gate).await;

    let started = tokio::time::Instant::now();
    let decision = h.guard.before_each(&auth("/home/lotes"), None).await;

    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(decision, GuardDecision::Redirect("/".to_string()));
    assert!(h.gate.is_loading());
    assert_eq!(h.backend.me_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.slot.get().as_deref(), Some("/home/lotes"));
}

#[tokio::test]
async fn navigator_replays_saved_destination_after_login() {
    let backend = Arc::new(Backend::default());
    let gate = Arc::new(SessionGate::new(backend.clone()));
    let slot = Arc::new(MemoryRedirectSlot::new());
    let navigator = Navigator::new(
        RouteTable::console(),
        NavigationGuard::new(gate.clone(), slot.clone()),
    );

    let landed = navigator.navigate("/lotes").await.unwrap();
    assert_eq!(landed.path, "/");
    assert_eq!(slot.get().as_deref(), Some("/home/lotes"));

    gate.login(&Credentials::new("ana", "pw")).await.unwrap();
    let landed = navigator.after_login().await.unwrap();
    assert_eq!(landed.path, "/home/lotes");
    assert_eq!(navigator.current().unwrap().path, "/home/lotes");
    assert_eq!(slot.get(), None);

    let landed = navigator.after_login().await.unwrap();
    assert_eq!(landed.path, "/home/dashboard");

    gate.logout().await.unwrap();
    let landed = navigator.navigate("/home").await.unwrap();
    assert_eq!(landed.path, "/");
}

#[tokio::test]
async fn navigator_rejects_unknown_paths() {
    let h = harness(Backend::default());
    let navigator = Navigator::new(RouteTable::console(), h.guard);
    let err = navigator.navigate("/admin").await.unwrap_err();
    assert_eq!(err.to_string(), "no route matches /admin");
}
