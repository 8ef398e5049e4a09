//! Session Controller
//!
//! Owns the client-side session state machine:
//!
//! 1. `initialize()` subscribes to change notifications, fetches the current
//!    session and resolves `LOADING` to `AUTHENTICATED` or `ANONYMOUS`
//! 2. A single listener task applies notifications in emission order
//! 3. `sign_out()` / `refresh_session()` call the auth service and adopt the result
//! 4. `valid_session()` refreshes transparently once the cached session expired
//! 5. An optional background task refreshes ahead of expiry
//!
//! Every adopted session is written through to the [`SessionStore`].
//!
//! ## Races
//! Each adoption bumps `SessionSnapshot::version`. A service call whose
//! result arrives after a notification was applied is discarded, and
//! concurrent refreshes coalesce into one service call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use kernel::time::{Clock, SystemClock};
use platform::storage::KeyValueStorage;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::application::config::SessionConfig;
use crate::domain::client::AuthClient;
use crate::domain::entity::event::SessionChangeEvent;
use crate::domain::entity::session::Session;
use crate::domain::state::{AuthPhase, SessionSnapshot};
use crate::error::{AuthError, AuthResult};
use crate::infra::channel::SessionSubscription;
use crate::infra::store::SessionStore;

/// Client-side session state machine
pub struct SessionController<A> {
    inner: Arc<ControllerInner<A>>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

struct ControllerInner<A> {
    auth: Arc<A>,
    store: SessionStore,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    state: watch::Sender<SessionSnapshot>,
    refresh_gate: tokio::sync::Mutex<()>,
    /// Serializes version check, store write and state update
    adopt_lock: Mutex<()>,
    stopped: AtomicBool,
}

impl<A> SessionController<A>
where
    A: AuthClient + Send + Sync + 'static,
{
    pub fn new(auth: Arc<A>, storage: Arc<dyn KeyValueStorage>, config: SessionConfig) -> Self {
        Self::with_clock(auth, storage, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        auth: Arc<A>,
        storage: Arc<dyn KeyValueStorage>,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = SessionStore::with_key(storage, config.storage_key.clone());
        let (state, _) = watch::channel(SessionSnapshot::default());
        let (shutdown, _) = watch::channel(false);

        Self {
            inner: Arc::new(ControllerInner {
                auth,
                store,
                clock,
                config,
                state,
                refresh_gate: tokio::sync::Mutex::new(()),
                adopt_lock: Mutex::new(()),
                stopped: AtomicBool::new(false),
            }),
            shutdown,
            tasks: Vec::new(),
        }
    }

    /// Subscribe, fetch the current session and leave `LOADING`
    ///
    /// Never fails: a service error is recorded and resolves to anonymous.
    /// Calling it again is a no-op.
    pub async fn initialize(&mut self) -> SessionSnapshot {
        let inner = &self.inner;
        if inner.snapshot().phase != AuthPhase::Uninitialized || inner.is_stopped() {
            tracing::debug!("Session controller already initialized");
            return inner.snapshot();
        }

        inner.state.send_modify(|state| state.phase = AuthPhase::Loading);
        tracing::info!("Loading session");

        let subscription = inner.auth.on_session_change();
        self.tasks.push(spawn_listener(
            Arc::clone(inner),
            subscription,
            self.shutdown.subscribe(),
        ));

        let observed = inner.version();
        match inner.auth.get_session().await {
            Ok(session) => {
                if !inner.adopt_if_current(observed, session) {
                    tracing::debug!("Initial session superseded by a change notification");
                }
            }
            Err(e) => {
                e.log("get_session");
                inner.record_error(&e);
            }
        }
        inner.finish_loading();

        if inner.config.auto_refresh {
            self.tasks.push(spawn_auto_refresh(
                Arc::clone(inner),
                self.shutdown.subscribe(),
            ));
        }

        let snapshot = inner.snapshot();
        tracing::info!(
            phase = ?snapshot.phase,
            subject = snapshot.subject_id(),
            "Session loaded"
        );
        snapshot
    }

    /// End the session; on failure the cached session is left untouched
    pub async fn sign_out(&self) -> AuthResult<()> {
        let inner = &self.inner;
        inner.ensure_running()?;
        inner.clear_error();

        if let Err(e) = inner.auth.sign_out().await {
            e.log("sign_out");
            inner.record_error(&e);
            return Err(e);
        }

        inner.adopt(None);
        tracing::info!("Signed out");
        Ok(())
    }

    /// Exchange the refresh token and adopt the returned session (maybe none)
    pub async fn refresh_session(&self) -> AuthResult<Option<Session>> {
        self.inner.refresh().await
    }

    /// Cached session, refreshed first if it has expired
    ///
    /// A failed refresh yields `None`; the error is only recorded.
    pub async fn valid_session(&self) -> Option<Session> {
        let session = self.inner.snapshot().session?;
        if !session.is_expired_at(self.inner.clock.now_ms()) {
            return Some(session);
        }

        tracing::debug!(subject = %session.subject_id, "Cached session expired, refreshing");
        self.inner.refresh().await.ok().flatten()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot()
    }

    /// Receiver that observes every state change
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.inner.snapshot().session
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.state.borrow().last_error.clone()
    }

    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    /// Release the subscription and stop background tasks
    ///
    /// Once this returns no further notification is applied.
    pub async fn stop(&mut self) {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.send_replace(true);

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "Session task panicked");
                }
            }
        }
        tracing::info!("Session controller stopped");
    }
}

impl<A> Drop for SessionController<A> {
    fn drop(&mut self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.shutdown.send_replace(true);
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl<A> std::fmt::Debug for SessionController<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &*self.inner.state.borrow())
            .field("config", &self.inner.config)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl<A> ControllerInner<A>
where
    A: AuthClient + Send + Sync + 'static,
{
    async fn refresh(&self) -> AuthResult<Option<Session>> {
        self.ensure_running()?;
        let observed = self.version();
        let _gate = self.refresh_gate.lock().await;

        if self.version() != observed {
            tracing::debug!("Refresh coalesced with a newer session");
            return Ok(self.snapshot().session);
        }

        self.clear_error();
        match self.auth.refresh_session().await {
            Ok(session) if !self.is_stopped() && self.adopt_if_current(observed, session.clone()) => {
                tracing::info!(
                    subject = session.as_ref().map(|s| s.subject_id.as_str()),
                    "Session refreshed"
                );
                Ok(session)
            }
            Ok(_) => {
                tracing::debug!("Refresh result superseded by a change notification");
                Ok(self.snapshot().session)
            }
            Err(e) => {
                e.log("refresh_session");
                self.record_error(&e);
                Err(e)
            }
        }
    }
}

impl<A> ControllerInner<A> {
    fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    fn version(&self) -> u64 {
        self.state.borrow().version
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn ensure_running(&self) -> AuthResult<()> {
        if self.is_stopped() {
            return Err(AuthError::Stopped);
        }
        Ok(())
    }

    /// Replace the cached session and write it through to the store
    fn adopt(&self, session: Option<Session>) {
        let _guard = self.adopt_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_through(session);
    }

    /// Adopt only if no other session was adopted since `observed`
    fn adopt_if_current(&self, observed: u64, session: Option<Session>) -> bool {
        let _guard = self.adopt_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.version() != observed {
            return false;
        }
        self.write_through(session);
        true
    }

    /// Caller holds `adopt_lock`
    fn write_through(&self, session: Option<Session>) {
        self.store.persist(session.as_ref());
        self.state.send_modify(|state| {
            state.phase = AuthPhase::for_session(session.as_ref());
            state.session = session;
            state.version += 1;
        });
    }

    fn apply_event(&self, event: SessionChangeEvent) {
        if self.is_stopped() {
            return;
        }
        tracing::info!(
            kind = event.kind.as_str(),
            subject = event.session.as_ref().map(|s| s.subject_id.as_str()),
            "Auth state changed"
        );
        self.adopt(event.session);
        self.clear_error();
    }

    fn finish_loading(&self) {
        self.state.send_if_modified(|state| {
            if state.phase != AuthPhase::Loading {
                return false;
            }
            state.phase = AuthPhase::for_session(state.session.as_ref());
            true
        });
    }

    fn record_error(&self, err: &AuthError) {
        let message = err.to_string();
        self.state
            .send_modify(|state| state.last_error = Some(message));
    }

    fn clear_error(&self) {
        self.state.send_if_modified(|state| state.last_error.take().is_some());
    }
}

fn spawn_listener<A>(
    inner: Arc<ControllerInner<A>>,
    mut subscription: SessionSubscription,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    A: AuthClient + Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                event = subscription.recv() => match event {
                    Some(event) => inner.apply_event(event),
                    None => {
                        tracing::warn!("Session change channel closed");
                        break;
                    }
                },
            }
        }
        subscription.unsubscribe();
    })
}

fn spawn_auto_refresh<A>(
    inner: Arc<ControllerInner<A>>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    A: AuthClient + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(inner.config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(
            interval_secs = inner.config.refresh_interval.as_secs(),
            "Auto refresh started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            let due = inner.snapshot().session.is_some_and(|session| {
                session.expires_within(inner.clock.now_ms(), inner.config.auto_refresh_threshold)
            });
            if due {
                // Errors are recorded on the snapshot; keep ticking.
                let _ = inner.refresh().await;
            }
        }
        tracing::debug!("Auto refresh stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kernel::time::ManualClock;
    use platform::storage::{MemoryStorage, StorageResult};

    use super::*;
    use crate::test_support::ScriptedAuthClient;

    const START_MS: i64 = 1_700_000_000_000;
    const START_SECS: i64 = 1_700_000_000;

    fn fresh(subject: &str) -> Session {
        Session::issue(subject, "access", "refresh", START_SECS, Duration::from_secs(3600))
    }

    fn expired(subject: &str) -> Session {
        Session::new(subject, "old-access", "old-refresh", START_SECS - 3600, Some(START_SECS - 1))
    }

    fn controller(
        auth: &Arc<ScriptedAuthClient>,
        config: SessionConfig,
    ) -> (SessionController<ScriptedAuthClient>, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let controller = SessionController::with_clock(
            Arc::clone(auth),
            storage.clone(),
            config,
            Arc::new(ManualClock::new(START_MS)),
        );
        (controller, storage)
    }

    fn quiet() -> SessionConfig {
        SessionConfig::default().without_auto_refresh()
    }

    async fn settle<A>(controller: &SessionController<A>, done: impl FnMut(&SessionSnapshot) -> bool)
    where
        A: AuthClient + Send + Sync + 'static,
    {
        let mut rx = controller.watch();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(done))
            .await
            .expect("timed out waiting for session state")
            .expect("controller state closed");
    }

    #[tokio::test]
    async fn test_initialize_authenticated() {
        let auth = Arc::new(ScriptedAuthClient::new());
        auth.push_get(Ok(Some(fresh("learner-1"))));
        let (mut controller, _) = controller(&auth, quiet());

        assert_eq!(controller.snapshot().phase, AuthPhase::Uninitialized);
        let snapshot = controller.initialize().await;

        assert_eq!(snapshot.phase, AuthPhase::Authenticated);
        assert!(!snapshot.is_loading());
        assert_eq!(snapshot.subject_id(), Some("learner-1"));
        assert_eq!(controller.store().load_session(), Some(fresh("learner-1")));
        assert_eq!(auth.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_initialize_failure_resolves_anonymous() {
        let auth = Arc::new(ScriptedAuthClient::new());
        auth.push_get(Err(AuthError::Network("offline".into())));
        let (mut controller, _) = controller(&auth, quiet());

        let snapshot = controller.initialize().await;

        assert_eq!(snapshot.phase, AuthPhase::Anonymous);
        assert!(!snapshot.is_loading());
        assert!(snapshot.last_error.unwrap().contains("offline"));
    }

    #[tokio::test]
    async fn test_initialize_twice_is_noop() {
        let auth = Arc::new(ScriptedAuthClient::new());
        let (mut controller, _) = controller(&auth, quiet());

        controller.initialize().await;
        controller.initialize().await;

        assert_eq!(auth.get_calls(), 1);
        assert_eq!(auth.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_notifications_applied_in_order_and_clear_error() {
        let auth = Arc::new(ScriptedAuthClient::new());
        auth.push_get(Err(AuthError::service(503, "unavailable")));
        let (mut controller, _) = controller(&auth, quiet());
        controller.initialize().await;
        assert!(controller.last_error().is_some());

        auth.emit(SessionChangeEvent::signed_in(fresh("learner-1")));
        auth.emit(SessionChangeEvent::user_updated(fresh("learner-2")));
        auth.emit(SessionChangeEvent::signed_out());
        auth.emit(SessionChangeEvent::signed_in(fresh("learner-3")));

        settle(&controller, |s| s.version == 4).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.subject_id(), Some("learner-3"));
        assert_eq!(snapshot.phase, AuthPhase::Authenticated);
        assert_eq!(snapshot.last_error, None);
        assert_eq!(controller.store().load_session(), Some(fresh("learner-3")));
    }

    #[tokio::test]
    async fn test_sign_out_from_authenticated() {
        let auth = Arc::new(ScriptedAuthClient::new());
        auth.push_get(Ok(Some(fresh("learner-1"))));
        let (mut controller, storage) = controller(&auth, quiet());
        controller.initialize().await;
        assert!(controller.is_authenticated());

        controller.sign_out().await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, AuthPhase::Anonymous);
        assert!(snapshot.session.is_none());
        assert!(storage.is_empty());
        assert_eq!(auth.sign_out_calls(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_failure_keeps_session() {
        let auth = Arc::new(ScriptedAuthClient::new());
        auth.push_get(Ok(Some(fresh("learner-1"))));
        auth.push_sign_out(Err(AuthError::Network("offline".into())));
        let (mut controller, _) = controller(&auth, quiet());
        controller.initialize().await;

        let err = controller.sign_out().await.unwrap_err();

        assert_eq!(err, AuthError::Network("offline".into()));
        assert!(controller.is_authenticated());
        assert_eq!(controller.last_error(), Some(err.to_string()));
    }

    #[tokio::test]
    async fn test_refresh_adopts_result() {
        let auth = Arc::new(ScriptedAuthClient::new());
        auth.push_get(Ok(Some(fresh("learner-1"))));
        auth.push_refresh(Ok(Some(fresh("learner-1-renewed"))));
        let (mut controller, _) = controller(&auth, quiet());
        controller.initialize().await;

        let session = controller.refresh_session().await.unwrap();

        assert_eq!(session, Some(fresh("learner-1-renewed")));
        assert_eq!(controller.current_session(), session);
        assert_eq!(controller.store().load_session(), session);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_recorded_and_returned() {
        let auth = Arc::new(ScriptedAuthClient::new());
        auth.push_get(Ok(Some(fresh("learner-1"))));
        auth.push_refresh(Err(AuthError::RefreshRejected));
        let (mut controller, _) = controller(&auth, quiet());
        controller.initialize().await;

        assert_eq!(
            controller.refresh_session().await,
            Err(AuthError::RefreshRejected)
        );
        assert!(controller.last_error().is_some());
        assert_eq!(controller.current_session(), Some(fresh("learner-1")));
    }

    #[tokio::test]
    async fn test_expired_session_triggers_exactly_one_refresh() {
        let auth = Arc::new(ScriptedAuthClient::new());
        auth.push_get(Ok(Some(expired("learner-1"))));
        auth.push_refresh(Ok(Some(fresh("learner-1"))));
        let (mut controller, _) = controller(&auth, quiet());
        controller.initialize().await;

        let session = controller.valid_session().await;

        assert_eq!(session, Some(fresh("learner-1")));
        assert_eq!(auth.refresh_calls(), 1);

        // Fresh now, no further refresh
        assert_eq!(controller.valid_session().await, Some(fresh("learner-1")));
        assert_eq!(auth.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_session_refresh_failure_yields_none() {
        let auth = Arc::new(ScriptedAuthClient::new());
        auth.push_get(Ok(Some(expired("learner-1"))));
        auth.push_refresh(Err(AuthError::Network("offline".into())));
        let (mut controller, _) = controller(&auth, quiet());
        controller.initialize().await;

        assert_eq!(controller.valid_session().await, None);
        assert_eq!(auth.refresh_calls(), 1);
        assert!(controller.last_error().is_some());
    }

    #[tokio::test]
    async fn test_unexpired_session_is_returned_without_refresh() {
        let auth = Arc::new(ScriptedAuthClient::new());
        auth.push_get(Ok(Some(fresh("learner-1"))));
        let (mut controller, _) = controller(&auth, quiet());
        controller.initialize().await;

        assert_eq!(controller.valid_session().await, Some(fresh("learner-1")));
        assert_eq!(auth.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_coalesce() {
        let auth = Arc::new(ScriptedAuthClient::new().with_refresh_delay(Duration::from_millis(50)));
        auth.push_get(Ok(Some(fresh("learner-1"))));
        auth.push_refresh(Ok(Some(fresh("learner-1-renewed"))));
        let (mut controller, _) = controller(&auth, quiet());
        controller.initialize().await;

        let (first, second) = tokio::join!(controller.refresh_session(), controller.refresh_session());

        assert_eq!(auth.refresh_calls(), 1);
        assert_eq!(first.unwrap(), Some(fresh("learner-1-renewed")));
        assert_eq!(second.unwrap(), Some(fresh("learner-1-renewed")));
    }

    #[tokio::test]
    async fn test_refresh_racing_notification_is_discarded() {
        let auth = Arc::new(ScriptedAuthClient::new().with_refresh_delay(Duration::from_millis(100)));
        auth.push_get(Ok(Some(fresh("learner-1"))));
        auth.push_refresh(Ok(Some(fresh("learner-1-renewed"))));
        let (mut controller, _) = controller(&auth, quiet());
        controller.initialize().await;

        let sign_out_meanwhile = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            auth.emit(SessionChangeEvent::signed_out());
        };
        let (refreshed, ()) = tokio::join!(controller.refresh_session(), sign_out_meanwhile);

        assert_eq!(refreshed.unwrap(), None);
        assert_eq!(controller.snapshot().phase, AuthPhase::Anonymous);
        assert_eq!(controller.store().load_session(), None);
    }

    /// Memory storage whose writes block the calling thread once armed
    #[derive(Default)]
    struct SlowStorage {
        inner: MemoryStorage,
        armed: AtomicBool,
    }

    impl KeyValueStorage for SlowStorage {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            if self.armed.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(300));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> StorageResult<()> {
            self.inner.remove(key)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_notification_during_slow_write_is_not_overwritten() {
        let auth = Arc::new(ScriptedAuthClient::new());
        auth.push_get(Ok(Some(fresh("learner-1"))));
        auth.push_refresh(Ok(Some(fresh("learner-1-renewed"))));
        let storage = Arc::new(SlowStorage::default());
        let mut controller = SessionController::with_clock(
            Arc::clone(&auth),
            storage.clone(),
            quiet(),
            Arc::new(ManualClock::new(START_MS)),
        );
        controller.initialize().await;
        storage.armed.store(true, Ordering::SeqCst);

        let emitter = {
            let auth = Arc::clone(&auth);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                auth.emit(SessionChangeEvent::signed_out());
            })
        };
        let _ = controller.refresh_session().await;
        emitter.await.unwrap();

        // initial adopt, refresh, notification
        settle(&controller, |s| s.version >= 3).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.version, 3);
        assert_eq!(snapshot.phase, AuthPhase::Anonymous);
        assert!(snapshot.session.is_none());
        assert_eq!(controller.store().load_session(), None);
    }

    #[tokio::test]
    async fn test_stop_releases_subscription() {
        let auth = Arc::new(ScriptedAuthClient::new());
        let (mut controller, _) = controller(&auth, SessionConfig::default());
        controller.initialize().await;
        assert_eq!(auth.subscriber_count(), 1);

        controller.stop().await;

        assert_eq!(auth.subscriber_count(), 0);
        assert_eq!(auth.emit(SessionChangeEvent::signed_in(fresh("learner-1"))), 0);
        assert!(controller.current_session().is_none());
        assert_eq!(controller.sign_out().await, Err(AuthError::Stopped));
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let auth = Arc::new(ScriptedAuthClient::new());
        let (mut controller, _) = controller(&auth, quiet());
        controller.initialize().await;

        drop(controller);

        tokio::time::timeout(Duration::from_secs(2), async {
            while auth.subscriber_count() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("subscription was not released");
    }

    #[tokio::test]
    async fn test_auto_refresh_renews_near_expiry() {
        let auth = Arc::new(ScriptedAuthClient::new());
        let near_expiry = Session::new("learner-1", "a", "r", START_SECS - 3000, Some(START_SECS + 100));
        auth.push_get(Ok(Some(near_expiry)));
        auth.push_refresh(Ok(Some(fresh("learner-1"))));
        let config = SessionConfig::default()
            .with_refresh_timing(Duration::from_secs(300), Duration::from_millis(10));
        let (mut controller, _) = controller(&auth, config);
        controller.initialize().await;

        settle(&controller, |s| s.session == Some(fresh("learner-1"))).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The renewed session is far from expiry; no second refresh
        assert_eq!(auth.refresh_calls(), 1);
        controller.stop().await;
    }

    #[tokio::test]
    async fn test_auto_refresh_survives_failures() {
        let auth = Arc::new(ScriptedAuthClient::new());
        let near_expiry = Session::new("learner-1", "a", "r", START_SECS - 3000, Some(START_SECS + 100));
        auth.push_get(Ok(Some(near_expiry)));
        auth.push_refresh(Err(AuthError::Network("offline".into())));
        let config = SessionConfig::default()
            .with_refresh_timing(Duration::from_secs(300), Duration::from_millis(10));
        let (mut controller, _) = controller(&auth, config);
        controller.initialize().await;

        tokio::time::timeout(Duration::from_secs(2), async {
            while auth.refresh_calls() < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("auto refresh stopped retrying");

        assert!(controller.is_authenticated());
        assert!(controller.last_error().is_some());
        controller.stop().await;
    }
}
