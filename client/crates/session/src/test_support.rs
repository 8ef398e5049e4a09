//! Scripted in-memory auth service for controller tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::domain::client::AuthClient;
use crate::domain::entity::event::SessionChangeEvent;
use crate::domain::entity::session::Session;
use crate::error::AuthResult;
use crate::infra::channel::{SessionChannel, SessionSubscription};

/// Responses are queued per operation; the last one repeats once the queue
/// is down to a single entry. Empty queues answer `Ok(None)` / `Ok(())`.
#[derive(Default)]
pub struct ScriptedAuthClient {
    channel: SessionChannel,
    get_results: Mutex<VecDeque<AuthResult<Option<Session>>>>,
    refresh_results: Mutex<VecDeque<AuthResult<Option<Session>>>>,
    sign_out_results: Mutex<VecDeque<AuthResult<()>>>,
    refresh_delay: Option<Duration>,
    get_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

fn next<T: Clone>(queue: &Mutex<VecDeque<T>>, fallback: T) -> T {
    let mut queue = queue.lock().unwrap_or_else(PoisonError::into_inner);
    match queue.len() {
        0 => fallback,
        1 => queue[0].clone(),
        _ => queue.pop_front().unwrap_or(fallback),
    }
}

impl ScriptedAuthClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    pub fn push_get(&self, result: AuthResult<Option<Session>>) {
        self.get_results.lock().unwrap().push_back(result);
    }

    pub fn push_refresh(&self, result: AuthResult<Option<Session>>) {
        self.refresh_results.lock().unwrap().push_back(result);
    }

    pub fn push_sign_out(&self, result: AuthResult<()>) {
        self.sign_out_results.lock().unwrap().push_back(result);
    }

    pub fn emit(&self, event: SessionChangeEvent) -> usize {
        self.channel.emit(event)
    }

    pub fn subscriber_count(&self) -> usize {
        self.channel.subscriber_count()
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

impl AuthClient for ScriptedAuthClient {
    async fn get_session(&self) -> AuthResult<Option<Session>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.get_results, Ok(None))
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.sign_out_results, Ok(()))
    }

    async fn refresh_session(&self) -> AuthResult<Option<Session>> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        next(&self.refresh_results, Ok(None))
    }

    fn on_session_change(&self) -> SessionSubscription {
        self.channel.subscribe()
    }
}
