//! Session Change Channel
//!
//! Fan-out of change notifications to any number of subscribers. Each
//! subscriber has its own unbounded queue, so events arrive in emission order
//! and a slow subscriber never blocks the emitter.
//!
//! A [`SessionSubscription`] unregisters itself when dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;

use crate::domain::entity::event::SessionChangeEvent;

type Subscribers = HashMap<u64, mpsc::UnboundedSender<SessionChangeEvent>>;

#[derive(Debug, Default)]
struct ChannelInner {
    subscribers: Mutex<Subscribers>,
    next_id: AtomicU64,
}

impl ChannelInner {
    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Emitting side, held by the auth client implementation
#[derive(Debug, Clone, Default)]
pub struct SessionChannel {
    inner: Arc<ChannelInner>,
}

impl SessionChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> SessionSubscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inner.lock().insert(id, sender);

        tracing::debug!(subscription = id, "Session change subscriber registered");

        SessionSubscription {
            id,
            receiver,
            channel: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `event` to every live subscriber; returns how many received it
    pub fn emit(&self, event: SessionChangeEvent) -> usize {
        let mut subscribers = self.inner.lock();
        subscribers.retain(|_, sender| sender.send(event.clone()).is_ok());

        tracing::debug!(
            kind = event.kind.as_str(),
            delivered = subscribers.len(),
            "Session change emitted"
        );
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().len()
    }
}

/// Receiving side of one registration
#[derive(Debug)]
pub struct SessionSubscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<SessionChangeEvent>,
    channel: Weak<ChannelInner>,
}

impl SessionSubscription {
    /// Next event, or `None` once the channel is gone
    pub async fn recv(&mut self) -> Option<SessionChangeEvent> {
        self.receiver.recv().await
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<SessionChangeEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Explicit release; same as dropping the handle
    pub fn unsubscribe(self) {}
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.lock().remove(&self.id);
            tracing::debug!(subscription = self.id, "Session change subscriber released");
        }
    }
}
