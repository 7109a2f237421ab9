//! In-process identity provider driven by hand.
//!
//! `MemoryProvider` behaves like a real provider client from authsync's
//! point of view: it answers session queries and pushes notifications to
//! every listener. The difference is that tests (and the demo) decide
//! what the session is, when a fetch resolves and which events fire.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use authsync_protocol::{AuthStateChange, Identity, Session};
use tokio::sync::{mpsc, watch};

use crate::{
    EventSender, IdentityProvider, ProviderError, Subscription, SubscriptionHandle,
    SubscriptionId,
};

/// A hand-driven [`IdentityProvider`].
///
/// Cheap to clone: clones share the same state, so a test can keep one
/// clone to drive events while authsync owns another.
///
/// ## Holding a fetch
///
/// [`hold_fetch`](Self::hold_fetch) makes every `get_session` call wait
/// until [`release_fetch`](Self::release_fetch). The session returned is
/// the one stored when the call was *made*, like a real network request
/// whose response was computed server-side before newer events fired.
/// That is how tests reproduce a stale fetch landing after a newer
/// notification.
#[derive(Clone)]
pub struct MemoryProvider {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    /// `true` while fetches are held.
    fetch_gate: watch::Sender<bool>,
    next_subscription: AtomicU64,
    fetch_calls: AtomicU64,
    unsubscribes: AtomicU64,
}

#[derive(Default)]
struct State {
    session: Option<Session>,
    /// Error message for the next `get_session` call, consumed on use.
    fail_next_fetch: Option<String>,
    /// Error message for every `on_auth_state_change` call while set.
    fail_subscribe: Option<String>,
    subscribers: HashMap<SubscriptionId, EventSender>,
}

impl MemoryProvider {
    /// Creates a provider with nobody signed in.
    pub fn new() -> Self {
        let (fetch_gate, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                fetch_gate,
                next_subscription: AtomicU64::new(1),
                fetch_calls: AtomicU64::new(0),
                unsubscribes: AtomicU64::new(0),
            }),
        }
    }

    /// Creates a provider whose current session belongs to `user`.
    pub fn with_user(user: Identity) -> Self {
        let provider = Self::new();
        provider.set_session(Some(Session::for_user(user)));
        provider
    }

    /// Replaces the stored session without notifying anyone.
    pub fn set_session(&self, session: Option<Session>) {
        self.state().session = session;
    }

    /// Returns the stored session.
    pub fn session(&self) -> Option<Session> {
        self.state().session.clone()
    }

    /// Makes the next `get_session` call fail with `message`.
    pub fn fail_next_fetch(&self, message: impl Into<String>) {
        self.state().fail_next_fetch = Some(message.into());
    }

    /// Makes `on_auth_state_change` fail (`Some`) or succeed (`None`).
    pub fn fail_subscribe(&self, message: Option<String>) {
        self.state().fail_subscribe = message;
    }

    /// Holds every `get_session` call until [`release_fetch`](Self::release_fetch).
    pub fn hold_fetch(&self) {
        self.inner.fetch_gate.send_replace(true);
    }

    /// Lets held `get_session` calls resolve.
    pub fn release_fetch(&self) {
        self.inner.fetch_gate.send_replace(false);
    }

    /// Stores a session for `user` and notifies listeners with `SIGNED_IN`.
    pub fn sign_in(&self, user: Identity) -> usize {
        let change = AuthStateChange::signed_in(user);
        self.set_session(change.session.clone());
        self.emit(change)
    }

    /// Clears the stored session and notifies listeners with `SIGNED_OUT`.
    pub fn sign_out(&self) -> usize {
        self.set_session(None);
        self.emit(AuthStateChange::signed_out())
    }

    /// Delivers `change` to every live listener, in registration order
    /// per listener. The stored session is left alone.
    ///
    /// Listeners whose receiver has gone away are pruned. Returns how
    /// many listeners received the notification.
    pub fn emit(&self, change: AuthStateChange) -> usize {
        let mut state = self.state();
        state
            .subscribers
            .retain(|_, tx| tx.send(change.clone()).is_ok());
        let delivered = state.subscribers.len();
        tracing::trace!(event = %change.event, delivered, "memory provider emitted");
        delivered
    }

    /// Drops every listener's sender, ending their event streams.
    pub fn close_streams(&self) {
        self.state().subscribers.clear();
    }

    /// Number of listeners currently registered.
    pub fn subscriber_count(&self) -> usize {
        self.state().subscribers.len()
    }

    /// Number of times a listener was explicitly unsubscribed.
    pub fn unsubscribe_count(&self) -> u64 {
        self.inner.unsubscribes.load(Ordering::SeqCst)
    }

    /// Number of `get_session` calls made so far.
    pub fn fetch_count(&self) -> u64 {
        self.inner.fetch_calls.load(Ordering::SeqCst)
    }

    /// Locks the shared state. A panic while holding the lock can't leave
    /// the state half-written (every mutation is a single assignment), so
    /// a poisoned lock is safe to keep using.
    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for MemoryProvider {
    async fn get_session(&self) -> Result<Option<Session>, ProviderError> {
        self.inner.fetch_calls.fetch_add(1, Ordering::SeqCst);

        // Snapshot first, then wait: the answer reflects the moment the
        // request was made.
        let snapshot = {
            let mut state = self.state();
            match state.fail_next_fetch.take() {
                Some(message) => Err(ProviderError::Fetch(message)),
                None => Ok(state.session.clone()),
            }
        };

        let mut gate = self.inner.fetch_gate.subscribe();
        if gate.wait_for(|held| !*held).await.is_err() {
            return Err(ProviderError::Closed);
        }

        snapshot
    }

    fn on_auth_state_change(&self) -> Result<Subscription, ProviderError> {
        let mut state = self.state();
        if let Some(message) = &state.fail_subscribe {
            return Err(ProviderError::Subscribe(message.clone()));
        }

        let id = SubscriptionId::new(
            self.inner.next_subscription.fetch_add(1, Ordering::Relaxed),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        state.subscribers.insert(id, tx);
        drop(state);

        // The cancel callback only holds a weak reference, so a forgotten
        // handle doesn't keep the provider alive.
        let weak = Arc::downgrade(&self.inner);
        let handle = SubscriptionHandle::new(id, move || {
            if let Some(inner) = weak.upgrade() {
                let mut state = inner.state.lock().unwrap_or_else(PoisonError::into_inner);
                if state.subscribers.remove(&id).is_some() {
                    inner.unsubscribes.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        tracing::debug!(subscription = %id, "memory provider listener registered");
        Ok(Subscription::new(handle, rx))
    }
}
