//! Session sync: keeps a [`SessionStore`] in step with the provider.
//!
//! Each mounted sync runs one Tokio task (a tiny actor) that owns the
//! pending initial fetch and the notification receiver. It handles one
//! input at a time, to completion, in arrival order, so the store only
//! ever has a single writer and needs no locking beyond the watch
//! channel inside it.
//!
//! When a notification and the fetch answer are both ready, the
//! notification goes first: a listener is registered before the fetch is
//! issued, so anything already in its channel was received earlier.
//!
//! ```text
//! start() ──→ subscribe ──→ spawn worker ──────────────→ teardown()
//!                              │                             │
//!                              ├─ fetch resolves → store     ├─ unsubscribe (once)
//!                              └─ SIGNED_IN/OUT  → store     ├─ abort worker
//!                                                            └─ detach store
//! ```

use std::sync::Arc;

use authsync_protocol::{AuthEventKind, AuthStateChange, Session};
use authsync_provider::{
    EventReceiver, IdentityProvider, ProviderError, SubscriptionHandle, SubscriptionId,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::{FetchRacePolicy, SessionError, SessionStore, SyncConfig};

/// A mounted synchronization between one provider and one store.
///
/// Created by [`SessionSync::start`]; ended by [`SessionSync::teardown`]
/// or by dropping it.
#[derive(Debug)]
pub struct SessionSync {
    label: String,
    store: Arc<SessionStore>,
    /// `None` if subscribing failed. Stays `Some` (but inactive) after
    /// teardown so the ID remains visible for diagnostics.
    subscription: Option<SubscriptionHandle>,
    worker: Option<JoinHandle<()>>,
    fetch_settled: Arc<watch::Sender<bool>>,
}

impl SessionSync {
    /// Attaches `store` and starts syncing it with `provider`.
    ///
    /// Registers the auth-state listener immediately, then spawns the
    /// worker task that issues the initial fetch and applies
    /// notifications.
    ///
    /// A failed subscription is logged and the sync continues with the
    /// fetch alone; teardown then has nothing to unsubscribe.
    ///
    /// # Errors
    /// - [`SessionError::NoRuntime`] if called outside a Tokio runtime.
    /// - [`SessionError::StoreInUse`] if another sync is still mounted on
    ///   `store`. The store and the other sync are left untouched.
    pub fn start<P: IdentityProvider>(
        provider: Arc<P>,
        store: Arc<SessionStore>,
        config: SyncConfig,
    ) -> Result<Self, SessionError> {
        let config = config.validated();
        let label = config.label.clone();

        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| SessionError::NoRuntime)?;

        if !store.attach() {
            tracing::warn!(scope = %label, "store is already attached to another sync");
            return Err(SessionError::StoreInUse);
        }

        let (subscription, events) = match provider.on_auth_state_change() {
            Ok(sub) => {
                let (handle, events) = sub.into_parts();
                tracing::debug!(scope = %label, subscription = %handle.id(), "listening for auth state changes");
                (Some(handle), events)
            }
            Err(e) => {
                let err = SessionError::SubscribeFailed(e);
                tracing::warn!(scope = %label, error = %err, "running without auth state updates");
                // A receiver whose sender is already gone: the worker sees
                // a closed stream on its first poll.
                let (_, events) = mpsc::unbounded_channel();
                (None, events)
            }
        };

        let (settled_tx, _) = watch::channel(!config.fetch_on_mount);
        let fetch_settled = Arc::new(settled_tx);

        let worker = SyncWorker {
            label: label.clone(),
            store: Arc::clone(&store),
            fetch_race: config.fetch_race,
            fetch_settled: Arc::clone(&fetch_settled),
        };
        let task = runtime.spawn(worker.run(provider, events, config.fetch_on_mount));

        tracing::info!(scope = %label, "session sync mounted");

        Ok(Self {
            label,
            store,
            subscription,
            worker: Some(task),
            fetch_settled,
        })
    }

    /// Ends the sync: unsubscribes, stops the worker and detaches the store.
    ///
    /// Safe to call any number of times, and safe when no subscription was
    /// ever established. Returns `true` only for the call that actually
    /// unsubscribed.
    pub fn teardown(&mut self) -> bool {
        let unsubscribed = self
            .subscription
            .as_mut()
            .is_some_and(SubscriptionHandle::unsubscribe);

        // Aborting also cancels a still-pending initial fetch, so a late
        // answer can't write into a torn-down store.
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }

        if self.store.detach() {
            tracing::info!(scope = %self.label, unsubscribed, "session sync torn down");
        }
        unsubscribed
    }

    /// `true` while a subscription is held and not yet cancelled.
    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(SubscriptionHandle::is_active)
    }

    /// ID of the subscription, if one was established.
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.subscription.as_ref().map(SubscriptionHandle::id)
    }

    /// `true` once the initial fetch has been applied (or skipped).
    pub fn fetch_settled(&self) -> bool {
        *self.fetch_settled.borrow()
    }

    /// Waits until the initial fetch has been applied (or skipped).
    ///
    /// Pends forever if the provider never answers; there is no timeout.
    pub async fn wait_fetch_settled(&self) {
        let mut rx = self.fetch_settled.subscribe();
        // The sender lives in `self`, so this can't observe a closed channel.
        let _ = rx.wait_for(|settled| *settled).await;
    }

    /// The store this sync writes to.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// The scope label used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for SessionSync {
    fn drop(&mut self) {
        self.teardown();
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// State owned by the worker task.
struct SyncWorker {
    label: String,
    store: Arc<SessionStore>,
    fetch_race: FetchRacePolicy,
    fetch_settled: Arc<watch::Sender<bool>>,
}

impl SyncWorker {
    /// Runs until both inputs are exhausted: the fetch has resolved (or
    /// was never issued) and the notification stream has closed.
    async fn run<P: IdentityProvider>(
        self,
        provider: Arc<P>,
        mut events: EventReceiver,
        fetch_on_mount: bool,
    ) {
        let fetch = provider.get_session();
        tokio::pin!(fetch);

        let mut fetch_pending = fetch_on_mount;
        let mut events_open = true;
        // Set when a sign-in/out lands while the fetch is still pending.
        let mut overtaken = false;

        loop {
            tokio::select! {
                biased;

                change = events.recv(), if events_open => match change {
                    Some(change) => {
                        if self.apply_change(change) && fetch_pending {
                            overtaken = true;
                        }
                    }
                    None => {
                        events_open = false;
                        tracing::debug!(scope = %self.label, "auth state stream ended");
                    }
                },
                result = &mut fetch, if fetch_pending => {
                    fetch_pending = false;
                    self.apply_fetch(result, overtaken);
                }
                else => break,
            }
        }

        tracing::debug!(scope = %self.label, "session sync worker finished");
    }

    fn apply_fetch(&self, result: Result<Option<Session>, ProviderError>, overtaken: bool) {
        if overtaken && self.fetch_race == FetchRacePolicy::PreferNotifications {
            tracing::debug!(
                scope = %self.label,
                "initial session arrived after a newer notification, discarding"
            );
        } else {
            match result {
                Ok(session) => {
                    let user = session.and_then(|s| s.user);
                    self.store.set(user, "initial fetch");
                }
                Err(e) => {
                    let err = SessionError::SessionFetchFailure(e);
                    tracing::error!(scope = %self.label, error = %err, "error fetching session");
                    self.store.set(None, "fetch failed");
                }
            }
        }
        self.fetch_settled.send_replace(true);
    }

    /// Applies one notification. Returns `true` if it touched the store.
    fn apply_change(&self, change: AuthStateChange) -> bool {
        match change.event {
            AuthEventKind::SignedOut => {
                tracing::info!(scope = %self.label, "user signed out");
                self.store.set(None, "signed out")
            }
            AuthEventKind::SignedIn => {
                let user = change.session.and_then(|s| s.user);
                match &user {
                    Some(u) => tracing::info!(scope = %self.label, user_id = %u.id, "user signed in"),
                    None => tracing::info!(scope = %self.label, "sign-in without a user"),
                }
                self.store.set(user, "signed in")
            }
            other => {
                tracing::trace!(scope = %self.label, event = %other, "ignoring auth event");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the worker's event handling. Full mount/teardown
    //! lifecycles live in `tests/sync_lifecycle.rs`.

    use super::*;
    use authsync_protocol::Identity;

    fn worker(policy: FetchRacePolicy) -> SyncWorker {
        let store = Arc::new(SessionStore::new());
        store.attach();
        let (settled, _) = watch::channel(false);
        SyncWorker {
            label: "test".into(),
            store,
            fetch_race: policy,
            fetch_settled: Arc::new(settled),
        }
    }

    #[test]
    fn test_apply_change_signed_in_sets_user() {
        let w = worker(FetchRacePolicy::Overwrite);

        let touched = w.apply_change(AuthStateChange::signed_in(Identity::new("u1")));

        assert!(touched);
        assert_eq!(w.store.read().unwrap(), Some(Identity::new("u1")));
    }

    #[test]
    fn test_apply_change_signed_in_without_session_clears() {
        let w = worker(FetchRacePolicy::Overwrite);
        w.apply_change(AuthStateChange::signed_in(Identity::new("u1")));

        w.apply_change(AuthStateChange::new(AuthEventKind::SignedIn, None));

        assert_eq!(w.store.read().unwrap(), None);
    }

    #[test]
    fn test_apply_change_signed_out_clears() {
        let w = worker(FetchRacePolicy::Overwrite);
        w.apply_change(AuthStateChange::signed_in(Identity::new("u1")));

        assert!(w.apply_change(AuthStateChange::signed_out()));

        assert_eq!(w.store.read().unwrap(), None);
    }

    #[test]
    fn test_apply_change_other_kinds_leave_store_alone() {
        let w = worker(FetchRacePolicy::Overwrite);
        w.apply_change(AuthStateChange::signed_in(Identity::new("u1")));

        for kind in [
            AuthEventKind::InitialSession,
            AuthEventKind::TokenRefreshed,
            AuthEventKind::UserUpdated,
            AuthEventKind::PasswordRecovery,
            AuthEventKind::MfaChallengeVerified,
            AuthEventKind::Unknown,
        ] {
            let change = AuthStateChange::new(kind, Some(Session::for_user(Identity::new("other"))));
            assert!(!w.apply_change(change), "{kind} must be ignored");
        }

        assert_eq!(w.store.read().unwrap(), Some(Identity::new("u1")));
    }

    #[test]
    fn test_apply_fetch_failure_clears_and_settles() {
        let w = worker(FetchRacePolicy::Overwrite);
        w.apply_change(AuthStateChange::signed_in(Identity::new("u1")));

        w.apply_fetch(Err(ProviderError::Fetch("boom".into())), false);

        assert_eq!(w.store.read().unwrap(), None);
        assert!(*w.fetch_settled.borrow());
    }

    #[test]
    fn test_apply_fetch_overtaken_overwrite_policy_applies_stale() {
        let w = worker(FetchRacePolicy::Overwrite);
        w.apply_change(AuthStateChange::signed_in(Identity::new("u2")));

        w.apply_fetch(Ok(Some(Session::for_user(Identity::new("u1")))), true);

        assert_eq!(w.store.read().unwrap(), Some(Identity::new("u1")));
    }

    #[test]
    fn test_apply_fetch_overtaken_prefer_notifications_discards() {
        let w = worker(FetchRacePolicy::PreferNotifications);
        w.apply_change(AuthStateChange::signed_in(Identity::new("u2")));

        w.apply_fetch(Ok(Some(Session::for_user(Identity::new("u1")))), true);

        assert_eq!(w.store.read().unwrap(), Some(Identity::new("u2")));
        assert!(*w.fetch_settled.borrow(), "discarded fetch still settles");
    }

    #[test]
    fn test_apply_fetch_session_without_user_clears() {
        let w = worker(FetchRacePolicy::Overwrite);
        let mut session = Session::for_user(Identity::new("u1"));
        session.user = None;

        w.apply_fetch(Ok(Some(session)), false);

        assert_eq!(w.store.read().unwrap(), None);
    }
}
