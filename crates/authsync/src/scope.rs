//! The scoped provider construct: mount, hand out handles, unmount.
//!
//! A [`UserScope`] is the Rust stand-in for "a provider component wrapping
//! a subtree". Instead of an ambient global that descendants look up, the
//! scope hands out [`ScopeHandle`]s that are passed down explicitly.
//! A handle outliving its scope is exactly the "used outside the
//! provider" mistake, and reading through it fails loudly.

use std::future::Future;
use std::sync::Arc;

use authsync_provider::{IdentityProvider, SubscriptionId};
use authsync_session::{IdentityWatch, SessionError, SessionStore, SessionSync, SyncConfig};

use crate::{UserContext, use_user};

/// Builder for mounting a [`UserScope`].
///
/// # Example
///
/// ```rust
/// use authsync::prelude::*;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), SessionError> {
/// let provider = MemoryProvider::with_user(Identity::new("u1"));
///
/// let scope = UserProvider::new(provider).label("app").mount()?;
/// scope.ready().await;
///
/// let ctx = use_user(&scope.handle());
/// assert_eq!(ctx.user.unwrap().id.as_str(), "u1");
/// # Ok(())
/// # }
/// ```
pub struct UserProvider<P: IdentityProvider> {
    provider: Arc<P>,
    config: SyncConfig,
    store: Option<Arc<SessionStore>>,
}

impl<P: IdentityProvider> UserProvider<P> {
    /// Creates a builder around a provider client.
    pub fn new(provider: P) -> Self {
        Self::from_arc(Arc::new(provider))
    }

    /// Creates a builder around a provider client that is already shared.
    pub fn from_arc(provider: Arc<P>) -> Self {
        Self {
            provider,
            config: SyncConfig::default(),
            store: None,
        }
    }

    /// Sets the sync configuration.
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the label used for this scope in logs.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = label.into();
        self
    }

    /// Mounts onto an existing store instead of a fresh one.
    ///
    /// Useful when a scope is remounted and consumers should keep their
    /// watchers. Mounting fails with [`SessionError::StoreInUse`] while
    /// the previous scope is still mounted.
    pub fn store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attaches the store and starts syncing.
    ///
    /// # Errors
    /// - [`SessionError::StoreInUse`] if the store given to
    ///   [`store`](Self::store) belongs to a scope that is still mounted.
    /// - [`SessionError::NoRuntime`] outside a Tokio runtime.
    pub fn mount(self) -> Result<UserScope, SessionError> {
        let store = self.store.unwrap_or_default();
        let sync = SessionSync::start(self.provider, Arc::clone(&store), self.config)?;
        let handle = ScopeHandle {
            store,
            label: Arc::from(sync.label()),
        };
        Ok(UserScope { sync, handle })
    }

    /// Mounts a scope, runs `body` inside it, then unmounts.
    ///
    /// The scope ends when `body`'s future completes, so any
    /// [`ScopeHandle`] that escapes `body` stops working.
    ///
    /// # Errors
    /// Same as [`mount`](Self::mount); `body` does not run on error.
    pub async fn scope<F, Fut>(self, body: F) -> Result<Fut::Output, SessionError>
    where
        F: FnOnce(ScopeHandle) -> Fut,
        Fut: Future,
    {
        let scope = self.mount()?;
        let output = body(scope.handle()).await;
        scope.unmount();
        Ok(output)
    }
}

/// A mounted provider scope.
///
/// Owns the running [`SessionSync`]. Unmounting (or dropping) the scope
/// unsubscribes from the provider and invalidates every handle.
#[derive(Debug)]
pub struct UserScope {
    sync: SessionSync,
    handle: ScopeHandle,
}

impl UserScope {
    /// Returns a handle for consumers inside this scope.
    pub fn handle(&self) -> ScopeHandle {
        self.handle.clone()
    }

    /// Shorthand for `use_user(&scope.handle())`.
    #[track_caller]
    pub fn user(&self) -> UserContext {
        use_user(&self.handle)
    }

    /// Waits until the initial session fetch has been applied.
    pub async fn ready(&self) {
        self.sync.wait_fetch_settled().await;
    }

    /// `true` while the provider subscription is held.
    pub fn is_subscribed(&self) -> bool {
        self.sync.is_subscribed()
    }

    /// ID of the provider subscription, if one was established.
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.sync.subscription_id()
    }

    /// Ends the scope. Returns `true` if a provider subscription was
    /// cancelled.
    pub fn unmount(mut self) -> bool {
        self.sync.teardown()
    }
}

/// A consumer's reference to a [`UserScope`].
///
/// Cheap to clone and `Send + Sync`, so it can be passed to child
/// components or spawned tasks.
#[derive(Debug, Clone)]
pub struct ScopeHandle {
    store: Arc<SessionStore>,
    label: Arc<str>,
}

impl ScopeHandle {
    /// `true` while the owning scope is mounted.
    pub fn is_active(&self) -> bool {
        self.store.is_attached()
    }

    /// The owning scope's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns a watcher that wakes whenever the current user is written.
    pub fn watch(&self) -> IdentityWatch {
        self.store.watch()
    }

    pub(crate) fn store(&self) -> &SessionStore {
        &self.store
    }
}
