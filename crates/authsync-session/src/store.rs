//! The session store: one shared "current user" slot.
//!
//! The value lives in a `tokio::sync::watch` channel, which gives us two
//! things for free: cheap reads of the latest value from any task, and
//! an async "wake me when it changes" for consumers that re-render.
//!
//! Reads are gated by an `attached` flag. A store is attached while a
//! [`SessionSync`](crate::SessionSync) is mounted on it and detached at
//! teardown. Reading a detached store is a [`SessionError::ScopeViolation`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use authsync_protocol::Identity;
use tokio::sync::watch;

use crate::SessionError;

/// Holds the current [`Identity`], or `None` when nobody is signed in.
///
/// There is no public setter. The only writer is the
/// [`SessionSync`](crate::SessionSync) mounted on the store.
#[derive(Debug)]
pub struct SessionStore {
    slot: watch::Sender<Option<Identity>>,
    attached: AtomicBool,
}

impl SessionStore {
    /// Creates an empty, detached store.
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot,
            attached: AtomicBool::new(false),
        }
    }

    /// Returns the current user.
    ///
    /// # Errors
    /// [`SessionError::ScopeViolation`] if no sync is mounted on the store.
    pub fn read(&self) -> Result<Option<Identity>, SessionError> {
        if !self.is_attached() {
            return Err(SessionError::ScopeViolation);
        }
        Ok(self.slot.borrow().clone())
    }

    /// `true` while a sync is mounted on this store.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Returns a watcher that wakes on every write to the store.
    ///
    /// The watcher starts "caught up": only writes made after this call
    /// wake it.
    pub fn watch(self: &Arc<Self>) -> IdentityWatch {
        IdentityWatch {
            store: Arc::clone(self),
            rx: self.slot.subscribe(),
        }
    }

    /// Marks the store attached. Returns `false` if it already was.
    pub(crate) fn attach(&self) -> bool {
        !self.attached.swap(true, Ordering::SeqCst)
    }

    /// Marks the store detached and wakes every watcher so pending
    /// `changed()` calls observe the scope ending. Returns `false` if it
    /// was already detached.
    pub(crate) fn detach(&self) -> bool {
        let was_attached = self.attached.swap(false, Ordering::SeqCst);
        if was_attached {
            self.slot.send_modify(|_| {});
        }
        was_attached
    }

    /// Replaces the current user. Every write wakes watchers, even when
    /// the value is unchanged (a second sign-out is still an event).
    ///
    /// Writes to a detached store are dropped: once a scope is torn
    /// down, nothing may resurrect its user.
    pub(crate) fn set(&self, identity: Option<Identity>, reason: &'static str) -> bool {
        if !self.is_attached() {
            tracing::trace!(reason, "store detached, dropping write");
            return false;
        }
        match &identity {
            Some(user) => tracing::debug!(user_id = %user.id, reason, "current user set"),
            None => tracing::debug!(reason, "current user cleared"),
        }
        self.slot.send_replace(identity);
        true
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Async view of a [`SessionStore`]. Created by [`SessionStore::watch`].
#[derive(Debug)]
pub struct IdentityWatch {
    store: Arc<SessionStore>,
    rx: watch::Receiver<Option<Identity>>,
}

impl IdentityWatch {
    /// Waits for the next write to the store and returns the new value.
    ///
    /// # Errors
    /// [`SessionError::ScopeViolation`] if the store is detached, either
    /// before the call or while waiting.
    pub async fn changed(&mut self) -> Result<Option<Identity>, SessionError> {
        if !self.store.is_attached() {
            return Err(SessionError::ScopeViolation);
        }
        self.rx
            .changed()
            .await
            .map_err(|_| SessionError::ScopeViolation)?;
        if !self.store.is_attached() {
            return Err(SessionError::ScopeViolation);
        }
        Ok(self.rx.borrow_and_update().clone())
    }

    /// The latest value, without waiting.
    ///
    /// # Errors
    /// Same as [`SessionStore::read`].
    pub fn current(&self) -> Result<Option<Identity>, SessionError> {
        self.store.read()
    }
}
