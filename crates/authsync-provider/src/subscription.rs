//! Auth-state subscriptions: an event receiver plus a cancel handle.
//!
//! Providers push [`AuthStateChange`] values into an unbounded mpsc
//! channel. The listener side is split in two so the consumer task can
//! own the receiver while the scope keeps the handle it needs to cancel.

use std::fmt;

use authsync_protocol::AuthStateChange;
use tokio::sync::mpsc;

/// Channel sender a provider uses to deliver notifications.
pub type EventSender = mpsc::UnboundedSender<AuthStateChange>;

/// Channel receiver a consumer reads notifications from.
pub type EventReceiver = mpsc::UnboundedReceiver<AuthStateChange>;

/// Opaque identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a new `SubscriptionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Boxed cancel callback supplied by the provider.
type CancelFn = Box<dyn FnOnce() + Send + Sync>;

/// The cancel side of a subscription.
///
/// Holds the provider's cancel callback until [`unsubscribe`] runs it.
/// The callback is `FnOnce` and is taken out of the handle on first use,
/// so a provider is told to unsubscribe at most once no matter how many
/// times `unsubscribe` is called.
///
/// Dropping the handle does NOT unsubscribe; the owner decides when the
/// subscription ends.
///
/// [`unsubscribe`]: SubscriptionHandle::unsubscribe
pub struct SubscriptionHandle {
    id: SubscriptionId,
    cancel: Option<CancelFn>,
}

impl SubscriptionHandle {
    /// Creates a handle that runs `cancel` on unsubscribe.
    pub fn new(id: SubscriptionId, cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Returns the subscription's ID.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// `true` until [`unsubscribe`](Self::unsubscribe) has run.
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Cancels the subscription.
    ///
    /// Returns `true` if this call cancelled it, `false` if it was
    /// already cancelled.
    pub fn unsubscribe(&mut self) -> bool {
        match self.cancel.take() {
            Some(cancel) => {
                cancel();
                tracing::debug!(subscription = %self.id, "unsubscribed");
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// A live auth-state subscription.
#[derive(Debug)]
pub struct Subscription {
    handle: SubscriptionHandle,
    events: EventReceiver,
}

impl Subscription {
    /// Bundles a cancel handle with the receiver notifications arrive on.
    pub fn new(handle: SubscriptionHandle, events: EventReceiver) -> Self {
        Self { handle, events }
    }

    /// Returns the subscription's ID.
    pub fn id(&self) -> SubscriptionId {
        self.handle.id()
    }

    /// Splits into the cancel handle and the event receiver.
    pub fn into_parts(self) -> (SubscriptionHandle, EventReceiver) {
        (self.handle, self.events)
    }
}
