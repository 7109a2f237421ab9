//! Identity provider abstraction for authsync.
//!
//! Provides the [`IdentityProvider`] trait that abstracts over whichever
//! hosted auth service the application uses, plus the [`Subscription`]
//! types that carry auth-state notifications out of it.
//!
//! authsync never authenticates anyone itself. Sign-in flows, token
//! storage and refresh, and the network calls behind them all live
//! inside the provider client. This crate only describes the two things
//! authsync needs from it: "what is the session right now?" and "tell me
//! when it changes".
//!
//! # Feature Flags
//!
//! - `memory` (default): [`MemoryProvider`], an in-process provider
//!   driven by hand. Used by tests and demos.

mod error;
#[cfg(feature = "memory")]
mod memory;
mod subscription;

pub use error::ProviderError;
#[cfg(feature = "memory")]
pub use memory::MemoryProvider;
pub use subscription::{
    EventReceiver, EventSender, Subscription, SubscriptionHandle, SubscriptionId,
};

use std::future::Future;

use authsync_protocol::Session;

/// The client-side API of an external identity provider.
///
/// # Trait bounds
///
/// - `Send + Sync`: the provider is shared (behind an `Arc`) between the
///   scope that mounts it and the task that consumes its notifications.
/// - `'static`: it outlives any single scope.
///
/// # Example
///
/// ```rust
/// use authsync_provider::{IdentityProvider, ProviderError, Subscription};
/// use authsync_protocol::Session;
///
/// /// A provider where nobody is ever signed in.
/// struct Anonymous;
///
/// impl IdentityProvider for Anonymous {
///     async fn get_session(&self) -> Result<Option<Session>, ProviderError> {
///         Ok(None)
///     }
///
///     fn on_auth_state_change(&self) -> Result<Subscription, ProviderError> {
///         Err(ProviderError::Subscribe("anonymous provider has no events".into()))
///     }
/// }
/// ```
pub trait IdentityProvider: Send + Sync + 'static {
    /// Asks the provider for the session it currently holds.
    ///
    /// # Returns
    /// - `Ok(Some(session))`: someone is signed in
    /// - `Ok(None)`: nobody is signed in
    /// - `Err(_)`: the provider couldn't answer
    fn get_session(
        &self,
    ) -> impl Future<Output = Result<Option<Session>, ProviderError>> + Send;

    /// Registers a listener for auth-state changes.
    ///
    /// Notifications arrive, in order, on the returned subscription's
    /// event receiver until [`SubscriptionHandle::unsubscribe`] is called
    /// or the provider drops its side.
    fn on_auth_state_change(&self) -> Result<Subscription, ProviderError>;
}
