//! Error types for the session layer.

use authsync_provider::ProviderError;

/// Errors that can occur while tracking the current user.
///
/// `ScopeViolation` reaches consumers reading the user; `StoreInUse` and
/// `NoRuntime` are returned when mounting. The fetch and subscribe
/// failures are recovered inside [`SessionSync`](crate::SessionSync) and
/// exist so the recovery can be logged with a typed cause.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The user was read through a scope that isn't mounted (never
    /// attached, or already torn down). This is a programming error in
    /// the caller, not a runtime condition to retry.
    #[error("user context accessed outside an active UserProvider scope")]
    ScopeViolation,

    /// A sync was started on a store that another mounted sync still owns.
    #[error("session store is already attached to a mounted scope")]
    StoreInUse,

    /// A sync was started outside a Tokio runtime.
    #[error("session sync must be started inside a Tokio runtime")]
    NoRuntime,

    /// The initial "get current session" request failed. The store falls
    /// back to "no user".
    #[error("initial session fetch failed: {0}")]
    SessionFetchFailure(#[source] ProviderError),

    /// Registering the auth-state listener failed. The sync keeps the
    /// initial fetch result but receives no further updates.
    #[error("auth state subscription failed: {0}")]
    SubscribeFailed(#[source] ProviderError),
}
