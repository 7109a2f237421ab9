//! Unified error type for authsync.

use authsync_protocol::ProtocolError;
use authsync_provider::ProviderError;
use authsync_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `authsync` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum AuthsyncError {
    /// A payload couldn't be decoded into identity/session types.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The identity provider client reported a failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A session-layer error (most often a scope violation).
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AuthsyncError {
    /// `true` if this is a read outside an active scope.
    pub fn is_scope_violation(&self) -> bool {
        matches!(self, Self::Session(SessionError::ScopeViolation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let authsync_err: AuthsyncError = err.into();
        assert!(matches!(authsync_err, AuthsyncError::Protocol(_)));
        assert!(authsync_err.to_string().contains("bad"));
    }

    #[test]
    fn test_from_provider_error() {
        let err = ProviderError::Fetch("offline".into());
        let authsync_err: AuthsyncError = err.into();
        assert!(matches!(authsync_err, AuthsyncError::Provider(_)));
        assert!(authsync_err.to_string().contains("offline"));
    }

    #[test]
    fn test_from_session_error() {
        let authsync_err: AuthsyncError = SessionError::ScopeViolation.into();
        assert!(matches!(authsync_err, AuthsyncError::Session(_)));
        assert!(authsync_err.is_scope_violation());
    }

    #[test]
    fn test_provider_decode_error_is_not_scope_violation() {
        let inner = ProtocolError::InvalidMessage("empty id".into());
        let authsync_err: AuthsyncError = ProviderError::Decode(inner).into();
        assert!(!authsync_err.is_scope_violation());
    }
}
