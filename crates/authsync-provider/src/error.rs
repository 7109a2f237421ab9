use authsync_protocol::ProtocolError;

/// Errors reported by an identity provider client.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The "get current session" request failed.
    #[error("session fetch failed: {0}")]
    Fetch(String),

    /// Registering an auth-state listener failed.
    #[error("subscribe failed: {0}")]
    Subscribe(String),

    /// The provider answered with a payload we couldn't decode.
    #[error(transparent)]
    Decode(#[from] ProtocolError),

    /// The provider client was shut down.
    #[error("provider closed")]
    Closed,
}
