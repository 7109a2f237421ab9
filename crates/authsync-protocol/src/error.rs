//! Error types for the protocol layer.
//!
//! Each authsync crate defines its own error enum. A `ProtocolError`
//! always means "the provider's payload couldn't be turned into (or out
//! of) our types", never a network or scope problem.

/// Errors that can occur while encoding or decoding provider payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: malformed JSON, a user object with no `id`,
    /// or a truncated payload.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload decoded but makes no sense, e.g. an empty user ID.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
