//! Codec trait and the JSON implementation used for provider payloads.
//!
//! Provider adapters receive auth notifications and session responses as
//! bytes (HTTP bodies, realtime frames, storage blobs). A codec turns
//! those bytes into the typed values in [`crate::types`]. Swapping the
//! codec never touches the session layer.

use serde::{de::DeserializeOwned, Serialize};

use crate::{AuthStateChange, ProtocolError, Session};

/// Converts between Rust values and raw bytes.
///
/// `Send + Sync + 'static` so one codec can live inside a provider that
/// is shared across Tokio tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Decodes an auth-state notification and checks it is usable.
    ///
    /// # Errors
    /// [`ProtocolError::Decode`] on malformed input,
    /// [`ProtocolError::InvalidMessage`] if the carried user has an
    /// empty ID.
    fn decode_state_change(&self, data: &[u8]) -> Result<AuthStateChange, ProtocolError> {
        let change: AuthStateChange = self.decode(data)?;
        check_user_id(change.user().map(|u| u.id.as_str()))?;
        Ok(change)
    }

    /// Decodes a "get session" response body.
    ///
    /// Providers answer `{"session": null}` when nobody is signed in, so
    /// the result is optional.
    ///
    /// # Errors
    /// Same as [`Codec::decode_state_change`].
    fn decode_session(&self, data: &[u8]) -> Result<Option<Session>, ProtocolError> {
        #[derive(serde::Deserialize)]
        struct SessionBody {
            #[serde(default)]
            session: Option<Session>,
        }

        let body: SessionBody = self.decode(data)?;
        let user_id = body
            .session
            .as_ref()
            .and_then(|s| s.user.as_ref())
            .map(|u| u.id.as_str());
        check_user_id(user_id)?;
        Ok(body.session)
    }
}

fn check_user_id(id: Option<&str>) -> Result<(), ProtocolError> {
    match id {
        Some(id) if id.trim().is_empty() => Err(ProtocolError::InvalidMessage(
            "user id must not be empty".into(),
        )),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`. Hosted identity providers speak
/// JSON, so this is the only codec shipped.
///
/// ## Example
///
/// ```rust
/// use authsync_protocol::{AuthEventKind, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let change = codec
///     .decode_state_change(br#"{"event":"SIGNED_IN","session":{"access_token":"t","user":{"id":"u1"}}}"#)
///     .unwrap();
///
/// assert_eq!(change.event, AuthEventKind::SignedIn);
/// assert_eq!(change.user().unwrap().id.as_str(), "u1");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthEventKind, Identity};

    #[test]
    fn test_decode_state_change_token_refreshed() {
        let change = JsonCodec
            .decode_state_change(
                br#"{"event":"TOKEN_REFRESHED","session":{"access_token":"new","user":{"id":"u1"}}}"#,
            )
            .unwrap();

        assert_eq!(change.event, AuthEventKind::TokenRefreshed);
        assert_eq!(change.user(), Some(&Identity::new("u1")));
    }

    #[test]
    fn test_decode_state_change_malformed_returns_decode_error() {
        let result = JsonCodec.decode_state_change(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_state_change_empty_user_id_is_invalid() {
        let result = JsonCodec.decode_state_change(
            br#"{"event":"SIGNED_IN","session":{"access_token":"t","user":{"id":"  "}}}"#,
        );
        assert!(matches!(result, Err(ProtocolError::InvalidMessage(_))));
    }

    #[test]
    fn test_decode_session_null_means_signed_out() {
        let session = JsonCodec.decode_session(br#"{"session":null}"#).unwrap();
        assert!(session.is_none());
    }

    #[test]
    fn test_decode_session_with_user() {
        let session = JsonCodec
            .decode_session(br#"{"session":{"access_token":"t","user":{"id":"u1","email":"a@b.c"}}}"#)
            .unwrap()
            .expect("session present");

        let user = session.user.expect("user present");
        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_encode_then_decode_state_change() {
        let change = AuthStateChange::signed_in(Identity::new("u9").with_email("x@y.z"));
        let bytes = JsonCodec.encode(&change).unwrap();
        let back = JsonCodec.decode_state_change(&bytes).unwrap();
        assert_eq!(back, change);
    }
}
