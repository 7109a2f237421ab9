//! Core data types shared by every authsync layer.
//!
//! These mirror the JSON the hosted identity provider hands back: a
//! session wraps a user, and auth-state notifications carry an event
//! name plus an optional session. Provider adapters deserialize straight
//! into these types; the rest of the workspace never looks at raw JSON.

use serde::{Deserialize, Serialize};

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Free-form JSON object, used for provider-supplied profile fields.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The provider's identifier for a user.
///
/// A "newtype wrapper" around the provider's string ID (usually a UUID).
/// Wrapping it means a `UserId` can't be confused with an access token or
/// an email address, even though all three are strings underneath.
///
/// `#[serde(transparent)]` serializes this as the bare string, so
/// `UserId("u1")` is just `"u1"` in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An authenticated user, exactly as the provider describes them.
///
/// authsync never edits an `Identity`. It only stores whichever one the
/// provider handed over most recently. "No user" is represented as
/// `Option::<Identity>::None` at the call sites, not as a special value
/// here.
///
/// Only `id` is required. Everything else is optional because providers
/// differ in what they fill in (phone-only sign-ups have no email, and so
/// on). Any field we don't model explicitly ends up in `extra` thanks to
/// `#[serde(flatten)]`, so re-serializing an `Identity` loses nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// The provider's stable user ID.
    pub id: UserId,

    /// Primary email address, if the user has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Phone number, if the user signed up with one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Provider-side role (e.g. `"authenticated"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Profile data the user can edit (display name, avatar, ...).
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub user_metadata: Metadata,

    /// Profile data only the provider/admin can edit (auth method, ...).
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub app_metadata: Metadata,

    /// Every other field the provider sent.
    #[serde(flatten)]
    pub extra: Metadata,
}

impl Identity {
    /// Creates an identity carrying only an ID.
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email: None,
            phone: None,
            role: None,
            user_metadata: Metadata::new(),
            app_metadata: Metadata::new(),
            extra: Metadata::new(),
        }
    }

    /// Builder helper: sets the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A provider session: the tokens plus the user they belong to.
///
/// authsync treats the tokens as opaque. Refreshing them is the provider
/// client's job; we only ever read `user` out of a session.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for API calls.
    pub access_token: String,

    /// Token used by the provider client to mint new access tokens.
    #[serde(default)]
    pub refresh_token: String,

    /// Expiry as a UNIX timestamp in seconds, when the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,

    /// Usually `"bearer"`.
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// The signed-in user. Absent in some degenerate provider responses.
    #[serde(default)]
    pub user: Option<Identity>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Creates a session for `user` with placeholder tokens.
    ///
    /// Handy for tests and in-process providers that never talk to a
    /// real token endpoint.
    pub fn for_user(user: Identity) -> Self {
        Self {
            access_token: String::new(),
            refresh_token: String::new(),
            expires_at: None,
            token_type: default_token_type(),
            user: Some(user),
        }
    }
}

/// Tokens are secrets, so `Debug` prints only whether they are set.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &redacted(&self.access_token))
            .field("refresh_token", &redacted(&self.refresh_token))
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .field("user", &self.user)
            .finish()
    }
}

fn redacted(token: &str) -> &'static str {
    if token.is_empty() { "<empty>" } else { "<redacted>" }
}

// ---------------------------------------------------------------------------
// Auth state notifications
// ---------------------------------------------------------------------------

/// The kind of auth-state change the provider is reporting.
///
/// On the wire these are SCREAMING_SNAKE_CASE strings (`"SIGNED_IN"`).
/// Providers add new kinds over time, so any name we don't recognise
/// deserializes to [`AuthEventKind::Unknown`] instead of failing the
/// whole notification. `#[serde(other)]` is what makes that work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    /// Emitted once when a listener is registered, with the stored session.
    InitialSession,
    /// A user signed in.
    SignedIn,
    /// The user signed out (or the session was revoked).
    SignedOut,
    /// The access token was refreshed; the user did not change.
    TokenRefreshed,
    /// The user's profile was updated.
    UserUpdated,
    /// The user followed a password-recovery link.
    PasswordRecovery,
    /// A multi-factor challenge was completed.
    MfaChallengeVerified,
    /// Any event name this crate doesn't know about.
    #[serde(other)]
    Unknown,
}

impl AuthEventKind {
    /// The wire name of this event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
            Self::PasswordRecovery => "PASSWORD_RECOVERY",
            Self::MfaChallengeVerified => "MFA_CHALLENGE_VERIFIED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for AuthEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsing never fails: unrecognised names map to `Unknown`, matching
/// the serde behaviour.
impl FromStr for AuthEventKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "INITIAL_SESSION" => Self::InitialSession,
            "SIGNED_IN" => Self::SignedIn,
            "SIGNED_OUT" => Self::SignedOut,
            "TOKEN_REFRESHED" => Self::TokenRefreshed,
            "USER_UPDATED" => Self::UserUpdated,
            "PASSWORD_RECOVERY" => Self::PasswordRecovery,
            "MFA_CHALLENGE_VERIFIED" => Self::MfaChallengeVerified,
            _ => Self::Unknown,
        })
    }
}

/// One auth-state notification: what happened, and the session after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthStateChange {
    /// What kind of change this is.
    pub event: AuthEventKind,

    /// The session after the change. `None` on sign-out.
    #[serde(default)]
    pub session: Option<Session>,
}

impl AuthStateChange {
    /// A `SIGNED_IN` notification for `user`.
    pub fn signed_in(user: Identity) -> Self {
        Self {
            event: AuthEventKind::SignedIn,
            session: Some(Session::for_user(user)),
        }
    }

    /// A `SIGNED_OUT` notification (no session).
    pub fn signed_out() -> Self {
        Self {
            event: AuthEventKind::SignedOut,
            session: None,
        }
    }

    /// A notification of any kind with an optional session.
    pub fn new(event: AuthEventKind, session: Option<Session>) -> Self {
        Self { event, session }
    }

    /// The user carried by this notification's session, if any.
    pub fn user(&self) -> Option<&Identity> {
        self.session.as_ref().and_then(|s| s.user.as_ref())
    }
}

// =========================================================================
// Tests
// =========================================================================
