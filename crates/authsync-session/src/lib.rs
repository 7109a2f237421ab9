//! Current-user tracking for authsync.
//!
//! This crate keeps one value, "who is signed in right now", in step
//! with an external identity provider:
//!
//! 1. **Storage**: [`SessionStore`] holds the current
//!    [`Identity`](authsync_protocol::Identity) (or none) and only
//!    answers reads while its scope is attached.
//! 2. **Synchronization**: [`SessionSync`] fetches the provider's
//!    session once, then applies sign-in / sign-out notifications as
//!    they arrive, and unsubscribes at teardown.
//!
//! # How it fits in the stack
//!
//! ```text
//! authsync (above)          ← scoped UserProvider / use_user accessor
//!     ↕
//! Session layer (this crate) ← store + sync task
//!     ↕
//! Provider layer (below)    ← IdentityProvider, Subscription
//! ```

mod config;
mod error;
mod store;
mod sync;

pub use config::{FetchRacePolicy, SyncConfig};
pub use error::SessionError;
pub use store::{IdentityWatch, SessionStore};
pub use sync::SessionSync;
