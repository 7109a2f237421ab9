//! # authsync
//!
//! Keep the signed-in user in step with an external identity provider.
//!
//! authsync mounts a scope around your application's consumers, fetches
//! the provider's current session once, then follows its sign-in and
//! sign-out notifications. Consumers read the user through a
//! [`ScopeHandle`]; reading after the scope is gone is a loud error.
//!
//! ## Quick Start
//!
//! ```rust
//! use authsync::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), AuthsyncError> {
//! let provider = MemoryProvider::new();
//! let scope = UserProvider::new(provider.clone()).mount()?;
//! scope.ready().await;
//!
//! let handle = scope.handle();
//! assert_eq!(use_user(&handle).user, None);
//!
//! let mut watch = handle.watch();
//! provider.sign_in(Identity::new("u1"));
//! watch.changed().await?;
//! assert!(use_user(&handle).is_signed_in());
//!
//! scope.unmount();
//! assert!(try_use_user(&handle).is_err());
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod logging;
mod scope;

pub use context::{UserContext, try_use_user, use_user};
pub use error::AuthsyncError;
pub use logging::{DEFAULT_FILTER, init_tracing};
pub use scope::{ScopeHandle, UserProvider, UserScope};

pub use authsync_protocol as protocol;
pub use authsync_provider as provider;
pub use authsync_session as session;

/// Everything a typical application needs.
pub mod prelude {
    pub use crate::{
        AuthsyncError, ScopeHandle, UserContext, UserProvider, UserScope, init_tracing,
        try_use_user, use_user,
    };
    pub use authsync_protocol::{AuthEventKind, AuthStateChange, Identity, Session, UserId};
    #[cfg(feature = "memory")]
    pub use authsync_provider::MemoryProvider;
    pub use authsync_provider::{IdentityProvider, ProviderError, Subscription};
    pub use authsync_session::{FetchRacePolicy, SessionError, SyncConfig};
}
