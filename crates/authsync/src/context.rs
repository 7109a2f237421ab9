//! The accessor consumers call to read the current user.

use authsync_protocol::Identity;
use authsync_session::SessionError;
use serde::{Deserialize, Serialize};

use crate::ScopeHandle;

/// What consumers get back from [`use_user`]: the current user, or `None`
/// when nobody is signed in.
///
/// Serializes as `{"user": {...}}` / `{"user": null}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user: Option<Identity>,
}

impl UserContext {
    /// `true` when someone is signed in.
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}

/// Returns the current user of the scope `handle` belongs to.
///
/// # Panics
///
/// If the scope has been unmounted. Reading the user outside its
/// provider is a bug in the caller, so it fails at the call site instead
/// of quietly reporting "signed out". Use [`try_use_user`] where a
/// handle may legitimately outlive its scope.
#[track_caller]
pub fn use_user(handle: &ScopeHandle) -> UserContext {
    match try_use_user(handle) {
        Ok(ctx) => ctx,
        Err(e) => panic!("use_user: {e}"),
    }
}

/// Fallible form of [`use_user`].
///
/// # Errors
/// [`SessionError::ScopeViolation`] if the scope has been unmounted.
pub fn try_use_user(handle: &ScopeHandle) -> Result<UserContext, SessionError> {
    let user = handle.store().read().inspect_err(|_| {
        tracing::error!(scope = %handle.label(), "user read outside an active scope");
    })?;
    Ok(UserContext { user })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_context_default_is_signed_out() {
        let ctx = UserContext::default();
        assert!(!ctx.is_signed_in());
    }

    #[test]
    fn test_user_context_signed_out_serializes_null() {
        let json = serde_json::to_value(UserContext::default()).unwrap();
        assert_eq!(json, json!({ "user": null }));
    }

    #[test]
    fn test_user_context_signed_in_serializes_user() {
        let ctx = UserContext {
            user: Some(Identity::new("u1")),
        };
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json, json!({ "user": { "id": "u1" } }));
        assert!(ctx.is_signed_in());
    }
}
