//! Integration tests for the scoped provider and the `use_user` accessor.

use std::sync::Arc;

use authsync::prelude::*;
use authsync::session::SessionStore;

// =========================================================================
// Helpers
// =========================================================================

fn user(id: &str) -> Identity {
    Identity::new(id)
}

async fn mounted(provider: &MemoryProvider) -> UserScope {
    let scope = UserProvider::new(provider.clone()).mount().unwrap();
    scope.ready().await;
    scope
}

// =========================================================================
// use_user inside a scope
// =========================================================================

#[tokio::test]
async fn test_use_user_walkthrough_u1_signed_out_u2() {
    let provider = MemoryProvider::with_user(user("u1"));
    let scope = mounted(&provider).await;
    let handle = scope.handle();
    assert_eq!(use_user(&handle), UserContext { user: Some(user("u1")) });

    let mut watch = handle.watch();
    provider.sign_out();
    watch.changed().await.unwrap();
    assert_eq!(use_user(&handle), UserContext { user: None });

    provider.sign_in(user("u2"));
    watch.changed().await.unwrap();
    assert_eq!(use_user(&handle), UserContext { user: Some(user("u2")) });
}

#[tokio::test]
async fn test_use_user_fetch_failure_reads_signed_out() {
    let provider = MemoryProvider::with_user(user("u1"));
    provider.fail_next_fetch("timeout talking to auth server");

    let scope = mounted(&provider).await;

    assert!(!scope.user().is_signed_in());
}

#[tokio::test]
async fn test_handles_share_one_value() {
    let provider = MemoryProvider::with_user(user("u1"));
    let scope = mounted(&provider).await;
    let a = scope.handle();
    let b = a.clone();

    let mut watch = a.watch();
    provider.sign_in(user("u3"));
    watch.changed().await.unwrap();

    assert_eq!(use_user(&a), use_user(&b));
    assert_eq!(use_user(&b).user, Some(user("u3")));
}

#[tokio::test]
async fn test_handle_usable_from_spawned_task() {
    let provider = MemoryProvider::with_user(user("u1"));
    let scope = mounted(&provider).await;
    let handle = scope.handle();

    let ctx = tokio::spawn(async move { use_user(&handle) }).await.unwrap();

    assert_eq!(ctx.user, Some(user("u1")));
}

// =========================================================================
// Outside the scope
// =========================================================================

#[tokio::test]
#[should_panic(expected = "outside an active UserProvider scope")]
async fn test_use_user_after_unmount_panics() {
    let provider = MemoryProvider::new();
    let scope = mounted(&provider).await;
    let handle = scope.handle();
    scope.unmount();

    use_user(&handle);
}

#[tokio::test]
async fn test_try_use_user_after_unmount_is_scope_violation() {
    let provider = MemoryProvider::new();
    let scope = mounted(&provider).await;
    let handle = scope.handle();
    assert!(handle.is_active());

    drop(scope);

    assert!(!handle.is_active());
    let err: AuthsyncError = try_use_user(&handle).unwrap_err().into();
    assert!(err.is_scope_violation());
}

#[tokio::test]
async fn test_watch_after_unmount_is_scope_violation() {
    let provider = MemoryProvider::new();
    let scope = mounted(&provider).await;
    let handle = scope.handle();
    let mut watch = handle.watch();

    let waiter = tokio::spawn(async move { watch.changed().await });
    tokio::task::yield_now().await;
    scope.unmount();

    assert!(matches!(
        waiter.await.unwrap(),
        Err(SessionError::ScopeViolation)
    ));
}

#[tokio::test]
async fn test_scope_body_handle_escaping_is_rejected() {
    let provider = MemoryProvider::with_user(user("u1"));

    let (inside, escaped) = UserProvider::new(provider)
        .scope(|handle| async move {
            // The fetch may not have landed yet; just prove reads work.
            let inside = try_use_user(&handle).is_ok();
            (inside, handle)
        })
        .await
        .unwrap();

    assert!(inside);
    assert!(try_use_user(&escaped).is_err());
}

// =========================================================================
// Teardown
// =========================================================================

#[tokio::test]
async fn test_unmount_unsubscribes_once() {
    let provider = MemoryProvider::new();
    let scope = mounted(&provider).await;
    assert!(scope.is_subscribed());
    assert!(scope.subscription_id().is_some());

    assert!(scope.unmount());

    assert_eq!(provider.unsubscribe_count(), 1);
    assert_eq!(provider.subscriber_count(), 0);
}

#[tokio::test]
async fn test_unmount_without_subscription_is_safe() {
    let provider = MemoryProvider::new();
    provider.fail_subscribe(Some("realtime disabled".into()));
    let scope = mounted(&provider).await;

    assert!(!scope.is_subscribed());
    assert!(!scope.unmount());
    assert_eq!(provider.unsubscribe_count(), 0);
}

#[tokio::test]
async fn test_unmount_before_fetch_resolves() {
    let provider = MemoryProvider::with_user(user("u1"));
    provider.hold_fetch();
    let scope = UserProvider::new(provider.clone()).mount().unwrap();
    let handle = scope.handle();
    while provider.fetch_count() == 0 {
        tokio::task::yield_now().await;
    }

    assert!(scope.unmount());
    provider.release_fetch();

    assert_eq!(provider.unsubscribe_count(), 1);
    assert!(try_use_user(&handle).is_err());
}

// =========================================================================
// Remounting
// =========================================================================

#[tokio::test]
async fn test_remount_on_shared_store_revives_handles() {
    let provider = MemoryProvider::with_user(user("u1"));
    let store = Arc::new(SessionStore::new());

    let first = UserProvider::new(provider.clone())
        .store(Arc::clone(&store))
        .mount().unwrap();
    first.ready().await;
    let handle = first.handle();
    first.unmount();
    assert!(try_use_user(&handle).is_err());

    let second = UserProvider::new(provider.clone())
        .store(store)
        .label("remounted")
        .mount().unwrap();
    second.ready().await;

    assert_eq!(use_user(&handle).user, Some(user("u1")));
    assert_eq!(second.handle().label(), "remounted");
}

#[tokio::test]
async fn test_mount_on_store_of_live_scope_is_rejected() {
    let provider = MemoryProvider::with_user(user("u1"));
    let store = Arc::new(SessionStore::new());
    let first = UserProvider::new(provider.clone())
        .store(Arc::clone(&store))
        .mount()
        .unwrap();
    first.ready().await;

    let second = UserProvider::new(provider.clone())
        .store(Arc::clone(&store))
        .mount();

    assert!(matches!(second, Err(SessionError::StoreInUse)));
    assert_eq!(provider.subscriber_count(), 1, "rejected mount must not subscribe");
    assert_eq!(use_user(&first.handle()).user, Some(user("u1")));

    assert!(first.unmount());
    assert!(!store.is_attached());
}

#[tokio::test]
async fn test_scope_on_store_of_live_scope_skips_body() {
    let provider = MemoryProvider::new();
    let store = Arc::new(SessionStore::new());
    let first = UserProvider::new(provider.clone())
        .store(Arc::clone(&store))
        .mount()
        .unwrap();

    let result = UserProvider::new(provider)
        .store(store)
        .scope(|_| async { panic!("body must not run") })
        .await;

    assert!(matches!(result, Err(SessionError::StoreInUse)));
    assert!(first.handle().is_active());
}

#[test]
fn test_mount_outside_runtime_is_rejected() {
    let result = UserProvider::new(MemoryProvider::new()).mount();

    assert!(matches!(result, Err(SessionError::NoRuntime)));
}

#[tokio::test]
async fn test_config_prefer_notifications_flows_through_builder() {
    let provider = MemoryProvider::with_user(user("u1"));
    provider.hold_fetch();
    let scope = UserProvider::new(provider.clone())
        .config(SyncConfig {
            fetch_race: FetchRacePolicy::PreferNotifications,
            ..SyncConfig::default()
        })
        .mount().unwrap();
    while provider.fetch_count() == 0 {
        tokio::task::yield_now().await;
    }
    let mut watch = scope.handle().watch();

    provider.sign_in(user("u2"));
    watch.changed().await.unwrap();
    provider.release_fetch();
    scope.ready().await;

    assert_eq!(scope.user().user, Some(user("u2")));
}
