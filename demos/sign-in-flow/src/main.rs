use authsync::prelude::*;
use authsync::protocol::{Codec, JsonCodec};

// ---------------------------------------------------------------------------
// Provider frames
// ---------------------------------------------------------------------------

// What a hosted provider's realtime channel would push. A real adapter
// reads these off the network; here they are canned.

const SESSION_RESPONSE: &str = r#"{
    "session": {
        "access_token": "eyJhbGciOi...",
        "refresh_token": "r-1",
        "expires_at": 1893456000,
        "user": { "id": "u1", "email": "ada@example.com", "role": "authenticated" }
    }
}"#;

const FRAMES: &[&str] = &[
    r#"{"event":"TOKEN_REFRESHED","session":{"access_token":"eyJ...2","user":{"id":"u1"}}}"#,
    r#"{"event":"SIGNED_OUT","session":null}"#,
    r#"{"event":"SIGNED_IN","session":{"access_token":"eyJ...3","user":{"id":"u2","email":"grace@example.com"}}}"#,
];

// ---------------------------------------------------------------------------
// Consumers
// ---------------------------------------------------------------------------

/// A "component" deep in the tree: it only has the handle it was given.
fn render_header(handle: &ScopeHandle) -> String {
    let ctx = use_user(handle);
    serde_json::to_string(&ctx).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}

#[tokio::main]
async fn main() -> Result<(), AuthsyncError> {
    init_tracing();

    let codec = JsonCodec;
    let provider = MemoryProvider::new();
    provider.set_session(codec.decode_session(SESSION_RESPONSE.as_bytes())?);

    let scope = UserProvider::new(provider.clone()).label("demo").mount()?;
    scope.ready().await;
    let handle = scope.handle();
    println!("mounted:        {}", render_header(&handle));

    let mut watch = handle.watch();
    for frame in FRAMES {
        let change = codec.decode_state_change(frame.as_bytes())?;
        let event = change.event;
        provider.emit(change);

        // Ignored kinds never wake the watcher, so only wait on the two
        // kinds the store reacts to.
        if matches!(event, AuthEventKind::SignedIn | AuthEventKind::SignedOut) {
            watch.changed().await?;
        }
        println!("{:<15} {}", format!("{event}:"), render_header(&handle));
    }

    let unsubscribed = scope.unmount();
    tracing::info!(unsubscribed, "scope unmounted");

    match try_use_user(&handle) {
        Ok(_) => println!("after unmount:  still readable (unexpected)"),
        Err(e) => println!("after unmount:  {e}"),
    }
    Ok(())
}
