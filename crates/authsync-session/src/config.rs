//! Configuration for [`SessionSync`](crate::SessionSync).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FetchRacePolicy
// ---------------------------------------------------------------------------

/// What to do when the initial fetch resolves after a sign-in/out
/// notification has already been applied.
///
/// The fetch and the subscription start together, so a notification can
/// overtake the fetch. The fetch's answer is then older than the store's
/// value.
///
/// ```text
/// mount ──fetch──────────────────────────┐
///   └──subscribe── SIGNED_IN(u2) ─ store=u2 ─ fetch lands(u1) ─ store=?
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchRacePolicy {
    /// Apply the fetch result whenever it lands, even if it is stale.
    /// Inputs are applied strictly in the order they arrive.
    #[default]
    Overwrite,
    /// Drop the fetch result if a sign-in/out notification was applied
    /// while the fetch was pending.
    PreferNotifications,
}

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

/// Settings for one mounted sync.
///
/// `#[serde(default)]` lets a partial config (even `{}`) deserialize,
/// with missing fields taken from [`SyncConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Name for this scope in log fields. Useful when an application
    /// mounts more than one provider (e.g. an admin console next to the
    /// main app).
    pub label: String,

    /// How a stale initial fetch is handled.
    pub fetch_race: FetchRacePolicy,

    /// Whether to ask the provider for its current session on mount.
    /// With `false` the store stays empty until the first notification.
    pub fetch_on_mount: bool,
}

impl SyncConfig {
    /// Label used when none (or an empty one) is configured.
    pub const DEFAULT_LABEL: &'static str = "user";

    /// Creates a default config with the given label.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Fixes values that would make logs confusing. Called by
    /// [`SessionSync::start`](crate::SessionSync::start).
    ///
    /// - blank `label` → [`Self::DEFAULT_LABEL`], surrounding whitespace trimmed
    pub fn validated(mut self) -> Self {
        let trimmed = self.label.trim();
        if trimmed.is_empty() {
            self.label = Self::DEFAULT_LABEL.to_string();
        } else if trimmed.len() != self.label.len() {
            self.label = trimmed.to_string();
        }
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            label: Self::DEFAULT_LABEL.to_string(),
            fetch_race: FetchRacePolicy::default(),
            fetch_on_mount: true,
        }
    }
}
