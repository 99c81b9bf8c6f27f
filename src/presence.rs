use tracing::warn;

use crate::{remote::Remote, AppResult};

/// Trimmed display name, or None when nothing is left to join with.
pub fn clean_name(name: &str) -> Option<&str> {
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

/// Mark `name` online, creating the profile row on first join.
pub async fn join(remote: &Remote, name: &str) -> AppResult<()> {
    remote.upsert_profile(name, true).await
}

/// Mark `name` offline. The profile row stays behind.
pub async fn leave(remote: &Remote, name: &str) -> AppResult<()> {
    remote.update_profile(name, false).await
}

/// Offline signal for a view that went away without leaving. Fire-and-forget:
/// nothing waits on it and delivery is not guaranteed.
pub fn mark_offline(remote: Remote, name: String) {
    tokio::spawn(async move {
        if let Err(err) = leave(&remote, &name).await {
            warn!("offline update for {name} lost: {}", err.0);
        }
    });
}
