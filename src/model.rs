use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Row of the remote `messages` table. Immutable once created;
/// the service assigns `id` and `created_at`.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub user_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Row of the remote `profiles` table, one per display name.
/// Rows persist after going offline; only `online`/`last_seen` flip.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub online: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_row_decodes() {
        let msg: Message = serde_json::from_value(serde_json::json!({
            "id": "0195fd2a-7a70-7000-8000-000000000001",
            "content": "hi there",
            "user_name": "alice",
            "created_at": "2026-08-06T12:30:00.123456+00:00",
        }))
        .unwrap();

        assert_eq!(msg.content, "hi there");
        assert_eq!(msg.user_name, "alice");
        assert_eq!(msg.created_at.hour(), 12);
    }

    #[test]
    fn profile_row_decodes() {
        let profile: Profile = serde_json::from_value(serde_json::json!({
            "id": "0195fd2a-7a70-7000-8000-000000000002",
            "name": "bob",
            "online": true,
            "last_seen": "2026-08-06T12:30:00Z",
        }))
        .unwrap();

        assert_eq!(profile.name, "bob");
        assert!(profile.online);
    }
}
