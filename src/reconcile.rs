//! Local projections of the two remote tables, advanced one change event at
//! a time. Application is pure state transition: no reads, no transport, so
//! the seed/live race resolves the same way no matter which side wins —
//! repeated inserts are guarded by id, repeated deletes are no-ops.

use serde::Deserialize;
use serde_json::{from_value, Value};
use uuid::Uuid;

use crate::model::{Message, Profile};
use crate::remote::RowChange;

#[derive(Deserialize)]
struct RowId {
    id: Uuid,
}

fn row_id(row: &Value) -> Option<Uuid> {
    from_value::<RowId>(row.clone()).ok().map(|row| row.id)
}

/// The message list: grows at the tail in event-arrival order, shrinks on
/// deletes. Never re-sorted; arrival order is trusted to follow creation
/// order.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn seeded(messages: Vec<Message>) -> MessageLog {
        MessageLog { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn apply(&mut self, change: RowChange) {
        match change {
            RowChange::Insert { record } => {
                let Ok(msg) = from_value::<Message>(record) else {
                    return;
                };
                if self.messages.iter().any(|m| m.id == msg.id) {
                    return;
                }
                self.messages.push(msg);
            }
            // messages are immutable once created
            RowChange::Update { .. } => {}
            RowChange::Delete { old_record } => {
                let Some(id) = row_id(&old_record) else {
                    return;
                };
                self.messages.retain(|m| m.id != id);
            }
        }
    }
}

/// The online-user list: at any point it holds exactly the profiles whose
/// most recent event left them online, one entry per id, most recently
/// updated last.
#[derive(Debug, Default)]
pub struct Roster {
    online: Vec<Profile>,
}

impl Roster {
    pub fn seeded(profiles: Vec<Profile>) -> Roster {
        let mut roster = Roster::default();
        for profile in profiles {
            if profile.online && !roster.contains(profile.id) {
                roster.online.push(profile);
            }
        }
        roster
    }

    pub fn users(&self) -> &[Profile] {
        &self.online
    }

    fn contains(&self, id: Uuid) -> bool {
        self.online.iter().any(|p| p.id == id)
    }

    fn remove(&mut self, id: Uuid) {
        self.online.retain(|p| p.id != id);
    }

    pub fn apply(&mut self, change: RowChange) {
        match change {
            RowChange::Insert { record } => {
                let Ok(profile) = from_value::<Profile>(record) else {
                    return;
                };
                if profile.online && !self.contains(profile.id) {
                    self.online.push(profile);
                }
            }
            RowChange::Update { record } => {
                let Ok(profile) = from_value::<Profile>(record) else {
                    return;
                };
                // remove-then-append so the entry carries the latest fields
                // and moves to the most-recently-updated position
                self.remove(profile.id);
                if profile.online {
                    self.online.push(profile);
                }
            }
            RowChange::Delete { old_record } => {
                let Some(id) = row_id(&old_record) else {
                    return;
                };
                self.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn uid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn msg_record(n: u128, user: &str, content: &str) -> Value {
        json!({
            "id": uid(n),
            "content": content,
            "user_name": user,
            "created_at": "2026-08-06T10:00:00Z",
        })
    }

    fn profile_record(n: u128, name: &str, online: bool) -> Value {
        json!({
            "id": uid(n),
            "name": name,
            "online": online,
            "last_seen": "2026-08-06T10:00:00Z",
        })
    }

    fn insert(record: Value) -> RowChange {
        RowChange::Insert { record }
    }

    fn update(record: Value) -> RowChange {
        RowChange::Update { record }
    }

    fn delete(n: u128) -> RowChange {
        RowChange::Delete { old_record: json!({ "id": uid(n) }) }
    }

    #[test]
    fn messages_follow_event_arrival_order() {
        let mut log = MessageLog::default();

        log.apply(insert(msg_record(1, "a", "hi")));
        assert_eq!(log.messages().len(), 1);

        log.apply(insert(msg_record(2, "b", "hey")));
        let contents: Vec<_> = log.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["hi", "hey"]);

        log.apply(delete(1));
        let contents: Vec<_> = log.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["hey"]);
    }

    #[test]
    fn message_delete_is_idempotent() {
        let mut log = MessageLog::default();
        log.apply(insert(msg_record(1, "a", "hi")));
        log.apply(insert(msg_record(2, "b", "hey")));

        log.apply(delete(1));
        log.apply(delete(1));
        assert_eq!(log.messages().len(), 1);
        assert_eq!(log.messages()[0].id, uid(2));
    }

    #[test]
    fn message_delete_of_unknown_id_is_a_noop() {
        let mut log = MessageLog::default();
        log.apply(insert(msg_record(1, "a", "hi")));

        log.apply(delete(9));
        assert_eq!(log.messages().len(), 1);
    }

    #[test]
    fn duplicate_message_insert_is_ignored() {
        // a message from the seed read can arrive again as a live event
        let seed = vec![from_value(msg_record(1, "a", "hi")).unwrap()];
        let mut log = MessageLog::seeded(seed);

        log.apply(insert(msg_record(1, "a", "hi")));
        assert_eq!(log.messages().len(), 1);
    }

    #[test]
    fn message_updates_are_ignored() {
        let mut log = MessageLog::default();
        log.apply(insert(msg_record(1, "a", "hi")));

        log.apply(update(msg_record(1, "a", "edited")));
        assert_eq!(log.messages()[0].content, "hi");
    }

    #[test]
    fn malformed_message_record_is_skipped() {
        let mut log = MessageLog::default();
        log.apply(insert(msg_record(1, "a", "hi")));

        log.apply(insert(json!({ "id": "not-a-uuid" })));
        log.apply(RowChange::Delete { old_record: json!({}) });
        assert_eq!(log.messages().len(), 1);
    }

    #[test]
    fn roster_tracks_online_flip_cycle() {
        let mut roster = Roster::default();

        roster.apply(insert(profile_record(1, "a", true)));
        assert_eq!(roster.users().len(), 1);

        roster.apply(update(profile_record(1, "a", false)));
        assert!(roster.users().is_empty());

        roster.apply(insert(profile_record(1, "a", true)));
        assert_eq!(roster.users().len(), 1);
        assert_eq!(roster.users()[0].name, "a");
    }

    #[test]
    fn offline_insert_is_ignored() {
        let mut roster = Roster::default();
        roster.apply(insert(profile_record(1, "a", false)));
        assert!(roster.users().is_empty());
    }

    #[test]
    fn insert_after_online_update_does_not_duplicate() {
        let mut roster = Roster::default();
        roster.apply(update(profile_record(1, "a", true)));
        roster.apply(insert(profile_record(1, "a", true)));
        assert_eq!(roster.users().len(), 1);
    }

    #[test]
    fn online_update_refreshes_entry_and_position() {
        let mut roster = Roster::seeded(vec![
            from_value(profile_record(1, "a", true)).unwrap(),
            from_value(profile_record(2, "b", true)).unwrap(),
        ]);

        roster.apply(update(profile_record(1, "fresh", true)));
        let names: Vec<_> = roster.users().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["b", "fresh"]);
    }

    #[test]
    fn roster_delete_removes_and_is_idempotent() {
        let mut roster = Roster::default();
        roster.apply(insert(profile_record(1, "a", true)));

        roster.apply(delete(1));
        assert!(roster.users().is_empty());

        roster.apply(delete(1));
        assert!(roster.users().is_empty());
    }

    #[test]
    fn roster_seed_dedups_and_drops_offline_rows() {
        let roster = Roster::seeded(vec![
            from_value(profile_record(1, "a", true)).unwrap(),
            from_value(profile_record(1, "a", true)).unwrap(),
            from_value(profile_record(2, "b", false)).unwrap(),
        ]);
        assert_eq!(roster.users().len(), 1);
    }

    #[test]
    fn roster_equals_ids_whose_last_event_was_online() {
        let mut roster = Roster::default();
        let events = [
            insert(profile_record(1, "a", true)),
            insert(profile_record(2, "b", true)),
            update(profile_record(1, "a", false)),
            insert(profile_record(3, "c", true)),
            update(profile_record(2, "b", true)),
            delete(3),
        ];
        for event in events {
            roster.apply(event);
        }

        let ids: Vec<_> = roster.users().iter().map(|p| p.id).collect();
        assert_eq!(ids, [uid(2)]);
    }
}
