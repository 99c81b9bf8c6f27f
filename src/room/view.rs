use time::macros::format_description;

use crate::include_res;
use crate::model::{Message, Profile};

/// The full message pane, viewer's own messages styled apart.
pub(crate) fn messages_html(messages: &[Message], viewer: &str) -> String {
    let clock = format_description!("[hour]:[minute]");

    let mut out = String::new();
    for msg in messages {
        let mut content_html = String::new();
        pulldown_cmark::html::push_html(
            &mut content_html,
            pulldown_cmark::Parser::new(&msg.content),
        );

        out += &include_res!(str, "/pages/message.html")
            .replace("{mine}", if msg.user_name == viewer { "mine" } else { "theirs" })
            .replace("{user_name}", &msg.user_name)
            .replace("{content}", &content_html)
            .replace("{time}", &msg.created_at.format(clock).unwrap_or_default());
    }
    out
}

pub(crate) fn users_html(users: &[Profile]) -> String {
    let mut out = String::new();
    for user in users {
        out += &include_res!(str, "/pages/user_item.html").replace("{name}", &user.name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(user: &str, content: &str) -> Message {
        serde_json::from_value(json!({
            "id": uuid::Uuid::now_v7(),
            "content": content,
            "user_name": user,
            "created_at": "2026-08-06T09:15:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn message_pane_renders_content_and_author() {
        let html = messages_html(&[message("alice", "hello *world*")], "bob");

        assert!(html.contains("alice"));
        assert!(html.contains("hello <em>world</em>"));
        assert!(html.contains("theirs"));
        assert!(html.contains("09:15"));
    }

    #[test]
    fn own_messages_are_marked_mine() {
        let html = messages_html(&[message("alice", "hi")], "alice");
        assert!(html.contains("mine"));
    }

    #[test]
    fn roster_renders_one_item_per_user() {
        let users: Vec<Profile> = ["a", "b"]
            .iter()
            .map(|name| {
                serde_json::from_value(json!({
                    "id": uuid::Uuid::now_v7(),
                    "name": name,
                    "online": true,
                    "last_seen": "2026-08-06T09:15:00Z",
                }))
                .unwrap()
            })
            .collect();

        let html = users_html(&users);
        assert_eq!(html.matches("class=\"user\"").count(), 2);
    }
}
