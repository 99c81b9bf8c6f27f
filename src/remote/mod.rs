mod feed;

pub use feed::{Feed, RowChange};

use reqwest::RequestBuilder;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{model::{Message, Profile}, AppResult};

/// Client for the hosted table service. All durable chat state lives there;
/// this side only issues row reads/writes and opens change feeds.
#[derive(Clone)]
pub struct Remote {
    http: reqwest::Client,
    base: String,
    key: String,
}

impl Remote {
    pub fn new(base: String, key: String) -> Remote {
        Remote {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_owned(),
            key,
        }
    }

    fn rest(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.key).bearer_auth(&self.key)
    }

    /// The most recent `limit` messages, returned in created_at ascending
    /// order for display.
    pub async fn recent_messages(&self, limit: usize) -> AppResult<Vec<Message>> {
        let limit = limit.to_string();
        let mut rows: Vec<Message> = self
            .authed(self.http.get(self.rest("messages")))
            .query(&[
                ("select", "*"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        rows.reverse();
        Ok(rows)
    }

    pub async fn online_profiles(&self) -> AppResult<Vec<Profile>> {
        Ok(self
            .authed(self.http.get(self.rest("profiles")))
            .query(&[("select", "*"), ("online", "eq.true")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// The service assigns id and created_at.
    pub async fn insert_message(&self, content: &str, user_name: &str) -> AppResult<()> {
        self.authed(self.http.post(self.rest("messages")))
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({
                "content": content,
                "user_name": user_name,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Upsert keyed by display name: creates the profile row or flips an
    /// existing one.
    pub async fn upsert_profile(&self, name: &str, online: bool) -> AppResult<()> {
        self.authed(self.http.post(self.rest("profiles")))
            .query(&[("on_conflict", "name")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&serde_json::json!({
                "name": name,
                "online": online,
                "last_seen": now_rfc3339()?,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn update_profile(&self, name: &str, online: bool) -> AppResult<()> {
        self.authed(self.http.patch(self.rest("profiles")))
            .query(&[("name", &format!("eq.{name}"))])
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({
                "online": online,
                "last_seen": now_rfc3339()?,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Open the change feed for one table. The returned handle owns the
    /// transport; dropping or closing it releases the connection.
    pub async fn subscribe(&self, table: &str) -> AppResult<Feed> {
        Feed::open(&self.base, &self.key, table).await
    }
}

fn now_rfc3339() -> AppResult<String> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}
