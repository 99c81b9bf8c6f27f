use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::AppResult;

/// One row-level change pushed by the service for a subscribed table.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum RowChange {
    #[serde(rename = "INSERT")]
    Insert { record: Value },
    #[serde(rename = "UPDATE")]
    Update { record: Value },
    /// Deletes only carry the replica-identity columns of the old row.
    #[serde(rename = "DELETE")]
    Delete { old_record: Value },
}

#[derive(Deserialize)]
struct Frame {
    event: String,
    payload: Value,
}

const HEARTBEAT_SECS: u64 = 30;

/// Live subscription to one table's change events.
///
/// The feed owns its socket through a background task; `close` (or drop)
/// aborts the task and releases the connection. When the service ends the
/// stream the channel runs dry: no retry, the consumer keeps whatever state
/// it already holds.
pub struct Feed {
    events: mpsc::UnboundedReceiver<RowChange>,
    task: tokio::task::JoinHandle<()>,
}

impl Feed {
    pub(crate) async fn open(base: &str, key: &str, table: &str) -> AppResult<Feed> {
        // http -> ws, https -> wss
        let ws_base = base.replacen("http", "ws", 1);
        let url = format!("{ws_base}/realtime/v1/websocket?apikey={key}&vsn=1.0.0");

        let (stream, _) = connect_async(&url).await?;
        let (mut write, mut read) = stream.split();

        let topic = format!("realtime:public:{table}");
        let join = json!({
            "topic": topic,
            "event": "phx_join",
            "payload": {
                "config": {
                    "postgres_changes": [
                        { "event": "*", "schema": "public", "table": table }
                    ]
                }
            },
            "ref": "1",
        });
        write.send(WsMessage::Text(join.to_string())).await?;

        let feed_id = Uuid::now_v7();
        debug!(%feed_id, table, "change feed open");

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let mut heartbeat = interval(Duration::from_secs(HEARTBEAT_SECS));
            // interval fires immediately; the join frame just went out
            heartbeat.tick().await;
            let mut frame_ref: u64 = 2;

            loop {
                tokio::select! {
                    _ = heartbeat.tick() => {
                        let beat = json!({
                            "topic": "phoenix",
                            "event": "heartbeat",
                            "payload": {},
                            "ref": frame_ref.to_string(),
                        });
                        frame_ref += 1;
                        if write.send(WsMessage::Text(beat.to_string())).await.is_err() {
                            break;
                        }
                    }
                    frame = read.next() => match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            let Ok(frame) = serde_json::from_str::<Frame>(&text) else {
                                continue;
                            };
                            if frame.event != "postgres_changes" {
                                continue;
                            }
                            let Some(data) = frame.payload.get("data") else {
                                continue;
                            };
                            let Ok(change) = serde_json::from_value::<RowChange>(data.clone()) else {
                                continue;
                            };
                            if tx.send(change).is_err() {
                                break;
                            }
                        }
                        Some(Ok(WsMessage::Close(_))) | None => {
                            debug!(%feed_id, "change feed closed by service");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            warn!(%feed_id, "change feed transport error: {err}");
                            break;
                        }
                    }
                }
            }
        });

        Ok(Feed { events: rx, task })
    }

    /// Next change, or None once the feed is dead.
    pub async fn next(&mut self) -> Option<RowChange> {
        self.events.recv().await
    }

    pub fn close(&mut self) {
        self.task.abort();
    }
}

impl Drop for Feed {
    fn drop(&mut self) {
        self.task.abort();
    }
}
