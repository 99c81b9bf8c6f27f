use axum::{
    debug_handler,
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::{
    presence,
    reconcile::{MessageLog, Roster},
    remote::{Feed, Remote, RowChange},
    room::view,
    session::USER_NAME,
    AppResult,
};

const SEED_LIMIT: usize = 50;

#[derive(Deserialize)]
struct ComposeQuery {
    content: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn room_ws(
    State(remote): State<Remote>,
    session: Session,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let Some(name) = session.get::<String>(USER_NAME).await? else {
        return Ok(StatusCode::FORBIDDEN.into_response());
    };

    Ok(ws
        .on_upgrade(move |socket| live_view(socket, remote, name))
        .into_response())
}

/// One connected page. Owns the two reconcilers and the two change-feed
/// subscriptions for exactly as long as the socket lives.
async fn live_view(page: WebSocket, remote: Remote, name: String) {
    info!("{name} viewing the room");

    // a reload tears the previous view down and marks the name offline;
    // re-assert presence for the new one
    if let Err(err) = presence::join(&remote, &name).await {
        warn!("presence refresh for {name} lost: {}", err.0);
    }

    // subscribe before the seed reads; whichever side of the race delivers a
    // row twice, the reconcilers absorb it
    let mut msg_feed = open_feed(&remote, "messages").await;
    let mut profile_feed = open_feed(&remote, "profiles").await;

    let seed = remote.recent_messages(SEED_LIMIT).await.unwrap_or_else(|err| {
        warn!("message seed read failed, starting empty: {}", err.0);
        Vec::new()
    });
    let mut log = MessageLog::seeded(seed);

    let online = remote.online_profiles().await.unwrap_or_else(|err| {
        warn!("roster seed read failed, starting empty: {}", err.0);
        Vec::new()
    });
    let mut roster = Roster::seeded(online);

    let (mut sender, mut receiver) = page.split();

    // first render also clears the page's loading indicator
    if push(&mut sender, "messages", view::messages_html(log.messages(), &name)).await.is_err()
        || push(&mut sender, "users", view::users_html(roster.users())).await.is_err()
    {
        presence::mark_offline(remote, name);
        return;
    }

    loop {
        tokio::select! {
            change = next_change(&mut msg_feed) => {
                log.apply(change);
                let html = view::messages_html(log.messages(), &name);
                if push(&mut sender, "messages", html).await.is_err() {
                    break;
                }
            }
            change = next_change(&mut profile_feed) => {
                roster.apply(change);
                if push(&mut sender, "users", view::users_html(roster.users())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                let Some(Ok(frame)) = incoming else {
                    break;
                };
                let Ok(ComposeQuery { content }) = serde_json::from_slice(&frame.into_data()) else {
                    continue;
                };

                let content = content.trim();
                if content.is_empty() {
                    continue;
                }

                // no local echo; the insert comes back through the feed
                if let Err(err) = remote.insert_message(content, &name).await {
                    warn!("message insert lost: {}", err.0);
                }
            }
        }
    }

    // view teardown: feeds die here, and whoever vanished without leaving
    // gets a best-effort offline mark
    drop(msg_feed);
    drop(profile_feed);
    presence::mark_offline(remote, name);
}

async fn open_feed(remote: &Remote, table: &str) -> Option<Feed> {
    match remote.subscribe(table).await {
        Ok(feed) => Some(feed),
        Err(err) => {
            warn!("{table} feed unavailable, view will be stale: {}", err.0);
            None
        }
    }
}

/// Next event off a feed; pends forever once the feed is dead so the select
/// loop stops polling it and the page keeps its stale state.
async fn next_change(feed: &mut Option<Feed>) -> RowChange {
    if let Some(live) = feed.as_mut() {
        if let Some(change) = live.next().await {
            return change;
        }
        *feed = None;
    }
    std::future::pending().await
}

async fn push(
    sender: &mut SplitSink<WebSocket, axum::extract::ws::Message>,
    kind: &str,
    html: String,
) -> Result<(), axum::Error> {
    let frame = serde_json::json!({ "kind": kind, "html": html }).to_string();
    sender.send(frame.into()).await
}
