use axum::{debug_handler, extract::State, response::{Html, IntoResponse, Redirect, Response}, Form};
use rand::seq::IndexedRandom;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::warn;

use crate::{include_res, presence, remote::Remote, session::USER_NAME, AppResult};

#[debug_handler]
pub(crate) async fn index(session: Session) -> AppResult<Response> {
    if let Some(name) = session.get::<String>(USER_NAME).await? {
        Ok(Html(
            include_res!(str, "/pages/room.html").replace("{user_name}", &name)
        ).into_response())
    } else {
        Ok(Html(
            include_res!(str, "/pages/join.html").replace("{suggested}", &suggested_name())
        ).into_response())
    }
}

#[derive(Deserialize)]
pub(crate) struct JoinQuery {
    name: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn join(
    State(remote): State<Remote>,
    session: Session,
    Form(JoinQuery { name }): Form<JoinQuery>,
) -> AppResult<Response> {
    let Some(name) = presence::clean_name(&name) else {
        return Ok(Redirect::to("/").into_response());
    };

    // the view goes Joined once the write has been attempted; a lost write
    // only shows up as a missing roster entry
    if let Err(err) = presence::join(&remote, name).await {
        warn!("join upsert for {name} lost: {}", err.0);
    }
    session.insert(USER_NAME, name).await?;

    Ok(Redirect::to("/").into_response())
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn leave(
    State(remote): State<Remote>,
    session: Session,
) -> AppResult<Response> {
    if let Some(name) = session.remove::<String>(USER_NAME).await? {
        if let Err(err) = presence::leave(&remote, &name).await {
            warn!("leave update for {name} lost: {}", err.0);
        }
    }

    Ok(Redirect::to("/").into_response())
}

fn suggested_name() -> String {
    let adjectives = [
        "Quick", "Mysterious", "Jolly", "Brave", "Silent", "Witty", "Clever",
        "Gentle", "Bold", "Proud", "Eager", "Rusty", "Golden", "Bright", "Lucky",
    ];

    let nouns = [
        "Fox", "Bear", "Eagle", "Wolf", "Tiger", "Owl", "Falcon", "Shark",
        "Panda", "Phoenix", "Turtle", "Dolphin", "Whale", "Heron", "Lynx",
    ];

    format!(
        "{} {}",
        adjectives.choose(&mut rand::rng()).unwrap(),
        nouns.choose(&mut rand::rng()).unwrap(),
    )
}
