mod page;
mod view;
mod ws;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(page::index))
        .route("/join", post(page::join))
        .route("/leave", post(page::leave))
        .route("/ws", get(ws::room_ws))
}
