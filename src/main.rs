use parlor::{remote::Remote, res, room, AppState};
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "parlor=info".into()))
        .init();

    // Both are required; there is no running without the hosted service.
    let service_url = dotenv::var("PARLOR_SERVICE_URL").unwrap();
    let service_key = dotenv::var("PARLOR_SERVICE_KEY").unwrap();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(2)));

    let app_state = AppState {
        remote: Remote::new(service_url, service_key),
    };

    let app = Router::new()
        .merge(room::router())
        .route("/style.css", get(res::style))
        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive());

    info!("listening on 0.0.0.0:8080");
    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
