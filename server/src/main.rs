mod chat;
mod config;
mod connection;
mod deck_store;
mod registry;

use std::sync::Arc;

use axum::extract::ws::WebSocket;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{reload_config, EnvConfig};
use crate::registry::AppState;

#[tokio::main]
/// Activates error tracing, spawns a watchdog task to sweep eventual dead
/// games, then sets up the routing system serving websockets and the
/// `/reload`/`/enlist` admin pages. Bind address and deck directory come
/// from the environment (§4.6).
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .init();

    let env_config = EnvConfig::from_env();
    let app_state = Arc::new(AppState::new(env_config.deck_dir.clone()));

    let watchdog_state = app_state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(1200));
        loop {
            interval.tick().await;
            for game_id in watchdog_state.sweep_terminal_games().await {
                tracing::info!(game_id, "watchdog removed terminal game");
            }
        }
    });

    if let Err(message) = reload_config(&app_state).await {
        tracing::warn!(message, "initial table template load failed, starting with none");
    }

    let app = Router::new()
        .route("/reload", get(reload_handler))
        .route("/enlist", get(enlist_handler))
        .route("/ws", get(websocket_handler))
        .with_state(app_state)
        .fallback_service(ServeDir::new(".").not_found_service(ServeFile::new("index.html")));

    let listener = tokio::net::TcpListener::bind(&env_config.bind_addr).await.unwrap();
    tracing::info!(addr = env_config.bind_addr, "listening");
    axum::serve(listener, app).await.unwrap();
}

/// Lists every live game and its occupancy — a debugging aid, not part of
/// the protocol surface.
async fn enlist_handler(State(state): State<Arc<AppState>>) -> String {
    state.debug_listing().await
}

/// Forces a reload of `TableTemplates.json` without restarting the
/// process (§4.6).
async fn reload_handler(State(state): State<Arc<AppState>>) -> String {
    match reload_config(&state).await {
        Ok(_) => {
            let templates = state.table_templates.read().await;
            templates
                .values()
                .map(|t| format!("{:<30} max_players={} spectators={}", t.name, t.max_players, t.spectators_allowed))
                .collect::<Vec<_>>()
                .join("\n")
        }
        Err(e) => format!("Config reload failed: {e}"),
    }
}

async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket: WebSocket| connection::handle_socket(socket, state))
}
