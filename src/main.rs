//! Collection box launcher.
//!
//! Wires the engine to the outside world: database, Telegram gateway, the idle
//! session sweeper and a small axum server that receives webhook updates.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use collection_box::{
    bot::{self, BotData, Update, gateway::TelegramGateway},
    config::{self, database},
    conversation::{SessionStore, spawn_sweeper},
    errors::{Error, Result},
};
use dotenvy::dotenv;
use serde::Serialize;
use std::{env, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// `GET /health`
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST {webhook_path}`. A failed event answers 500 so the platform redelivers it.
async fn webhook(State(data): State<Arc<BotData>>, Json(update): Json<Update>) -> StatusCode {
    let update_id = update.update_id;
    let Some(event) = update.into_event() else {
        return StatusCode::OK;
    };
    match bot::handle_event(&data, event).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            error!(update_id, "Update failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Settings and database
    let settings = Arc::new(config::settings::load_settings()?);
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;
    info!("Database ready");

    // 4. Gateway. The token is read right before use and never stored in settings
    let token = env::var("TELEGRAM_BOT_TOKEN")
        .inspect_err(|e| error!("TELEGRAM_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;
    let gateway = Arc::new(TelegramGateway::new(&settings.api_url, &token));
    match gateway.get_me().await {
        Ok(me) => info!(bot_id = me.id, username = me.username.as_deref(), "Authenticated with Telegram"),
        Err(e) => warn!("Could not verify bot token: {e}"),
    }
    if let Ok(base_url) = env::var("WEBHOOK_URL") {
        let url = format!("{}{}", base_url.trim_end_matches('/'), settings.webhook_path);
        gateway
            .set_webhook(&url)
            .await
            .inspect_err(|e| error!("Failed to register webhook: {e}"))?;
        info!(%url, "Webhook registered");
    }

    // 5. Sessions and the idle sweep
    let sessions = Arc::new(SessionStore::new());
    spawn_sweeper(
        Arc::clone(&sessions),
        settings.sweep_interval(),
        settings.session_timeout(),
    );

    // 6. Webhook receiver
    let data = Arc::new(BotData::new(db, sessions, gateway, Arc::clone(&settings)));
    let app = Router::new()
        .route("/health", get(health))
        .route(&settings.webhook_path, post(webhook))
        .with_state(data);

    let listener = tokio::net::TcpListener::bind(&settings.listen_addr).await?;
    info!("Listening on {} (webhook at {})", settings.listen_addr, settings.webhook_path);
    axum::serve(listener, app).await?;

    Ok(())
}
