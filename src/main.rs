//! Chat relay - forwards chat messages to a hosted inference endpoint
//!
//! Accepts a chat message over HTTP, asks the configured model once, turns
//! its output into a readable answer, and logs the exchange to SQLite.

mod api;
mod config;
mod conversation_log;
mod db;
mod inference;
mod normalizer;
mod relay;

#[cfg(test)]
mod testing;

use api::{create_router, AppState};
use config::RelayConfig;
use conversation_log::ConversationLogger;
use db::Database;
use inference::{HttpInferenceBackend, LoggingBackend};
use relay::ChatRelay;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_relay=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = RelayConfig::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = PathBuf::from(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path, "Opening database");
    let db = Database::open(&config.db_path)?;

    // Outbound clients are built once and shared by every request
    let backend = HttpInferenceBackend::new(
        config.endpoint.clone(),
        config.api_key.clone(),
        config.connect_timeout,
        config.read_timeout,
    )?;
    let backend = Arc::new(LoggingBackend::new(Arc::new(backend)));

    tracing::info!(
        mode = %config.mode,
        endpoint = %config.endpoint,
        connect_timeout_ms = %config.connect_timeout.as_millis(),
        read_timeout_ms = %config.read_timeout.as_millis(),
        "Inference client initialized"
    );

    let logger = ConversationLogger::new(Arc::new(db), config.log_write_timeout);
    let relay = ChatRelay::new(config.mode, config.generation, backend, logger);
    let state = AppState::new(relay);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Chat relay listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
