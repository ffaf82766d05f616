//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the webhook server on its own.
//!
//! ## Intended use
//! Useful for development against a tunnelled webhook. The workspace's main `symbot-run` binary
//! serves the same router.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{listen_addr_from_env_values, router, AppState};
use symbot_core::{BotConfig, BotService};

/// Main entry point for the symbot REST API server
///
/// # Environment Variables
/// - `SYMBOT_REST_ADDR`: Server address (default: "0.0.0.0:5000", or `0.0.0.0:$PORT`)
/// - Messenger and symptom checker settings as read by [`BotConfig::from_lookup`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a required setting is missing or invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("symbot_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(BotConfig::from_lookup(|key| std::env::var(key).ok())?);
    let bot = BotService::from_config(&cfg, reqwest::Client::new());

    let addr = listen_addr_from_env_values(
        std::env::var("SYMBOT_REST_ADDR").ok(),
        std::env::var("PORT").ok(),
    );
    tracing::info!("-- Starting symbot REST API on {}", addr);

    let app = router(AppState::new(cfg, bot));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
