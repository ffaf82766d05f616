use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{listen_addr_from_env_values, router, AppState};
use symbot_core::{BotConfig, BotService};

/// Main entry point for the symbot application
///
/// Resolves configuration once, builds the bot service and serves the webhook router until
/// interrupted.
///
/// # Environment Variables
/// - `SYMBOT_REST_ADDR`: webhook server address (default: "0.0.0.0:5000", or `0.0.0.0:$PORT`)
/// - `MESSENGER_APP_SECRET`, `MESSENGER_VALIDATION_TOKEN`, `MESSENGER_PAGE_ACCESS_TOKEN`,
///   `SERVER_URL`: Messenger app settings (required)
/// - `SYMPTOM_CHECKER_USER_ID`, `SYMPTOM_CHECKER_PASSWORD`: lookup credentials (required)
/// - `SYMPTOM_CHECKER_*`, `DIAGNOSIS_SEARCH_URL`, `MESSENGER_GRAPH_API_URL`: optional overrides
///
/// # Returns
/// * `Ok(())` - If the server shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("symbot_run=info".parse()?)
                .add_directive("symbot_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(BotConfig::from_lookup(|key| std::env::var(key).ok())?);
    tracing::info!(
        "symptom checker at {} (timeout {:?}), send API at {}",
        cfg.lookup().endpoint,
        cfg.lookup().timeout,
        cfg.graph_api_url()
    );

    let bot = BotService::from_config(&cfg, reqwest::Client::new());
    let rest_addr = listen_addr_from_env_values(
        std::env::var("SYMBOT_REST_ADDR").ok(),
        std::env::var("PORT").ok(),
    );

    tracing::info!("++ Starting symbot webhook on {}", rest_addr);

    let app = router(AppState::new(cfg, bot));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("-- Shutting down symbot webhook");
        })
        .await?;

    Ok(())
}
