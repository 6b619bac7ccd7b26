use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use washdesk_api::{build_router, config::Config, retention, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting WashDesk API server");
    tracing::info!("Config loaded: {}:{} ({})", config.server.host, config.server.port, config.environment);

    let report = config.check();
    for error in &report.errors {
        tracing::error!("Configuration error: {}", error);
    }
    for warning in &report.warnings {
        tracing::warn!("Configuration warning: {}", warning);
    }

    let state = Arc::new(AppState::from_config(config.clone()).await?);

    tracing::info!(
        gupshup = state.gupshup.is_some(),
        twilio = state.twilio.is_some(),
        auto_responses = config.assistant.auto_responses,
        "providers initialised"
    );

    let _sweeper = retention::spawn(
        state.store.clone(),
        config.database.retention_days,
        Duration::from_secs(config.database.sweep_interval_hours.max(1) * 3600),
    );

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("Webhook URL: http://{}/webhook/gupshup", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        }
        _ => {
            registry.with(tracing_subscriber::fmt::layer().pretty()).init();
        }
    }
}
