//! Voice Gateway - Entry point.

use anyhow::{Context, Result};
use mail_client::MailClient;
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use voice_gateway::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    config::Config,
};

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log.level);

    if let Err(e) = run(config).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run(config: Config) -> Result<()> {
    info!("Starting Voice Gateway");

    let store = identity_store::shared(&config.store.url)
        .await
        .context("Failed to open identity store")?;
    info!(
        backend = store.backend_name(),
        users = store.user_count().await,
        "Identity store ready"
    );

    let mail = match &config.email.api_key {
        Some(key) => Some(
            MailClient::new(
                &config.email.api_url,
                key.expose_secret().as_str(),
                &config.email.from,
            )
            .context("Failed to create mail client")?,
        ),
        None => {
            warn!("EMAIL__API_KEY not set, sign-in links cannot be sent");
            None
        }
    };

    if !config.auth.protect_token {
        warn!("AUTH__PROTECT_TOKEN is off, anyone can obtain access tokens");
    }

    let state = AppState::from_config(&config, store.clone(), mail);
    let rate_limit = RateLimitState::new(config.rate_limit.global_per_minute);
    let app = create_router_with_rate_limit(state, rate_limit);

    let addr = config.server.socket_addr()?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Voice Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
