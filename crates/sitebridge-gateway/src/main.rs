//! sitebridge Gateway - Entry Point

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitebridge_ai::create_provider_from_env;
use sitebridge_chat::ChatOrchestrator;
use sitebridge_content::PageFetcher;
use sitebridge_gateway::{build_routes, AppState, GatewayConfig};
use sitebridge_limiter::RateLimiter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "sitebridge_gateway=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sitebridge gateway v{}", env!("CARGO_PKG_VERSION"));

    let config = GatewayConfig::from_env()?;
    let provider = create_provider_from_env()?;
    tracing::info!(provider = provider.name(), "language model provider ready");

    let state = Arc::new(AppState {
        limiter: RateLimiter::new(config.rate_limit),
        fetcher: PageFetcher::new(),
        chat: ChatOrchestrator::new(provider).with_model(config.model.clone()),
    });

    let app = build_routes(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
