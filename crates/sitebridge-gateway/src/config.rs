//! Environment-driven gateway configuration.

use std::net::SocketAddr;

use sitebridge_limiter::RateLimitConfig;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub rate_limit: RateLimitConfig,
    /// Optional model override handed to the provider on every request.
    pub model: Option<String>,
}

impl GatewayConfig {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = std::env::var("SITEBRIDGE_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".into())
            .parse()?;

        let mut rate_limit = RateLimitConfig::default();
        if let Some(limit) = env_u32("SITEBRIDGE_CLIENT_LIMIT") {
            rate_limit.client_limit = limit;
        }
        if let Some(limit) = env_u32("SITEBRIDGE_GLOBAL_LIMIT") {
            rate_limit.global_limit = limit;
        }

        let model = std::env::var("SITEBRIDGE_MODEL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            bind_addr,
            rate_limit,
            model,
        })
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|value| value.trim().parse().ok())
}
