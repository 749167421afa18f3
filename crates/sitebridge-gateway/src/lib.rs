//! sitebridge Gateway - HTTP boundary
//!
//! This crate implements the HTTP surface of sitebridge, handling:
//! - `POST /chat` - rate-limited, site-grounded chat completions
//! - `POST /{target}` - the MCP-style JSON-RPC tool protocol
//! - `GET /{path}` - hand-off redirects to the front-end
//! - permissive CORS on every response

pub mod config;
pub mod router;

pub use config::GatewayConfig;
pub use router::{build_routes, AppState};

/// Gateway version
pub const GATEWAY_VERSION: &str = env!("CARGO_PKG_VERSION");
