//! Request routing for the sitebridge gateway.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sitebridge_ai::ChatTurn;
use sitebridge_chat::ChatOrchestrator;
use sitebridge_content::{PageFetcher, CHAT_GROUNDING_MAX_CHARS};
use sitebridge_limiter::RateLimiter;
use sitebridge_protocol::McpDispatcher;

/// Anything longer than this is treated as a caller-provided API key and
/// skips the shared-quota limiter. Length is the only check performed.
const API_KEY_BYPASS_MIN_LEN: usize = 10;

/// Shared per-process services behind the HTTP boundary.
pub struct AppState {
    pub limiter: RateLimiter,
    pub fetcher: PageFetcher,
    pub chat: ChatOrchestrator,
}

/// Build the gateway router over shared state.
pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chat", post(handle_chat))
        .route("/*target", post(handle_mcp).get(redirect_to_index))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    url: Option<String>,
    message: Option<String>,
    #[serde(default)]
    history: Vec<ChatTurn>,
    api_key: Option<String>,
}

/// Minimal service banner; the real landing page lives in the front-end.
async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "service": "sitebridge",
        "version": crate::GATEWAY_VERSION,
        "endpoints": {
            "chat": "POST /chat",
            "mcp": "POST /{target-url-or-domain}",
        },
    }))
}

async fn handle_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Response {
    let (Some(url), Some(message)) = (non_empty(body.url), non_empty(body.message)) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Both url and message are required" })),
        )
            .into_response();
    };

    let bypass = body
        .api_key
        .as_deref()
        .is_some_and(|key| key.len() > API_KEY_BYPASS_MIN_LEN);
    if !bypass {
        let decision = state.limiter.check(&client_id(&headers));
        if !decision.allowed {
            let retry_after = decision.reset_in.as_secs();
            let reason = decision
                .reason
                .map_or("Rate limit exceeded.", |reason| reason.message());
            return (
                StatusCode::TOO_MANY_REQUESTS,
                [
                    (header::RETRY_AFTER.as_str(), retry_after.to_string()),
                    ("x-ratelimit-remaining", "0".to_string()),
                ],
                Json(json!({ "error": reason, "retryAfter": retry_after })),
            )
                .into_response();
        }
    }

    let target = normalize_target(&url);
    let grounding = state
        .fetcher
        .fetch_markdown(&target, CHAT_GROUNDING_MAX_CHARS)
        .await;

    match state
        .chat
        .complete(&target, &grounding.text, &message, &body.history)
        .await
    {
        Ok(response) => (
            StatusCode::OK,
            Json(json!({ "response": response, "url": target })),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(url = %target, error = %err, "chat completion failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Chat completion failed. Please try again." })),
            )
                .into_response()
        }
    }
}

/// Every other POST path is a JSON-RPC request against the site named by the
/// path itself.
async fn handle_mcp(
    State(state): State<Arc<AppState>>,
    Path(target): Path<String>,
    body: String,
) -> Response {
    let target = normalize_target(target.trim_matches('/'));
    let dispatcher = McpDispatcher::new(target, state.fetcher.clone());
    let response = dispatcher.handle(&body).await;
    (StatusCode::OK, Json(response)).into_response()
}

/// GET on any non-root path hands off to the front-end, preserving the path
/// as a query parameter.
async fn redirect_to_index(Path(path): Path<String>) -> Response {
    let encoded: String = url_encode(path.trim_matches('/'));
    (
        StatusCode::FOUND,
        [(header::LOCATION.as_str(), format!("/?target={encoded}"))],
    )
        .into_response()
}

fn url_encode(raw: &str) -> String {
    // Percent-encode just enough for a query value; the front-end decodes it.
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Prefix bare domains with https so both `example.com` and full URLs work.
fn normalize_target(raw: &str) -> String {
    if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    }
}

/// First hop of `x-forwarded-for`, or a shared bucket for direct clients.
fn client_id(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
