//! MCP method state machine.
//!
//! Request-scoped and stateless: every call parses one envelope, dispatches
//! on `method`, and produces exactly one response. Tool failures never become
//! RPC errors; `fetch_page` wraps whatever text the normalizer rendered
//! (page or inline error) in a successful result, so the calling AI tool
//! always receives a well-formed response.

use serde_json::{json, Value};
use url::Url;

use sitebridge_content::{PageFetcher, TOOL_RESPONSE_MAX_CHARS};

use crate::envelope::{RpcRequest, RpcResponse, METHOD_NOT_FOUND};

/// Protocol revision advertised to clients.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct McpDispatcher {
    target: String,
    fetcher: PageFetcher,
}

impl McpDispatcher {
    /// `target` is the site this dispatcher serves tools for, with scheme.
    pub fn new(target: impl Into<String>, fetcher: PageFetcher) -> Self {
        Self {
            target: target.into(),
            fetcher,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Parse one JSON-RPC body and produce its response envelope.
    pub async fn handle(&self, body: &str) -> RpcResponse {
        let request: RpcRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(_) => return RpcResponse::parse_error(),
        };
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: RpcRequest) -> RpcResponse {
        let id = request.id;
        match request.method.as_str() {
            "initialize" => RpcResponse::result(id, self.initialize_result()),
            "notifications/initialized" => RpcResponse::result(id, json!({})),
            "tools/list" => RpcResponse::result(id, tools_descriptor()),
            "tools/call" => self.call_tool(id, &request.params).await,
            other => RpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        }
    }

    fn initialize_result(&self) -> Value {
        let host = Url::parse(&self.target)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| self.target.clone());
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": format!("{host} MCP"),
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    async fn call_tool(&self, id: Value, params: &Value) -> RpcResponse {
        let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        match name {
            "fetch_page" => {
                let path = arguments
                    .get("path")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let url = self.resolve(path);
                let content = self.fetcher.fetch_markdown(&url, TOOL_RESPONSE_MAX_CHARS).await;
                RpcResponse::result(id, text_content(&content.text))
            }
            "search" => {
                let query = arguments
                    .get("query")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                RpcResponse::result(id, text_content(&self.search_suggestion(query)))
            }
            other => RpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown tool: {other}")),
        }
    }

    fn resolve(&self, path: &str) -> String {
        let base = self.target.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    /// There is no search backend; suggest the conventional search URL and a
    /// `fetch_page` fallback instead.
    fn search_suggestion(&self, query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let base = self.target.trim_end_matches('/');
        format!(
            "This site has no wired search backend. Try fetch_page with the path \
             /search?q={encoded} (many sites expose search there), or fetch_page \
             on a likely section of {base} and scan the returned Markdown."
        )
    }
}

/// Wrap tool output text in a single text-content item.
fn text_content(text: &str) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }]
    })
}

fn tools_descriptor() -> Value {
    json!({
        "tools": [
            {
                "name": "fetch_page",
                "description": "Fetch a page from the target site and return it as Markdown",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Path to fetch, e.g. /docs. Defaults to the site root."
                        }
                    }
                }
            },
            {
                "name": "search",
                "description": "Suggest how to search the target site for a query",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "query": { "type": "string" }
                    },
                    "required": ["query"]
                }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;

    fn network_tests_enabled() -> bool {
        matches!(std::env::var("SITEBRIDGE_RUN_NETWORK_TESTS"), Ok(value) if value == "1")
    }

    fn dispatcher() -> McpDispatcher {
        McpDispatcher::new("https://example.com", PageFetcher::new())
    }

    #[tokio::test]
    async fn initialize_reports_host_version_and_tools_capability() {
        let response = dispatcher()
            .handle(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#)
            .await;

        let result = response.result_value().unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "example.com MCP");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn initialized_notification_gets_an_empty_result() {
        let response = dispatcher()
            .handle(r#"{"jsonrpc":"2.0","id":2,"method":"notifications/initialized"}"#)
            .await;

        assert_eq!(response.result_value(), Some(&json!({})));
        assert!(response.error_body().is_none());
    }

    #[tokio::test]
    async fn tools_list_returns_exactly_fetch_page_and_search() {
        let response = dispatcher()
            .handle(r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#)
            .await;

        let tools = response.result_value().unwrap()["tools"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "fetch_page");
        assert_eq!(tools[1]["name"], "search");
        assert_eq!(tools[1]["inputSchema"]["required"][0], "query");
    }

    #[tokio::test]
    async fn unknown_method_maps_to_method_not_found() {
        let response = dispatcher()
            .handle(r#"{"jsonrpc":"2.0","id":4,"method":"resources/list"}"#)
            .await;

        let error = response.error_body().unwrap();
        assert_eq!(error.code, METHOD_NOT_FOUND);
        assert_eq!(error.message, "Method not found: resources/list");
    }

    #[tokio::test]
    async fn unknown_tool_maps_to_method_not_found() {
        let response = dispatcher()
            .handle(
                r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"crawl","arguments":{}}}"#,
            )
            .await;

        let error = response.error_body().unwrap();
        assert_eq!(error.code, METHOD_NOT_FOUND);
        assert_eq!(error.message, "Unknown tool: crawl");
    }

    #[tokio::test]
    async fn malformed_body_yields_parse_error_with_null_id() {
        let response = dispatcher().handle("{not json").await;

        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(encoded["jsonrpc"], "2.0");
        assert_eq!(encoded["id"], Value::Null);
        assert_eq!(encoded["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn search_suggests_the_conventional_search_url() {
        let response = dispatcher()
            .handle(
                r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"search","arguments":{"query":"rate limits"}}}"#,
            )
            .await;

        let text = response.result_value().unwrap()["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(text.contains("/search?q=rate+limits"));
        assert!(text.contains("fetch_page"));
    }

    #[test]
    fn resolve_prefixes_a_missing_leading_slash() {
        let dispatcher = dispatcher();
        assert_eq!(dispatcher.resolve(""), "https://example.com");
        assert_eq!(dispatcher.resolve("/docs"), "https://example.com/docs");
        assert_eq!(dispatcher.resolve("docs"), "https://example.com/docs");
    }

    #[tokio::test]
    async fn fetch_page_wraps_fetch_failure_as_a_successful_result() {
        if !network_tests_enabled() {
            eprintln!("skipping network test: set SITEBRIDGE_RUN_NETWORK_TESTS=1 to enable");
            return;
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404);
            })
            .await;

        let dispatcher = McpDispatcher::new(server.base_url(), PageFetcher::new());
        let response = dispatcher
            .handle(
                r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"fetch_page","arguments":{"path":"/missing"}}}"#,
            )
            .await;

        assert!(response.error_body().is_none(), "must be an RPC success");
        let text = response.result_value().unwrap()["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(text.contains("Error: Failed to fetch"));
        assert!(text.contains("404"));
    }

    #[tokio::test]
    async fn fetch_page_returns_markdown_for_a_served_page() {
        if !network_tests_enabled() {
            eprintln!("skipping network test: set SITEBRIDGE_RUN_NETWORK_TESTS=1 to enable");
            return;
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/docs");
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<h1>Docs</h1><p>Start <a href=\"/install\">here</a>.</p>");
            })
            .await;

        let dispatcher = McpDispatcher::new(server.base_url(), PageFetcher::new());
        let response = dispatcher
            .handle(
                r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"fetch_page","arguments":{"path":"docs"}}}"#,
            )
            .await;

        let text = response.result_value().unwrap()["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(text.starts_with("# Docs"));
        assert!(text.contains("[here](/install)"));
    }
}
