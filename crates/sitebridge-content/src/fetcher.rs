//! Page fetching with failures rendered as text.

use std::time::Duration;

use crate::markdown;

/// Cap applied when the content grounds a chat prompt.
pub const CHAT_GROUNDING_MAX_CHARS: usize = 10_000;
/// Cap applied when the content goes straight into a tool response.
pub const TOOL_RESPONSE_MAX_CHARS: usize = 50_000;

const USER_AGENT: &str = concat!(
    "sitebridge/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/sitebridge/sitebridge)"
);
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounded, normalized page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedContent {
    pub text: String,
    pub truncated: bool,
}

/// Outcome of one fetch. Failures are rendered into text rather than raised:
/// downstream consumers (the model, the RPC caller) must always receive
/// grounding text, and must not rely on error propagation to detect failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Page(String),
    FetchError(String),
}

impl Rendered {
    pub fn into_text(self) -> String {
        match self {
            Rendered::Page(text) | Rendered::FetchError(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Rendered::FetchError(_))
    }
}

/// HTTP fetcher with a fixed, identifying user agent.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("reqwest client should build"),
        }
    }

    /// Fetch `url` and return bounded Markdown. Never fails; transport and
    /// HTTP errors come back as `Error: ...` text.
    pub async fn fetch_markdown(&self, url: &str, max_chars: usize) -> NormalizedContent {
        truncate_chars(self.fetch_rendered(url).await.into_text(), max_chars)
    }

    /// Fetch `url` and convert the body, keeping the page/error distinction.
    pub async fn fetch_rendered(&self, url: &str) -> Rendered {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(url, error = %err, "page fetch failed in transport");
                return Rendered::FetchError(format!("Error: Failed to fetch {url}: {err}"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Rendered::FetchError(format!(
                "Error: Failed to fetch {url} (HTTP {})",
                status.as_u16()
            ));
        }

        match response.text().await {
            Ok(body) => Rendered::Page(markdown::html_to_markdown(&body)),
            Err(err) => Rendered::FetchError(format!("Error: Failed to fetch {url}: {err}")),
        }
    }
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Cap `text` at `max_chars` characters, cutting on a char boundary.
pub fn truncate_chars(text: String, max_chars: usize) -> NormalizedContent {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => NormalizedContent {
            text: text[..idx].to_string(),
            truncated: true,
        },
        None => NormalizedContent {
            text,
            truncated: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;

    fn network_tests_enabled() -> bool {
        matches!(std::env::var("SITEBRIDGE_RUN_NETWORK_TESTS"), Ok(value) if value == "1")
    }

    #[test]
    fn truncate_leaves_short_text_untouched() {
        let content = truncate_chars("hello".to_string(), 10);
        assert_eq!(content.text, "hello");
        assert!(!content.truncated);
    }

    #[test]
    fn truncate_cuts_at_the_cap_and_flags_it() {
        let content = truncate_chars("hello world".to_string(), 5);
        assert_eq!(content.text, "hello");
        assert!(content.truncated);
    }

    #[test]
    fn truncate_respects_multibyte_boundaries() {
        let content = truncate_chars("héllo wörld".to_string(), 7);
        assert_eq!(content.text, "héllo w");
        assert!(content.truncated);
    }

    #[test]
    fn exact_length_text_is_not_flagged_truncated() {
        let content = truncate_chars("12345".to_string(), 5);
        assert_eq!(content.text, "12345");
        assert!(!content.truncated);
    }

    #[tokio::test]
    async fn successful_fetch_converts_body_to_markdown() {
        if !network_tests_enabled() {
            eprintln!("skipping network test: set SITEBRIDGE_RUN_NETWORK_TESTS=1 to enable");
            return;
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<h1>Welcome</h1><p>Hello</p>");
            })
            .await;

        let fetcher = PageFetcher::new();
        let rendered = fetcher.fetch_rendered(&server.base_url()).await;

        assert!(!rendered.is_error());
        let text = rendered.into_text();
        assert!(text.starts_with("# Welcome"));
        assert!(text.contains("Hello"));
    }

    #[tokio::test]
    async fn http_error_status_is_rendered_not_raised() {
        if !network_tests_enabled() {
            eprintln!("skipping network test: set SITEBRIDGE_RUN_NETWORK_TESTS=1 to enable");
            return;
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404).body("not here");
            })
            .await;

        let fetcher = PageFetcher::new();
        let url = format!("{}/missing", server.base_url());
        let rendered = fetcher.fetch_rendered(&url).await;

        assert!(rendered.is_error());
        let text = rendered.into_text();
        assert!(text.contains("Error: Failed to fetch"));
        assert!(text.contains("404"));
    }

    #[tokio::test]
    async fn fetch_markdown_applies_the_caller_cap() {
        if !network_tests_enabled() {
            eprintln!("skipping network test: set SITEBRIDGE_RUN_NETWORK_TESTS=1 to enable");
            return;
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).body(format!("<p>{}</p>", "x".repeat(200)));
            })
            .await;

        let fetcher = PageFetcher::new();
        let content = fetcher.fetch_markdown(&server.base_url(), 50).await;

        assert_eq!(content.text.chars().count(), 50);
        assert!(content.truncated);
    }
}
