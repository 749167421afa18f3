//! Content normalization for sitebridge.
//!
//! Fetches a page and turns arbitrary HTML into bounded-size Markdown. The
//! converter is a staged string rewrite, not a full HTML parser: it is
//! deterministic, tolerant of malformed markup, and dependency-light by
//! design. Fetch failures are rendered into the returned text instead of
//! raised, so downstream consumers always receive grounding text.

pub mod fetcher;
pub mod markdown;

pub use fetcher::{
    NormalizedContent, PageFetcher, Rendered, CHAT_GROUNDING_MAX_CHARS, TOOL_RESPONSE_MAX_CHARS,
};
pub use markdown::html_to_markdown;
