//! The MCP-style JSON-RPC protocol surface of sitebridge.
//!
//! This crate implements:
//! - the JSON-RPC 2.0 request/response envelope, with result and error made
//!   mutually exclusive by construction
//! - the request-scoped method state machine (`initialize`, `tools/list`,
//!   `tools/call`, ...) whose `fetch_page` tool delegates to the content
//!   normalizer

pub mod dispatcher;
pub mod envelope;

pub use dispatcher::{McpDispatcher, PROTOCOL_VERSION};
pub use envelope::{RpcErrorBody, RpcRequest, RpcResponse, METHOD_NOT_FOUND, PARSE_ERROR};
