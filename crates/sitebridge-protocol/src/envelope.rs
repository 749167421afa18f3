//! JSON-RPC 2.0 envelope types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Malformed request body; the only case where the response id is forced to
/// null, since the body may not contain a usable id.
pub const PARSE_ERROR: i32 = -32700;
/// Unknown method or tool.
pub const METHOD_NOT_FOUND: i32 = -32601;

/// Inbound request envelope. Deserialization is lenient: a missing id becomes
/// null and params default to null, so notifications parse too.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub code: i32,
    pub message: String,
}

/// Outbound response envelope. Constructed only through [`RpcResponse::result`]
/// and [`RpcResponse::error`], so exactly one of result/error is ever set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcErrorBody>,
}

impl RpcResponse {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(RpcErrorBody {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn parse_error() -> Self {
        Self::error(Value::Null, PARSE_ERROR, "Parse error")
    }

    pub fn id(&self) -> &Value {
        &self.id
    }

    pub fn result_value(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error_body(&self) -> Option<&RpcErrorBody> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_parses_with_missing_id_and_params() {
        let request: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert_eq!(request.method, "notifications/initialized");
        assert_eq!(request.id, Value::Null);
        assert_eq!(request.params, Value::Null);
    }

    #[test]
    fn request_keeps_string_and_integer_ids() {
        let by_int: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#).unwrap();
        assert_eq!(by_int.id, json!(7));

        let by_string: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":"abc","method":"tools/list"}"#).unwrap();
        assert_eq!(by_string.id, json!("abc"));
    }

    #[test]
    fn result_response_serializes_without_an_error_key() {
        let encoded =
            serde_json::to_value(RpcResponse::result(json!(1), json!({"ok": true}))).unwrap();
        assert_eq!(encoded["jsonrpc"], "2.0");
        assert_eq!(encoded["id"], 1);
        assert_eq!(encoded["result"]["ok"], true);
        assert!(encoded.get("error").is_none());
    }

    #[test]
    fn error_response_serializes_without_a_result_key() {
        let encoded = serde_json::to_value(RpcResponse::error(
            json!("req-9"),
            METHOD_NOT_FOUND,
            "Method not found: nope",
        ))
        .unwrap();
        assert_eq!(encoded["id"], "req-9");
        assert_eq!(encoded["error"]["code"], -32601);
        assert_eq!(encoded["error"]["message"], "Method not found: nope");
        assert!(encoded.get("result").is_none());
    }

    #[test]
    fn parse_error_forces_a_null_id() {
        let encoded = serde_json::to_value(RpcResponse::parse_error()).unwrap();
        assert_eq!(encoded["id"], Value::Null);
        assert_eq!(encoded["error"]["code"], -32700);
    }
}
