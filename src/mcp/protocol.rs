use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message }),
        }
    }
}

/// A tool result carried as a single text content item.
pub fn text_content(text: String) -> Value {
    serde_json::json!({
        "content": [ { "type": "text", "text": text } ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_rpc_request_allows_missing_id_for_notifications() {
        let raw = r#"{"jsonrpc":"2.0","method":"notifications/initialized","params":{}}"#;
        let parsed: JsonRpcRequest = serde_json::from_str(raw).expect("must parse");
        assert!(parsed.id.is_none());
        assert_eq!(parsed.method, "notifications/initialized");
    }

    #[test]
    fn failure_omits_result() {
        let response = JsonRpcResponse::failure(serde_json::json!(3), -32601, "nope".to_string());
        let rendered = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            rendered,
            serde_json::json!({"jsonrpc": "2.0", "id": 3, "error": {"code": -32601, "message": "nope"}})
        );
    }

    #[test]
    fn text_content_wraps_single_item() {
        let value = text_content("{}".to_string());
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][0]["text"], "{}");
    }
}
