//! JSON-RPC 2.0 wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC request ID as echoed back by the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(u64),
    Signed(i64),
    String(String),
    Null,
}

impl RpcId {
    /// Returns the numeric id, if the id is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl std::fmt::Display for RpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Signed(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// A single JSON-RPC parameter value.
pub type RpcParam = Value;

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RpcId,
    pub method: String,
    pub params: Vec<RpcParam>,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC 2.0 request.
    pub fn new(id: u64, method: impl Into<String>, params: Vec<RpcParam>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: RpcId::Number(id),
            method: method.into(),
            params,
        }
    }
}

/// One entry of a batch call: a method name and its positional params.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub method: String,
    pub params: Vec<RpcParam>,
}

impl BatchEntry {
    pub fn new(method: impl Into<String>, params: Vec<RpcParam>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// An entry with no params.
    pub fn method(method: impl Into<String>) -> Self {
        Self::new(method, Vec::new())
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// `-32601`: the method does not exist on the node.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(-32601, format!("the method {method} does not exist/is not available"))
    }

    /// `-32602`: the params were rejected.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(-32602, message)
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RpcId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Build a success envelope for `id`.
    pub fn success(id: RpcId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error envelope for `id`.
    pub fn failure(id: RpcId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// The result value, or the embedded error object.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        if let Some(err) = self.error {
            Err(err)
        } else {
            Ok(self.result.unwrap_or(Value::Null))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialization() {
        let req = JsonRpcRequest::new(1, "chain_chainID", vec![]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "chain_chainID", "params": []})
        );
    }

    #[test]
    fn ids_deserialize_by_shape() {
        let ids: Vec<RpcId> = serde_json::from_str(r#"[7, -3, "abc", null]"#).unwrap();
        assert_eq!(
            ids,
            vec![
                RpcId::Number(7),
                RpcId::Signed(-3),
                RpcId::String("abc".into()),
                RpcId::Null
            ]
        );
    }

    #[test]
    fn response_into_result_ok() {
        let resp = JsonRpcResponse::success(RpcId::Number(1), Value::String("0x5".into()));
        assert_eq!(resp.into_result().unwrap(), Value::String("0x5".into()));
    }

    #[test]
    fn response_into_result_error() {
        let resp = JsonRpcResponse::failure(
            RpcId::Number(1),
            JsonRpcError::new(-32000, "block not found"),
        );
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.code, -32000);
    }

    #[test]
    fn error_envelope_omits_result() {
        let resp = JsonRpcResponse::failure(RpcId::Number(2), JsonRpcError::method_not_found("x_y"));
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("result").is_none());
        assert_eq!(json["error"]["code"], -32601);
    }
}
