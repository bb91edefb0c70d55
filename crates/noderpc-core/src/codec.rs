//! Request building and response validation.
//!
//! A [`JsonRpcCodec`] owns the request-id counter. Ids start at 1 and grow
//! by one per built request; they are never reused for the lifetime of the
//! codec, so every requester gets its own independent sequence.
//!
//! Validation works on the raw [`Value`] returned by the transport rather
//! than on a deserialized struct, so that a missing field and an explicit
//! `null` can be told apart.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::error::ClientError;
use crate::request::{BatchEntry, JsonRpcRequest, JsonRpcResponse, RpcParam};

/// Builds requests with monotonic ids and validates node responses.
#[derive(Debug)]
pub struct JsonRpcCodec {
    next_id: AtomicU64,
}

impl Default for JsonRpcCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRpcCodec {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// The id the next built request will carry.
    pub fn peek_id(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }

    /// Build a single request, consuming the next id.
    pub fn build_request(
        &self,
        method: &str,
        params: Vec<RpcParam>,
    ) -> Result<JsonRpcRequest, ClientError> {
        if method.is_empty() {
            return Err(ClientError::InvalidMethod);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(JsonRpcRequest::new(id, method, params))
    }

    /// Build one request per entry, preserving order.
    pub fn build_batch(&self, entries: Vec<BatchEntry>) -> Result<Vec<JsonRpcRequest>, ClientError> {
        entries
            .into_iter()
            .map(|entry| self.build_request(&entry.method, entry.params))
            .collect()
    }
}

/// Returns `true` if `resp` is a successful JSON-RPC 2.0 response object.
///
/// Requires `jsonrpc == "2.0"`, an `id` that is a string or integer, no
/// `error` member, and a non-null `result`.
pub fn validate_response(resp: &Value) -> bool {
    let Some(obj) = resp.as_object() else {
        return false;
    };
    let version_ok = obj.get("jsonrpc").and_then(Value::as_str) == Some("2.0");
    let id_ok = match obj.get("id") {
        Some(Value::String(_)) => true,
        Some(Value::Number(n)) => n.is_u64() || n.is_i64(),
        _ => false,
    };
    let result_ok = matches!(obj.get("result"), Some(v) if !v.is_null());

    version_ok && id_ok && !obj.contains_key("error") && result_ok
}

/// Returns `true` if `resp` is an array whose every element is valid.
pub fn validate_batch(resp: &Value) -> bool {
    match resp.as_array() {
        Some(items) => items.iter().all(validate_response),
        None => false,
    }
}

/// Validate and decode a single response.
pub fn decode_response(resp: Value) -> Result<JsonRpcResponse, ClientError> {
    if !validate_response(&resp) {
        return Err(invalid_response(&resp));
    }
    serde_json::from_value(resp).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// Validate and decode a batch response of `expected` elements.
///
/// Elements are kept in the order the transport delivered them; they are
/// not re-sorted by id.
pub fn decode_batch(resp: Value, expected: usize) -> Result<Vec<JsonRpcResponse>, ClientError> {
    let Value::Array(items) = resp else {
        return Err(invalid_response(&resp));
    };
    if items.len() != expected {
        return Err(ClientError::InvalidResponse(format!(
            "batch returned {} responses for {} requests",
            items.len(),
            expected
        )));
    }
    if let Some(bad) = items.iter().find(|item| !validate_response(item)) {
        return Err(invalid_response(bad));
    }
    items.into_iter().map(decode_response).collect()
}

/// `InvalidResponse` carrying the node's error message when there is one,
/// otherwise the serialized payload.
pub fn invalid_response(resp: &Value) -> ClientError {
    let embedded = resp
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str);
    match embedded {
        Some(message) => ClientError::InvalidResponse(message.to_string()),
        None => ClientError::InvalidResponse(resp.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_are_strictly_increasing() {
        let codec = JsonRpcCodec::new();
        let ids: Vec<_> = (0..100)
            .map(|i| {
                let method = if i % 2 == 0 { "chain_chainID" } else { "net_peers" };
                codec.build_request(method, vec![json!(i)]).unwrap().id
            })
            .collect();
        assert_eq!(ids.first(), Some(&crate::request::RpcId::Number(1)));
        for pair in ids.windows(2) {
            assert!(pair[0].as_u64().unwrap() < pair[1].as_u64().unwrap());
        }
    }

    #[test]
    fn codecs_have_independent_counters() {
        let a = JsonRpcCodec::new();
        let b = JsonRpcCodec::new();
        a.build_request("chain_chainID", vec![]).unwrap();
        a.build_request("chain_chainID", vec![]).unwrap();
        let req = b.build_request("chain_chainID", vec![]).unwrap();
        assert_eq!(req.id.as_u64(), Some(1));
        assert_eq!(a.peek_id(), 3);
    }

    #[test]
    fn empty_method_is_rejected_without_consuming_an_id() {
        let codec = JsonRpcCodec::new();
        let err = codec.build_request("", vec![]).unwrap_err();
        assert!(matches!(err, ClientError::InvalidMethod));
        assert_eq!(codec.peek_id(), 1);
    }

    #[test]
    fn batch_preserves_order() {
        let codec = JsonRpcCodec::new();
        let reqs = codec
            .build_batch(vec![
                BatchEntry::method("chain_chainID"),
                BatchEntry::new("chain_getBlockByHeight", vec![json!(10)]),
            ])
            .unwrap();
        assert_eq!(reqs[0].method, "chain_chainID");
        assert_eq!(reqs[1].method, "chain_getBlockByHeight");
        assert_eq!(reqs[1].params, vec![json!(10)]);
        assert_eq!(reqs[0].id.as_u64(), Some(1));
        assert_eq!(reqs[1].id.as_u64(), Some(2));
    }

    #[test]
    fn batch_with_empty_method_fails() {
        let codec = JsonRpcCodec::new();
        let err = codec
            .build_batch(vec![BatchEntry::method("chain_chainID"), BatchEntry::method("")])
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidMethod));
    }

    #[test]
    fn valid_response_shapes() {
        assert!(validate_response(&json!({"jsonrpc": "2.0", "id": 1, "result": "0x5"})));
        assert!(validate_response(&json!({"jsonrpc": "2.0", "id": "a", "result": 0})));
        assert!(validate_response(&json!({"jsonrpc": "2.0", "id": -4, "result": []})));
    }

    #[test]
    fn invalid_response_shapes() {
        // wrong or missing version
        assert!(!validate_response(&json!({"jsonrpc": "1.0", "id": 1, "result": 1})));
        assert!(!validate_response(&json!({"id": 1, "result": 1})));
        // missing or non-scalar id
        assert!(!validate_response(&json!({"jsonrpc": "2.0", "result": 1})));
        assert!(!validate_response(&json!({"jsonrpc": "2.0", "id": null, "result": 1})));
        assert!(!validate_response(&json!({"jsonrpc": "2.0", "id": 1.5, "result": 1})));
        assert!(!validate_response(&json!({"jsonrpc": "2.0", "id": [1], "result": 1})));
        // error member
        assert!(!validate_response(
            &json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -1, "message": "x"}})
        ));
        assert!(!validate_response(
            &json!({"jsonrpc": "2.0", "id": 1, "result": 1, "error": {"code": -1, "message": "x"}})
        ));
        // result absent or null
        assert!(!validate_response(&json!({"jsonrpc": "2.0", "id": 1})));
        assert!(!validate_response(&json!({"jsonrpc": "2.0", "id": 1, "result": null})));
        // not an object
        assert!(!validate_response(&json!("0x5")));
    }

    #[test]
    fn batch_validation() {
        let ok = json!({"jsonrpc": "2.0", "id": 1, "result": 1});
        let bad = json!({"jsonrpc": "2.0", "id": 2});
        assert!(validate_batch(&json!([ok.clone(), ok.clone()])));
        assert!(validate_batch(&json!([])));
        assert!(!validate_batch(&json!([ok.clone(), bad])));
        assert!(!validate_batch(&ok));
    }

    #[test]
    fn invalid_response_prefers_rpc_message() {
        let err = decode_response(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "unknown block"}
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON RPC response: unknown block");
    }

    #[test]
    fn invalid_response_falls_back_to_dump() {
        let err = decode_response(json!({"jsonrpc": "2.0", "id": 1})).unwrap_err();
        match err {
            ClientError::InvalidResponse(msg) => {
                assert!(msg.contains(r#""id":1"#), "{msg}");
                assert!(msg.contains(r#""jsonrpc":"2.0""#), "{msg}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn decode_batch_rejects_length_mismatch() {
        let resp = json!([{"jsonrpc": "2.0", "id": 1, "result": 1}]);
        let err = decode_batch(resp, 2).unwrap_err();
        assert!(err.is_invalid_response());
    }
}
