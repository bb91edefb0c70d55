//! In-process transport that answers requests from registered handlers.
//!
//! Useful for tests, demos and embedding a node-like service in the same
//! process. Every reply is a well-formed JSON-RPC 2.0 envelope echoing the
//! request id; unknown methods get a `-32601` error object.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::transport::RpcTransport;

/// Handler for one method: positional params in, result or RPC error out.
pub type MethodHandler =
    Arc<dyn Fn(Vec<Value>) -> Result<Value, JsonRpcError> + Send + Sync + 'static>;

/// Transport backed by in-process method handlers.
#[derive(Clone)]
pub struct LocalTransport {
    name: String,
    handlers: HashMap<String, MethodHandler>,
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalTransport {
    pub fn new() -> Self {
        Self {
            name: "local".into(),
            handlers: HashMap::new(),
        }
    }

    /// Override the identifier reported by [`RpcTransport::url`].
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Register (or replace) the handler for `method`.
    pub fn with_method<F>(mut self, method: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, JsonRpcError> + Send + Sync + 'static,
    {
        self.handlers.insert(method.into(), Arc::new(handler));
        self
    }

    /// Register a method that always returns `value`.
    pub fn with_constant(self, method: impl Into<String>, value: Value) -> Self {
        self.with_method(method, move |_| Ok(value.clone()))
    }

    /// Names of all registered methods, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn dispatch(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        match self.handlers.get(&req.method) {
            Some(handler) => match handler(req.params) {
                Ok(result) => JsonRpcResponse::success(req.id, result),
                Err(err) => JsonRpcResponse::failure(req.id, err),
            },
            None => JsonRpcResponse::failure(req.id, JsonRpcError::method_not_found(&req.method)),
        }
    }
}

#[async_trait]
impl RpcTransport for LocalTransport {
    async fn send(&self, req: JsonRpcRequest) -> Result<Value, TransportError> {
        let resp = self.dispatch(req);
        Ok(serde_json::to_value(resp)?)
    }

    async fn send_batch(&self, reqs: Vec<JsonRpcRequest>) -> Result<Value, TransportError> {
        let responses: Vec<JsonRpcResponse> = reqs.into_iter().map(|r| self.dispatch(r)).collect();
        Ok(serde_json::to_value(responses)?)
    }

    fn url(&self) -> &str {
        &self.name
    }
}
