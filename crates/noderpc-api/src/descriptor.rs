//! Declarative description of one API operation.

use std::sync::Arc;

use serde_json::Value;

use crate::error::ApiError;

/// Rewrites call arguments into RPC params.
pub type InputFormatter = Arc<dyn Fn(Vec<Value>) -> Result<Vec<Value>, ApiError> + Send + Sync>;

/// Rewrites an RPC result before it reaches the caller.
pub type OutputFormatter = Arc<dyn Fn(Value) -> Result<Value, ApiError> + Send + Sync>;

/// Answers the operation locally, without a round trip to the node.
pub type StaticCall = Arc<dyn Fn(Vec<Value>) -> Result<Value, ApiError> + Send + Sync>;

/// One API operation as registered into an [`ApiRegistry`](crate::ApiRegistry).
///
/// `method` defaults to `<namespace>_<name>`. When `call` is set the
/// operation never reaches the requester.
#[derive(Clone)]
pub struct ApiDescriptor {
    pub(crate) name: String,
    pub(crate) method: Option<String>,
    pub(crate) params: Option<usize>,
    pub(crate) input: Option<InputFormatter>,
    pub(crate) output: Option<OutputFormatter>,
    pub(crate) call: Option<StaticCall>,
}

impl ApiDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: None,
            params: None,
            input: None,
            output: None,
            call: None,
        }
    }

    /// Override the RPC method name.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Require exactly `count` arguments.
    pub fn params(mut self, count: usize) -> Self {
        self.params = Some(count);
        self
    }

    pub fn input_formatter<F>(mut self, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Vec<Value>, ApiError> + Send + Sync + 'static,
    {
        self.input = Some(Arc::new(f));
        self
    }

    pub fn output_formatter<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, ApiError> + Send + Sync + 'static,
    {
        self.output = Some(Arc::new(f));
        self
    }

    pub fn call<F>(mut self, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, ApiError> + Send + Sync + 'static,
    {
        self.call = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for ApiDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiDescriptor")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("params", &self.params)
            .field("input", &self.input.is_some())
            .field("output", &self.output.is_some())
            .field("call", &self.call.is_some())
            .finish()
    }
}
