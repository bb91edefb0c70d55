//! Registry of API operations and the [`Api`] facade that invokes them.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future;
use serde::de::DeserializeOwned;
use serde_json::Value;

use noderpc_core::{ClientError, Requester, WatchHandle};

use crate::descriptor::{ApiDescriptor, InputFormatter, OutputFormatter, StaticCall};
use crate::error::ApiError;
use crate::formatters;
use crate::namespace::Namespace;

/// A registered, callable API operation.
#[derive(Clone)]
pub struct ApiMethod {
    namespace: Namespace,
    name: String,
    rpc_method: String,
    params: Option<usize>,
    input: Option<InputFormatter>,
    output: Option<OutputFormatter>,
    call: Option<StaticCall>,
}

impl std::fmt::Debug for ApiMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMethod")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("rpc_method", &self.rpc_method)
            .field("params", &self.params)
            .finish()
    }
}

impl ApiMethod {
    fn from_descriptor(namespace: Namespace, descriptor: ApiDescriptor) -> Self {
        let rpc_method = descriptor
            .method
            .unwrap_or_else(|| namespace.rpc_method(&descriptor.name));
        Self {
            namespace,
            name: descriptor.name,
            rpc_method,
            params: descriptor.params,
            input: descriptor.input,
            output: descriptor.output,
            call: descriptor.call,
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The RPC method string sent to the node.
    pub fn rpc_method(&self) -> &str {
        &self.rpc_method
    }

    /// Required argument count, if the operation declares one.
    pub fn arity(&self) -> Option<usize> {
        self.params
    }

    pub fn is_static(&self) -> bool {
        self.call.is_some()
    }

    fn check_arity(&self, args: &[Value]) -> Result<(), ApiError> {
        match self.params {
            Some(expected) if expected != args.len() => Err(ClientError::InvalidParamCount {
                method: self.rpc_method.clone(),
                expected,
                got: args.len(),
            }
            .into()),
            _ => Ok(()),
        }
    }

    fn prepare(&self, args: Vec<Value>) -> Result<Vec<Value>, ApiError> {
        self.check_arity(&args)?;
        match &self.input {
            Some(input) => input(args),
            None => Ok(args),
        }
    }

    /// Run the operation: the static call if there is one, otherwise a
    /// request through `requester` with formatters applied on both sides.
    pub async fn invoke(&self, requester: &Requester, args: Vec<Value>) -> Result<Value, ApiError> {
        if let Some(call) = &self.call {
            self.check_arity(&args)?;
            return call(args);
        }
        let params = self.prepare(args)?;
        let result = requester.send(&self.rpc_method, params).await?;
        format_output(self.output.as_ref(), result)
    }

    /// [`invoke`](Self::invoke), then deserialize the formatted result.
    pub async fn invoke_as<T: DeserializeOwned>(
        &self,
        requester: &Requester,
        args: Vec<Value>,
    ) -> Result<T, ApiError> {
        let value = self.invoke(requester, args).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e).into())
    }

    /// Watch the operation; every delivered value passes through the output
    /// formatter first.
    pub fn watch<F>(
        &self,
        requester: &Requester,
        args: Vec<Value>,
        mut callback: F,
    ) -> Result<WatchHandle, ApiError>
    where
        F: FnMut(Result<Value, ApiError>) + Send + 'static,
    {
        if self.is_static() {
            return Err(ApiError::NotWatchable {
                namespace: self.namespace,
                name: self.name.clone(),
            });
        }
        let params = self.prepare(args)?;
        let output = self.output.clone();
        let handle = requester.watch(&self.rpc_method, params, move |update| {
            callback(
                update
                    .map_err(ApiError::from)
                    .and_then(|value| format_output(output.as_ref(), value)),
            )
        })?;
        Ok(handle)
    }
}

fn format_output(output: Option<&OutputFormatter>, value: Value) -> Result<Value, ApiError> {
    match output {
        Some(f) => f(value),
        None => Ok(value),
    }
}

/// Typed mapping from `(namespace, name)` to a callable operation.
#[derive(Debug, Clone, Default)]
pub struct ApiRegistry {
    methods: BTreeMap<(Namespace, String), ApiMethod>,
}

impl ApiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in `chain` operations.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let defaults = [
            ApiDescriptor::new("chainID").params(0),
            ApiDescriptor::new("latestStableHeight")
                .params(0)
                .output_formatter(formatters::to_number),
        ];
        for descriptor in defaults {
            // built-in names are non-empty
            let _ = registry.register(Namespace::Chain, descriptor);
        }
        registry
    }

    /// Register `descriptor` under `namespace`, replacing any operation
    /// with the same name.
    pub fn register(
        &mut self,
        namespace: Namespace,
        descriptor: ApiDescriptor,
    ) -> Result<&ApiMethod, ApiError> {
        if descriptor.name.is_empty() {
            return Err(ApiError::EmptyName { namespace });
        }
        let method = ApiMethod::from_descriptor(namespace, descriptor);
        let key = (namespace, method.name.clone());
        tracing::debug!(%namespace, name = %method.name, rpc_method = %method.rpc_method, "registered API operation");
        self.methods.insert(key.clone(), method);
        Ok(&self.methods[&key])
    }

    /// Register several descriptors under one namespace.
    pub fn register_all(
        &mut self,
        namespace: Namespace,
        descriptors: impl IntoIterator<Item = ApiDescriptor>,
    ) -> Result<(), ApiError> {
        for descriptor in descriptors {
            self.register(namespace, descriptor)?;
        }
        Ok(())
    }

    pub fn get(&self, namespace: Namespace, name: &str) -> Option<&ApiMethod> {
        self.methods.get(&(namespace, name.to_string()))
    }

    /// Like [`get`](Self::get), failing with `UnknownOperation`.
    pub fn lookup(&self, namespace: Namespace, name: &str) -> Result<&ApiMethod, ApiError> {
        self.get(namespace, name).ok_or_else(|| ApiError::UnknownOperation {
            namespace,
            name: name.to_string(),
        })
    }

    /// Operations of one namespace, sorted by name.
    pub fn methods(&self, namespace: Namespace) -> impl Iterator<Item = &ApiMethod> {
        self.methods
            .iter()
            .filter(move |((ns, _), _)| *ns == namespace)
            .map(|(_, method)| method)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// A requester paired with a registry.
#[derive(Clone)]
pub struct Api {
    requester: Requester,
    registry: Arc<ApiRegistry>,
}

impl Api {
    pub fn new(requester: Requester, registry: ApiRegistry) -> Self {
        Self {
            requester,
            registry: Arc::new(registry),
        }
    }

    pub fn requester(&self) -> &Requester {
        &self.requester
    }

    pub fn registry(&self) -> &ApiRegistry {
        &self.registry
    }

    pub async fn call(&self, namespace: Namespace, name: &str, args: Vec<Value>) -> Result<Value, ApiError> {
        self.registry
            .lookup(namespace, name)?
            .invoke(&self.requester, args)
            .await
    }

    pub async fn call_as<T: DeserializeOwned>(
        &self,
        namespace: Namespace,
        name: &str,
        args: Vec<Value>,
    ) -> Result<T, ApiError> {
        self.registry
            .lookup(namespace, name)?
            .invoke_as(&self.requester, args)
            .await
    }

    /// Run several operations concurrently; fails on the first error.
    pub async fn call_many(
        &self,
        calls: Vec<(Namespace, &str, Vec<Value>)>,
    ) -> Result<Vec<Value>, ApiError> {
        let mut pending = Vec::with_capacity(calls.len());
        for (namespace, name, args) in calls {
            let method = self.registry.lookup(namespace, name)?;
            pending.push(method.invoke(&self.requester, args));
        }
        future::try_join_all(pending).await
    }

    pub fn watch<F>(
        &self,
        namespace: Namespace,
        name: &str,
        args: Vec<Value>,
        callback: F,
    ) -> Result<WatchHandle, ApiError>
    where
        F: FnMut(Result<Value, ApiError>) + Send + 'static,
    {
        self.registry
            .lookup(namespace, name)?
            .watch(&self.requester, args, callback)
    }

    pub fn stop_watch(&self, handle: WatchHandle) {
        self.requester.stop_watch(handle);
    }
}
