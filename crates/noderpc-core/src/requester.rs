//! The requester: single calls, batch calls and watches over one transport.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::codec::{self, JsonRpcCodec};
use crate::config::WatchConfig;
use crate::error::ClientError;
use crate::request::{BatchEntry, JsonRpcResponse, RpcParam};
use crate::transport::RpcTransport;
use crate::watch::{WatchEngine, WatchHandle};

/// Transport plus codec; the part of a requester that poll tasks share.
pub(crate) struct RpcCaller {
    transport: Arc<dyn RpcTransport>,
    codec: JsonRpcCodec,
}

impl RpcCaller {
    pub(crate) async fn send(&self, method: &str, params: Vec<RpcParam>) -> Result<Value, ClientError> {
        let req = self.codec.build_request(method, params)?;
        tracing::debug!(method, id = %req.id, url = self.transport.url(), "sending request");

        let raw = self.transport.send(req).await?;
        codec::decode_response(raw)?
            .into_result()
            .map_err(|err| ClientError::InvalidResponse(err.message))
    }

    async fn send_batch(&self, entries: Vec<BatchEntry>) -> Result<Vec<JsonRpcResponse>, ClientError> {
        if entries.is_empty() {
            return Ok(vec![]);
        }
        let reqs = self.codec.build_batch(entries)?;
        let expected = reqs.len();
        tracing::debug!(size = expected, url = self.transport.url(), "sending batch");

        let raw = self.transport.send_batch(reqs).await?;
        codec::decode_batch(raw, expected)
    }
}

/// JSON-RPC client bound to a single transport.
///
/// Cheap to clone; clones share the transport, the request-id sequence and
/// the watch registry. When the last clone is dropped every watch is
/// cancelled.
#[derive(Clone)]
pub struct Requester {
    caller: Arc<RpcCaller>,
    watches: Arc<WatchEngine>,
}

impl std::fmt::Debug for Requester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Requester")
            .field("url", &self.caller.transport.url())
            .field("watches", &self.watches.len())
            .finish()
    }
}

impl Requester {
    /// Create a requester with the default watch configuration.
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self::with_config(transport, WatchConfig::default())
    }

    pub fn with_config(transport: Arc<dyn RpcTransport>, config: WatchConfig) -> Self {
        Self {
            caller: Arc::new(RpcCaller {
                transport,
                codec: JsonRpcCodec::new(),
            }),
            watches: Arc::new(WatchEngine::new(config)),
        }
    }

    pub fn builder() -> RequesterBuilder {
        RequesterBuilder::default()
    }

    /// Identifier of the underlying transport.
    pub fn url(&self) -> &str {
        self.caller.transport.url()
    }

    /// Call `method` and return its raw result.
    pub async fn send(&self, method: &str, params: Vec<RpcParam>) -> Result<Value, ClientError> {
        self.caller.send(method, params).await
    }

    /// Call `method` and deserialize the result.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<RpcParam>,
    ) -> Result<T, ClientError> {
        let result = self.send(method, params).await?;
        serde_json::from_value(result).map_err(ClientError::Decode)
    }

    /// Send every entry as one batch and return the validated responses.
    ///
    /// Responses come back in the order the transport delivered them and
    /// are not matched up by id. A single invalid element fails the whole
    /// call.
    pub async fn send_batch(&self, entries: Vec<BatchEntry>) -> Result<Vec<JsonRpcResponse>, ClientError> {
        self.caller.send_batch(entries).await
    }

    /// Poll `method` on the configured interval and invoke `callback` with
    /// each changed result, or once with the error that ended the watch.
    ///
    /// A `null` result is an invalid response and counts as a failed poll,
    /// so watching a method that keeps answering `null` (a lookup that finds
    /// nothing, say) ends with `InvalidResponse` after `max_retry + 1` polls.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn watch<F>(&self, method: &str, params: Vec<RpcParam>, callback: F) -> Result<WatchHandle, ClientError>
    where
        F: FnMut(Result<Value, ClientError>) + Send + 'static,
    {
        if method.is_empty() {
            return Err(ClientError::InvalidMethod);
        }
        self.watches
            .spawn(Arc::clone(&self.caller), method.to_string(), params, Box::new(callback))
    }

    /// Like [`watch`](Self::watch), delivering updates through a channel.
    ///
    /// The channel yields the terminal error last, then closes. Dropping the
    /// receiver does not stop the watch; call [`stop_watch`](Self::stop_watch).
    pub fn watch_channel(
        &self,
        method: &str,
        params: Vec<RpcParam>,
    ) -> Result<(WatchHandle, mpsc::UnboundedReceiver<Result<Value, ClientError>>), ClientError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.watch(method, params, move |update| {
            let _ = tx.send(update);
        })?;
        Ok((handle, rx))
    }

    /// Cancel a watch. Calling it again, or with an unknown handle, is a no-op.
    pub fn stop_watch(&self, handle: WatchHandle) {
        self.watches.stop(handle);
    }

    /// Cancel every watch.
    pub fn reset(&self) {
        self.watches.reset();
    }

    pub fn is_watching(&self, handle: WatchHandle) -> bool {
        self.watches.contains(handle)
    }

    /// Number of active watches.
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    pub fn watch_config(&self) -> &WatchConfig {
        self.watches.config()
    }
}

/// Builder for [`Requester`].
#[derive(Default)]
pub struct RequesterBuilder {
    transport: Option<Arc<dyn RpcTransport>>,
    watch: WatchConfig,
}

impl RequesterBuilder {
    pub fn transport(mut self, transport: Arc<dyn RpcTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn watch_config(mut self, config: WatchConfig) -> Self {
        self.watch = config;
        self
    }

    /// Fails with [`ClientError::InvalidConnection`] if no transport was set.
    pub fn build(self) -> Result<Requester, ClientError> {
        let transport = self
            .transport
            .ok_or_else(|| ClientError::InvalidConnection("no transport configured".into()))?;
        Ok(Requester::with_config(transport, self.watch))
    }
}
