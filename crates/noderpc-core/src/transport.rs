//! The `RpcTransport` trait: the seam between the JSON-RPC layer and the
//! network.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::request::JsonRpcRequest;

/// Moves JSON-RPC payloads to a node and hands back the raw, parsed reply.
///
/// Transports do not judge the reply: a JSON-RPC error object or a
/// malformed envelope is still `Ok` here and is rejected later by the
/// codec. `Err` is reserved for failures below the protocol (I/O, HTTP
/// status, unparsable bytes).
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so a requester can be shared
/// across Tokio tasks, and stored as `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send a single request and return the raw response object.
    async fn send(&self, req: JsonRpcRequest) -> Result<Value, TransportError>;

    /// Send a batch of requests as one unit and return the raw response array.
    ///
    /// Default implementation sends them sequentially and assembles the
    /// replies in request order; override for true batching.
    async fn send_batch(&self, reqs: Vec<JsonRpcRequest>) -> Result<Value, TransportError> {
        let mut responses = Vec::with_capacity(reqs.len());
        for req in reqs {
            responses.push(self.send(req).await?);
        }
        Ok(Value::Array(responses))
    }

    /// Return the transport's identifier (URL or name).
    fn url(&self) -> &str;
}
