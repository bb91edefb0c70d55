//! noderpc-core: JSON-RPC client plumbing for blockchain nodes.
//!
//! # Overview
//!
//! - [`RpcTransport`]: the async trait every transport implements
//! - [`JsonRpcCodec`]: request ids, payload building, response validation
//! - [`Requester`]: single calls, batch calls and watches over a transport
//! - [`watch`] module: the polling engine behind [`Requester::watch`]
//! - [`LocalTransport`]: in-process transport backed by handlers
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use noderpc_core::{LocalTransport, Requester};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), noderpc_core::ClientError> {
//! let node = LocalTransport::new().with_constant("chain_chainID", json!("0x5"));
//! let requester = Requester::new(Arc::new(node));
//! let chain_id = requester.send("chain_chainID", vec![]).await?;
//! assert_eq!(chain_id, json!("0x5"));
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod local;
pub mod request;
pub mod requester;
pub mod transport;
pub mod watch;

pub use codec::{validate_batch, validate_response, JsonRpcCodec};
pub use config::WatchConfig;
pub use error::{ClientError, TransportError};
pub use local::LocalTransport;
pub use request::{BatchEntry, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId, RpcParam};
pub use requester::{Requester, RequesterBuilder};
pub use transport::RpcTransport;
pub use watch::{WatchCallback, WatchHandle};
