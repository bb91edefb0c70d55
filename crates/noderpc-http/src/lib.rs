//! noderpc-http: JSON-RPC over HTTP POST, backed by `reqwest`.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use noderpc_core::Requester;
//! use noderpc_http::HttpTransport;
//!
//! # async fn demo() -> Result<(), noderpc_core::ClientError> {
//! let transport = HttpTransport::default_for("http://127.0.0.1:8027")?;
//! let requester = Requester::new(Arc::new(transport));
//! let height = requester.send("chain_latestStableHeight", vec![]).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::{HttpTransport, HttpTransportConfig};
