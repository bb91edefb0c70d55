//! noderpc-api: namespaced API registry for noderpc.
//!
//! API descriptors are registered explicitly into an [`ApiRegistry`]
//! under one of the node's [`Namespace`]s. Each registration yields an
//! [`ApiMethod`] that knows its RPC method name, arity and formatters, and
//! is invoked through a [`Requester`](noderpc_core::Requester).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use noderpc_api::{Api, ApiRegistry, Namespace};
//! use noderpc_core::{LocalTransport, Requester};
//!
//! # async fn demo() -> Result<(), noderpc_api::ApiError> {
//! let requester = Requester::new(Arc::new(LocalTransport::new()));
//! let api = Api::new(requester, ApiRegistry::with_defaults());
//! let height = api.call(Namespace::Chain, "latestStableHeight", vec![]).await?;
//! # Ok(())
//! # }
//! ```

pub mod descriptor;
pub mod error;
pub mod formatters;
pub mod namespace;
pub mod registry;

pub use descriptor::{ApiDescriptor, InputFormatter, OutputFormatter, StaticCall};
pub use error::ApiError;
pub use namespace::Namespace;
pub use registry::{Api, ApiMethod, ApiRegistry};
