//! HTTP client for Thrift RPC services.
//!
//! Service contracts are static method tables emitted by the IDL
//! compiler. [`RpcClient`] binds every two-way method to an endpoint
//! URL at construction, then dispatches each call as a plain POST with
//! the argument struct as the body. There is no message framing: the
//! wire encoding travels in the `Content-Type` header, and the
//! response body's encoding is resolved from the response header
//! independently, falling back to compact.
//!
//! An HTTP 200 resolves the method's result envelope, which holds
//! either the return value or one declared exception. Any other status
//! carries a generic fault struct. Transport failures are classified
//! into connection, timeout, and passthrough variants of [`Error`].

mod client;
mod config;
mod contract;
mod error;
mod reply;

pub use client::{RpcClient, USER_AGENT};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use contract::{Method, MethodSpec, ServiceContract};
pub use error::{BadResponse, BadResponseKind, Error, NoException, Result};
pub use reply::{decode_fault, decode_reply, ReplyField, ReplyStruct};

pub use courier_protocol::{CodecError, Encoding, Fault, FaultCode};
