//! Error types for RPC calls

use std::fmt;
use std::time::Duration;

use courier_protocol::{CodecError, Fault};
use thiserror::Error;

/// Errors that can occur when issuing an RPC.
///
/// `E` is the method's declared exception type; methods that declare
/// none use [`NoException`], which makes the `Exception` variant
/// impossible to construct for them.
#[derive(Debug, Error)]
pub enum Error<E = NoException> {
    /// The endpoint could not be reached at all
    #[error("connection to {url} failed")]
    ConnectionFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The call did not complete within the configured timeout
    #[error("rpc {rpc} timed out after {timeout:?}")]
    Timeout {
        rpc: &'static str,
        timeout: Duration,
        #[source]
        source: reqwest::Error,
    },

    /// Transport failure that is neither a refusal nor a timeout
    #[error("transport error during rpc {rpc}")]
    Transport {
        rpc: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not a usable result or fault
    #[error(transparent)]
    BadResponse(#[from] BadResponse),

    /// A declared exception raised by the server handler
    #[error("rpc raised a declared exception: {0}")]
    Exception(E),

    /// Out-of-band failure reported by the server
    #[error(transparent)]
    Fault(#[from] Fault),

    /// Client construction failed
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The method has no bound endpoint
    #[error("rpc {rpc} has no bound endpoint")]
    NotBound { rpc: &'static str },

    /// Request arguments failed to encode
    #[error("failed to encode request arguments: {0}")]
    Encode(#[from] CodecError),
}

/// Result type for RPC operations
pub type Result<T, E = NoException> = std::result::Result<T, Error<E>>;

/// A response whose body could not be interpreted as what its status
/// promised
#[derive(Debug, Error)]
#[error("bad response for rpc {rpc}: {kind}")]
pub struct BadResponse {
    pub rpc: &'static str,
    pub kind: BadResponseKind,
}

/// What made a response body unusable
#[derive(Debug, Error)]
pub enum BadResponseKind {
    /// The result held neither a value nor an exception
    #[error("result held neither a value nor an exception")]
    MissingResult,

    /// More than one result field was set
    #[error("result held {0} fields where at most one was expected")]
    MultipleFields(usize),

    /// The body failed to decode at all
    #[error("undecodable body: {0}")]
    Decode(#[from] CodecError),
}

/// Exception type for methods that declare no exceptions. Uninhabited,
/// so such methods can never take the `Exception` error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoException {}

impl fmt::Display for NoException {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl std::error::Error for NoException {}

/// Map a transport error onto the call taxonomy: timeouts and refused
/// connections get their own variants, everything else passes through.
pub(crate) fn classify<E>(
    rpc: &'static str,
    url: &str,
    timeout: Duration,
    source: reqwest::Error,
) -> Error<E> {
    if source.is_timeout() {
        Error::Timeout {
            rpc,
            timeout,
            source,
        }
    } else if source.is_connect() {
        Error::ConnectionFailed {
            url: url.to_string(),
            source,
        }
    } else {
        Error::Transport { rpc, source }
    }
}
