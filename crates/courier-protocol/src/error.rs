//! Error types for the wire codecs

use thiserror::Error;

/// Failures raised while encoding or decoding a struct payload.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload ended before the value being read was complete
    #[error("payload ended unexpectedly")]
    UnexpectedEof,

    /// A wire type code outside the closed set
    #[error("unknown wire type code {0:#04x}")]
    UnknownFieldType(u8),

    /// A JSON protocol type name outside the closed set
    #[error("unknown type name `{0}`")]
    UnknownTypeName(String),

    /// A negative or impossibly large length prefix
    #[error("invalid length {0}")]
    InvalidLength(i64),

    /// A varint ran past its maximum width
    #[error("varint longer than 10 bytes")]
    InvalidVarint,

    /// An integer did not fit the declared field width
    #[error("{0} out of range")]
    OutOfRange(&'static str),

    /// A string field held bytes that are not UTF-8
    #[error("string field is not valid utf-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Unknown-value skipping hit the nesting cap
    #[error("value nesting exceeds the skip depth limit")]
    DepthLimit,

    /// The JSON payload parsed but did not have the protocol's shape
    #[error("unexpected json shape: {0}")]
    UnexpectedJson(&'static str),

    /// The JSON payload failed to parse at all
    #[error("malformed json payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A binary field carried invalid base64
    #[error("invalid base64 in binary field: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
