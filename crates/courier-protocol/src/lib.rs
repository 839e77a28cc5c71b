//! Wire-level support for RPC payloads: the three struct encodings
//! (binary, compact, JSON), the content-type tokens that name them, and
//! the generic fault struct servers send when a call dies out of band.
//!
//! Generated struct code implements [`WireStruct`] against the
//! [`ProtocolWriter`] and [`ProtocolReader`] traits, so one struct
//! definition serializes through whichever encoding a call negotiates.

mod binary;
mod compact;
mod encoding;
mod error;
mod fault;
mod json;
mod stream;

pub use binary::{BinaryReader, BinaryWriter};
pub use compact::{CompactReader, CompactWriter};
pub use encoding::{
    from_bytes, to_bytes, Encoding, BINARY_CONTENT_TYPE, COMPACT_CONTENT_TYPE, JSON_CONTENT_TYPE,
};
pub use error::{CodecError, Result};
pub use fault::{Fault, FaultCode};
pub use json::{JsonReader, JsonWriter};
pub use stream::{skip_value, FieldType, ProtocolReader, ProtocolWriter, WireStruct};
