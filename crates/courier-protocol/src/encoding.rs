//! Encoding selection and whole-struct serialization entry points.

use crate::binary::{BinaryReader, BinaryWriter};
use crate::compact::{CompactReader, CompactWriter};
use crate::error::Result;
use crate::json::{JsonReader, JsonWriter};
use crate::stream::WireStruct;

pub const BINARY_CONTENT_TYPE: &str = "application/vnd.apache.thrift.binary";
pub const COMPACT_CONTENT_TYPE: &str = "application/vnd.apache.thrift.compact";
pub const JSON_CONTENT_TYPE: &str = "application/vnd.apache.thrift.json";

/// Wire encoding applied to struct payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    Binary,
    #[default]
    Compact,
    Json,
}

impl Encoding {
    /// The negotiation token sent as the request `Content-Type`.
    pub fn content_type(self) -> &'static str {
        match self {
            Encoding::Binary => BINARY_CONTENT_TYPE,
            Encoding::Compact => COMPACT_CONTENT_TYPE,
            Encoding::Json => JSON_CONTENT_TYPE,
        }
    }

    /// Resolve the encoding a response header declares. Matching is an
    /// exact comparison against the three tokens, no parameter
    /// stripping; anything else, including an absent header, resolves
    /// to compact.
    pub fn from_content_type(token: Option<&str>) -> Self {
        match token {
            Some(BINARY_CONTENT_TYPE) => Encoding::Binary,
            Some(COMPACT_CONTENT_TYPE) => Encoding::Compact,
            Some(JSON_CONTENT_TYPE) => Encoding::Json,
            _ => Encoding::Compact,
        }
    }
}

/// Serialize one struct as a complete payload in the given encoding.
pub fn to_bytes<S: WireStruct>(value: &S, encoding: Encoding) -> Result<Vec<u8>> {
    match encoding {
        Encoding::Binary => {
            let mut writer = BinaryWriter::new();
            value.write(&mut writer)?;
            Ok(writer.into_bytes())
        }
        Encoding::Compact => {
            let mut writer = CompactWriter::new();
            value.write(&mut writer)?;
            Ok(writer.into_bytes())
        }
        Encoding::Json => {
            let mut writer = JsonWriter::new();
            value.write(&mut writer)?;
            writer.into_bytes()
        }
    }
}

/// Deserialize one struct from a complete payload in the given encoding.
pub fn from_bytes<S: WireStruct>(bytes: &[u8], encoding: Encoding) -> Result<S> {
    match encoding {
        Encoding::Binary => S::read(&mut BinaryReader::new(bytes)),
        Encoding::Compact => S::read(&mut CompactReader::new(bytes)),
        Encoding::Json => S::read(&mut JsonReader::new(bytes)?),
    }
}
