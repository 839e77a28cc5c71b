//! The generic failure struct servers return when an RPC dies before
//! producing a declared result, for example an unknown method name or
//! an internal handler crash.

use thiserror::Error;

use crate::error::Result;
use crate::stream::{FieldType, ProtocolReader, ProtocolWriter, WireStruct};

/// Failure category carried by a [`Fault`]. The numbering is fixed by
/// the wire convention; codes outside the set collapse to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultCode {
    #[default]
    Unknown = 0,
    UnknownMethod = 1,
    InvalidMessageType = 2,
    WrongMethodName = 3,
    BadSequenceId = 4,
    MissingResult = 5,
    InternalError = 6,
    ProtocolError = 7,
    InvalidTransform = 8,
    InvalidProtocol = 9,
    UnsupportedClientType = 10,
}

impl FaultCode {
    pub fn from_i32(v: i32) -> Self {
        match v {
            1 => FaultCode::UnknownMethod,
            2 => FaultCode::InvalidMessageType,
            3 => FaultCode::WrongMethodName,
            4 => FaultCode::BadSequenceId,
            5 => FaultCode::MissingResult,
            6 => FaultCode::InternalError,
            7 => FaultCode::ProtocolError,
            8 => FaultCode::InvalidTransform,
            9 => FaultCode::InvalidProtocol,
            10 => FaultCode::UnsupportedClientType,
            _ => FaultCode::Unknown,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Out-of-band server failure, decoded from non-success responses.
///
/// Wire shape: field 1 is the message, field 2 the code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("server fault ({code:?}): {message}")]
pub struct Fault {
    pub message: String,
    pub code: FaultCode,
}

impl Fault {
    pub fn new(code: FaultCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

impl WireStruct for Fault {
    fn write(&self, writer: &mut dyn ProtocolWriter) -> Result<()> {
        writer.write_struct_begin()?;
        writer.write_field_begin(1, FieldType::Binary)?;
        writer.write_string(&self.message)?;
        writer.write_field_end()?;
        writer.write_field_begin(2, FieldType::I32)?;
        writer.write_i32(self.code.as_i32())?;
        writer.write_field_end()?;
        writer.write_stop()?;
        writer.write_struct_end()
    }

    fn read(reader: &mut dyn ProtocolReader) -> Result<Self> {
        let mut message = String::new();
        let mut code = FaultCode::Unknown;
        reader.read_struct_begin()?;
        while let Some((id, ftype)) = reader.read_field_begin()? {
            match (id, ftype) {
                (1, FieldType::Binary) => message = reader.read_string()?,
                (2, FieldType::I32) => code = FaultCode::from_i32(reader.read_i32()?),
                (_, other) => reader.skip(other)?,
            }
            reader.read_field_end()?;
        }
        reader.read_struct_end()?;
        Ok(Fault { message, code })
    }
}
