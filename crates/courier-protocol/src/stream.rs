//! Streaming read/write interface shared by the wire codecs.
//!
//! Generated struct code talks to these traits only, so a struct
//! serializes identically through any of the concrete encodings.

use crate::error::{CodecError, Result};

/// Wire type of a struct field or container element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Double,
    /// Strings and raw byte blobs share one wire type.
    Binary,
    Struct,
    Map,
    Set,
    List,
}

/// Nesting allowed while skipping an unknown value.
const MAX_SKIP_DEPTH: usize = 64;

/// Event-driven serializer for one encoding.
///
/// Callers drive it in document order: struct begin, then for each set
/// field a `write_field_begin` / value / `write_field_end` triple, then
/// `write_stop` and struct end. Container values nest their own
/// begin/end pairs between the field calls.
pub trait ProtocolWriter {
    fn write_struct_begin(&mut self) -> Result<()>;
    fn write_struct_end(&mut self) -> Result<()>;
    fn write_field_begin(&mut self, id: i16, ftype: FieldType) -> Result<()>;
    fn write_field_end(&mut self) -> Result<()>;
    /// Terminate the current struct's field list.
    fn write_stop(&mut self) -> Result<()>;

    fn write_bool(&mut self, v: bool) -> Result<()>;
    fn write_i8(&mut self, v: i8) -> Result<()>;
    fn write_i16(&mut self, v: i16) -> Result<()>;
    fn write_i32(&mut self, v: i32) -> Result<()>;
    fn write_i64(&mut self, v: i64) -> Result<()>;
    fn write_double(&mut self, v: f64) -> Result<()>;
    fn write_string(&mut self, v: &str) -> Result<()>;
    fn write_binary(&mut self, v: &[u8]) -> Result<()>;

    fn write_list_begin(&mut self, elem: FieldType, len: usize) -> Result<()>;
    fn write_list_end(&mut self) -> Result<()>;
    fn write_set_begin(&mut self, elem: FieldType, len: usize) -> Result<()>;
    fn write_set_end(&mut self) -> Result<()>;
    fn write_map_begin(&mut self, key: FieldType, value: FieldType, len: usize) -> Result<()>;
    fn write_map_end(&mut self) -> Result<()>;
}

/// Event-driven deserializer for one encoding.
pub trait ProtocolReader {
    fn read_struct_begin(&mut self) -> Result<()>;
    fn read_struct_end(&mut self) -> Result<()>;
    /// Next field header, or `None` once the struct's field list ends.
    fn read_field_begin(&mut self) -> Result<Option<(i16, FieldType)>>;
    fn read_field_end(&mut self) -> Result<()>;

    fn read_bool(&mut self) -> Result<bool>;
    fn read_i8(&mut self) -> Result<i8>;
    fn read_i16(&mut self) -> Result<i16>;
    fn read_i32(&mut self) -> Result<i32>;
    fn read_i64(&mut self) -> Result<i64>;
    fn read_double(&mut self) -> Result<f64>;
    fn read_string(&mut self) -> Result<String>;
    fn read_binary(&mut self) -> Result<Vec<u8>>;

    fn read_list_begin(&mut self) -> Result<(FieldType, usize)>;
    fn read_list_end(&mut self) -> Result<()>;
    fn read_set_begin(&mut self) -> Result<(FieldType, usize)>;
    fn read_set_end(&mut self) -> Result<()>;
    fn read_map_begin(&mut self) -> Result<(FieldType, FieldType, usize)>;
    fn read_map_end(&mut self) -> Result<()>;

    /// Consume one value of the given type without interpreting it.
    /// Used to drop fields the reader does not recognize.
    fn skip(&mut self, ftype: FieldType) -> Result<()>;
}

/// A struct that streams itself through a wire protocol. Implementations
/// are what the IDL compiler emits for each declared struct.
pub trait WireStruct: Sized {
    fn write(&self, writer: &mut dyn ProtocolWriter) -> Result<()>;
    fn read(reader: &mut dyn ProtocolReader) -> Result<Self>;
}

/// Generic [`ProtocolReader::skip`] for byte-oriented readers, built
/// from the reader's own primitives. Rejects values nested deeper than
/// a fixed cap so a hostile payload cannot recurse unboundedly.
pub fn skip_value(reader: &mut dyn ProtocolReader, ftype: FieldType) -> Result<()> {
    skip_nested(reader, ftype, 0)
}

fn skip_nested(reader: &mut dyn ProtocolReader, ftype: FieldType, depth: usize) -> Result<()> {
    if depth >= MAX_SKIP_DEPTH {
        return Err(CodecError::DepthLimit);
    }
    match ftype {
        FieldType::Bool => {
            reader.read_bool()?;
        }
        FieldType::I8 => {
            reader.read_i8()?;
        }
        FieldType::I16 => {
            reader.read_i16()?;
        }
        FieldType::I32 => {
            reader.read_i32()?;
        }
        FieldType::I64 => {
            reader.read_i64()?;
        }
        FieldType::Double => {
            reader.read_double()?;
        }
        FieldType::Binary => {
            reader.read_binary()?;
        }
        FieldType::Struct => {
            reader.read_struct_begin()?;
            while let Some((_, ft)) = reader.read_field_begin()? {
                skip_nested(reader, ft, depth + 1)?;
                reader.read_field_end()?;
            }
            reader.read_struct_end()?;
        }
        FieldType::List => {
            let (elem, len) = reader.read_list_begin()?;
            for _ in 0..len {
                skip_nested(reader, elem, depth + 1)?;
            }
            reader.read_list_end()?;
        }
        FieldType::Set => {
            let (elem, len) = reader.read_set_begin()?;
            for _ in 0..len {
                skip_nested(reader, elem, depth + 1)?;
            }
            reader.read_set_end()?;
        }
        FieldType::Map => {
            let (key, value, len) = reader.read_map_begin()?;
            for _ in 0..len {
                skip_nested(reader, key, depth + 1)?;
                skip_nested(reader, value, depth + 1)?;
            }
            reader.read_map_end()?;
        }
    }
    Ok(())
}
