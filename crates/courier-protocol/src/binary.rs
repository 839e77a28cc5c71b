//! The binary encoding: fixed-width big-endian scalars, one type byte
//! plus a two-byte id per field header.

use crate::error::{CodecError, Result};
use crate::stream::{skip_value, FieldType, ProtocolReader, ProtocolWriter};

const T_STOP: u8 = 0;
const T_BOOL: u8 = 2;
const T_I8: u8 = 3;
const T_DOUBLE: u8 = 4;
const T_I16: u8 = 6;
const T_I32: u8 = 8;
const T_I64: u8 = 10;
const T_BINARY: u8 = 11;
const T_STRUCT: u8 = 12;
const T_MAP: u8 = 13;
const T_SET: u8 = 14;
const T_LIST: u8 = 15;

fn type_code(ftype: FieldType) -> u8 {
    match ftype {
        FieldType::Bool => T_BOOL,
        FieldType::I8 => T_I8,
        FieldType::Double => T_DOUBLE,
        FieldType::I16 => T_I16,
        FieldType::I32 => T_I32,
        FieldType::I64 => T_I64,
        FieldType::Binary => T_BINARY,
        FieldType::Struct => T_STRUCT,
        FieldType::Map => T_MAP,
        FieldType::Set => T_SET,
        FieldType::List => T_LIST,
    }
}

fn type_from_code(code: u8) -> Result<FieldType> {
    match code {
        T_BOOL => Ok(FieldType::Bool),
        T_I8 => Ok(FieldType::I8),
        T_DOUBLE => Ok(FieldType::Double),
        T_I16 => Ok(FieldType::I16),
        T_I32 => Ok(FieldType::I32),
        T_I64 => Ok(FieldType::I64),
        T_BINARY => Ok(FieldType::Binary),
        T_STRUCT => Ok(FieldType::Struct),
        T_MAP => Ok(FieldType::Map),
        T_SET => Ok(FieldType::Set),
        T_LIST => Ok(FieldType::List),
        other => Err(CodecError::UnknownFieldType(other)),
    }
}

fn check_len(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| CodecError::InvalidLength(len as i64))
}

/// Serializer for the binary encoding. Accumulates into an owned buffer.
#[derive(Default)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl ProtocolWriter for BinaryWriter {
    fn write_struct_begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_field_begin(&mut self, id: i16, ftype: FieldType) -> Result<()> {
        self.buf.push(type_code(ftype));
        self.buf.extend_from_slice(&id.to_be_bytes());
        Ok(())
    }

    fn write_field_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_stop(&mut self) -> Result<()> {
        self.buf.push(T_STOP);
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.buf.push(v as u8);
        Ok(())
    }

    fn write_i8(&mut self, v: i8) -> Result<()> {
        self.buf.push(v as u8);
        Ok(())
    }

    fn write_i16(&mut self, v: i16) -> Result<()> {
        self.buf.extend_from_slice(&v.to_be_bytes());
        Ok(())
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.buf.extend_from_slice(&v.to_be_bytes());
        Ok(())
    }

    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.buf.extend_from_slice(&v.to_be_bytes());
        Ok(())
    }

    fn write_double(&mut self, v: f64) -> Result<()> {
        self.buf.extend_from_slice(&v.to_be_bytes());
        Ok(())
    }

    fn write_string(&mut self, v: &str) -> Result<()> {
        self.write_binary(v.as_bytes())
    }

    fn write_binary(&mut self, v: &[u8]) -> Result<()> {
        let len = check_len(v.len())?;
        self.buf.extend_from_slice(&len.to_be_bytes());
        self.buf.extend_from_slice(v);
        Ok(())
    }

    fn write_list_begin(&mut self, elem: FieldType, len: usize) -> Result<()> {
        let len = check_len(len)?;
        self.buf.push(type_code(elem));
        self.buf.extend_from_slice(&len.to_be_bytes());
        Ok(())
    }

    fn write_list_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_set_begin(&mut self, elem: FieldType, len: usize) -> Result<()> {
        self.write_list_begin(elem, len)
    }

    fn write_set_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_map_begin(&mut self, key: FieldType, value: FieldType, len: usize) -> Result<()> {
        let len = check_len(len)?;
        self.buf.push(type_code(key));
        self.buf.push(type_code(value));
        self.buf.extend_from_slice(&len.to_be_bytes());
        Ok(())
    }

    fn write_map_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Deserializer for the binary encoding. Borrows the payload and walks
/// it with a cursor, so short reads surface as `UnexpectedEof` rather
/// than panics.
pub struct BinaryReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() - self.pos < n {
            return Err(CodecError::UnexpectedEof);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn take_len(&mut self) -> Result<usize> {
        let len = i32::from_be_bytes(self.take_array()?);
        usize::try_from(len).map_err(|_| CodecError::InvalidLength(len as i64))
    }
}

impl ProtocolReader for BinaryReader<'_> {
    fn read_struct_begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_struct_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_field_begin(&mut self) -> Result<Option<(i16, FieldType)>> {
        let code = self.take_u8()?;
        if code == T_STOP {
            return Ok(None);
        }
        let ftype = type_from_code(code)?;
        let id = i16::from_be_bytes(self.take_array()?);
        Ok(Some((id, ftype)))
    }

    fn read_field_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.take_u8()? != 0)
    }

    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take_u8()? as i8)
    }

    fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    fn read_double(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.take_array()?))
    }

    fn read_string(&mut self) -> Result<String> {
        Ok(String::from_utf8(self.read_binary()?)?)
    }

    fn read_binary(&mut self) -> Result<Vec<u8>> {
        let len = self.take_len()?;
        Ok(self.take(len)?.to_vec())
    }

    fn read_list_begin(&mut self) -> Result<(FieldType, usize)> {
        let elem = type_from_code(self.take_u8()?)?;
        let len = self.take_len()?;
        Ok((elem, len))
    }

    fn read_list_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_set_begin(&mut self) -> Result<(FieldType, usize)> {
        self.read_list_begin()
    }

    fn read_set_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_map_begin(&mut self) -> Result<(FieldType, FieldType, usize)> {
        let key = type_from_code(self.take_u8()?)?;
        let value = type_from_code(self.take_u8()?)?;
        let len = self.take_len()?;
        Ok((key, value, len))
    }

    fn read_map_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn skip(&mut self, ftype: FieldType) -> Result<()> {
        skip_value(self, ftype)
    }
}
