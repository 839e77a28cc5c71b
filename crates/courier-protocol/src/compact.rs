//! The compact encoding: zigzag varint integers, delta-encoded field
//! ids, bools folded into the field header, little-endian doubles.

use crate::error::{CodecError, Result};
use crate::stream::{skip_value, FieldType, ProtocolReader, ProtocolWriter};

const C_STOP: u8 = 0;
const C_BOOL_TRUE: u8 = 1;
const C_BOOL_FALSE: u8 = 2;
const C_I8: u8 = 3;
const C_I16: u8 = 4;
const C_I32: u8 = 5;
const C_I64: u8 = 6;
const C_DOUBLE: u8 = 7;
const C_BINARY: u8 = 8;
const C_LIST: u8 = 9;
const C_SET: u8 = 10;
const C_MAP: u8 = 11;
const C_STRUCT: u8 = 12;

/// Maximum field or container length, shared with the binary encoding.
const MAX_LEN: u64 = i32::MAX as u64;

fn type_code(ftype: FieldType) -> u8 {
    match ftype {
        // As a container element type, bool uses the "true" code.
        FieldType::Bool => C_BOOL_TRUE,
        FieldType::I8 => C_I8,
        FieldType::I16 => C_I16,
        FieldType::I32 => C_I32,
        FieldType::I64 => C_I64,
        FieldType::Double => C_DOUBLE,
        FieldType::Binary => C_BINARY,
        FieldType::List => C_LIST,
        FieldType::Set => C_SET,
        FieldType::Map => C_MAP,
        FieldType::Struct => C_STRUCT,
    }
}

fn type_from_code(code: u8) -> Result<FieldType> {
    match code {
        C_BOOL_TRUE | C_BOOL_FALSE => Ok(FieldType::Bool),
        C_I8 => Ok(FieldType::I8),
        C_I16 => Ok(FieldType::I16),
        C_I32 => Ok(FieldType::I32),
        C_I64 => Ok(FieldType::I64),
        C_DOUBLE => Ok(FieldType::Double),
        C_BINARY => Ok(FieldType::Binary),
        C_LIST => Ok(FieldType::List),
        C_SET => Ok(FieldType::Set),
        C_MAP => Ok(FieldType::Map),
        C_STRUCT => Ok(FieldType::Struct),
        other => Err(CodecError::UnknownFieldType(other)),
    }
}

fn zigzag32(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

fn zigzag64(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

fn unzigzag32(v: u32) -> i32 {
    ((v >> 1) as i32) ^ -((v & 1) as i32)
}

fn unzigzag64(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

fn write_varint(buf: &mut Vec<u8>, mut v: u64) {
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Serializer for the compact encoding.
///
/// Field ids are delta-encoded against the previous id in the same
/// struct, so the writer keeps a stack of "last id" values across
/// nested structs. A bool field's header is deferred until the value
/// arrives because the value lives in the header's type nibble.
#[derive(Default)]
pub struct CompactWriter {
    buf: Vec<u8>,
    last_field_id: i16,
    field_stack: Vec<i16>,
    bool_field: Option<i16>,
}

impl CompactWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_field_header(&mut self, id: i16, code: u8) {
        let delta = id as i32 - self.last_field_id as i32;
        if (1..=15).contains(&delta) {
            self.buf.push(((delta as u8) << 4) | code);
        } else {
            self.buf.push(code);
            write_varint(&mut self.buf, zigzag32(id as i32) as u64);
        }
        self.last_field_id = id;
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        if len as u64 > MAX_LEN {
            return Err(CodecError::InvalidLength(len as i64));
        }
        write_varint(&mut self.buf, len as u64);
        Ok(())
    }
}

impl ProtocolWriter for CompactWriter {
    fn write_struct_begin(&mut self) -> Result<()> {
        self.field_stack.push(self.last_field_id);
        self.last_field_id = 0;
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<()> {
        self.last_field_id = self.field_stack.pop().unwrap_or(0);
        Ok(())
    }

    fn write_field_begin(&mut self, id: i16, ftype: FieldType) -> Result<()> {
        if ftype == FieldType::Bool {
            self.bool_field = Some(id);
        } else {
            self.write_field_header(id, type_code(ftype));
        }
        Ok(())
    }

    fn write_field_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_stop(&mut self) -> Result<()> {
        self.buf.push(C_STOP);
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        let code = if v { C_BOOL_TRUE } else { C_BOOL_FALSE };
        match self.bool_field.take() {
            Some(id) => self.write_field_header(id, code),
            // Container elements carry the value as a plain byte.
            None => self.buf.push(code),
        }
        Ok(())
    }

    fn write_i8(&mut self, v: i8) -> Result<()> {
        self.buf.push(v as u8);
        Ok(())
    }

    fn write_i16(&mut self, v: i16) -> Result<()> {
        write_varint(&mut self.buf, zigzag32(v as i32) as u64);
        Ok(())
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        write_varint(&mut self.buf, zigzag32(v) as u64);
        Ok(())
    }

    fn write_i64(&mut self, v: i64) -> Result<()> {
        write_varint(&mut self.buf, zigzag64(v));
        Ok(())
    }

    fn write_double(&mut self, v: f64) -> Result<()> {
        self.buf.extend_from_slice(&v.to_le_bytes());
        Ok(())
    }

    fn write_string(&mut self, v: &str) -> Result<()> {
        self.write_binary(v.as_bytes())
    }

    fn write_binary(&mut self, v: &[u8]) -> Result<()> {
        self.write_len(v.len())?;
        self.buf.extend_from_slice(v);
        Ok(())
    }

    fn write_list_begin(&mut self, elem: FieldType, len: usize) -> Result<()> {
        if len <= 14 {
            self.buf.push(((len as u8) << 4) | type_code(elem));
        } else {
            self.buf.push(0xF0 | type_code(elem));
            self.write_len(len)?;
        }
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
        self.write_len(len)?;
        if len > 0 {
            self.buf.push((type_code(key) << 4) | type_code(value));
        }
        Ok(())
    }

    fn write_map_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Deserializer for the compact encoding. Mirrors the writer's field-id
/// and deferred-bool state.
pub struct CompactReader<'a> {
    buf: &'a [u8],
    pos: usize,
    last_field_id: i16,
    field_stack: Vec<i16>,
    pending_bool: Option<bool>,
}

impl<'a> CompactReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            last_field_id: 0,
            field_stack: Vec::new(),
            pending_bool: None,
        }
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

    fn read_varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.take_u8()?;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 70 {
                return Err(CodecError::InvalidVarint);
            }
        }
    }

    fn read_varint32(&mut self) -> Result<u32> {
        let v = self.read_varint()?;
        u32::try_from(v).map_err(|_| CodecError::InvalidVarint)
    }

    fn read_len(&mut self) -> Result<usize> {
        let len = self.read_varint()?;
        if len > MAX_LEN {
            return Err(CodecError::InvalidLength(len as i64));
        }
        Ok(len as usize)
    }
}

impl ProtocolReader for CompactReader<'_> {
    fn read_struct_begin(&mut self) -> Result<()> {
        self.field_stack.push(self.last_field_id);
        self.last_field_id = 0;
        Ok(())
    }

    fn read_struct_end(&mut self) -> Result<()> {
        self.last_field_id = self.field_stack.pop().unwrap_or(0);
        Ok(())
    }

    fn read_field_begin(&mut self) -> Result<Option<(i16, FieldType)>> {
        let byte = self.take_u8()?;
        if byte == C_STOP {
            return Ok(None);
        }
        let code = byte & 0x0F;
        let delta = byte >> 4;
        let id = if delta == 0 {
            let raw = unzigzag32(self.read_varint32()?);
            i16::try_from(raw).map_err(|_| CodecError::OutOfRange("field id"))?
        } else {
            self.last_field_id
                .checked_add(delta as i16)
                .ok_or(CodecError::OutOfRange("field id"))?
        };
        let ftype = type_from_code(code)?;
        if ftype == FieldType::Bool {
            self.pending_bool = Some(code == C_BOOL_TRUE);
        }
        self.last_field_id = id;
        Ok(Some((id, ftype)))
    }

    fn read_field_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool> {
        match self.pending_bool.take() {
            Some(v) => Ok(v),
            None => Ok(self.take_u8()? == C_BOOL_TRUE),
        }
    }

    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take_u8()? as i8)
    }

    fn read_i16(&mut self) -> Result<i16> {
        let v = unzigzag32(self.read_varint32()?);
        i16::try_from(v).map_err(|_| CodecError::OutOfRange("i16"))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(unzigzag32(self.read_varint32()?))
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(unzigzag64(self.read_varint()?))
    }

    fn read_double(&mut self) -> Result<f64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(f64::from_le_bytes(bytes))
    }

    fn read_string(&mut self) -> Result<String> {
        Ok(String::from_utf8(self.read_binary()?)?)
    }

    fn read_binary(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        Ok(self.take(len)?.to_vec())
    }

    fn read_list_begin(&mut self) -> Result<(FieldType, usize)> {
        let byte = self.take_u8()?;
        let elem = type_from_code(byte & 0x0F)?;
        let short = (byte >> 4) as usize;
        let len = if short == 15 { self.read_len()? } else { short };
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
        let len = self.read_len()?;
        if len == 0 {
            // No types byte follows an empty map; the types are unused.
            return Ok((FieldType::Bool, FieldType::Bool, 0));
        }
        let types = self.take_u8()?;
        let key = type_from_code(types >> 4)?;
        let value = type_from_code(types & 0x0F)?;
        Ok((key, value, len))
    }

    fn read_map_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn skip(&mut self, ftype: FieldType) -> Result<()> {
        skip_value(self, ftype)
    }
}
