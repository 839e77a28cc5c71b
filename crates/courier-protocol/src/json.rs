//! The JSON encoding: structs become objects keyed by field id, each
//! value wrapped in a single-member object naming its wire type, for
//! example `{"1":{"i32":2}}`. Containers carry their element types and
//! length inline, binary fields are base64 strings, and non-finite
//! doubles are the strings `NaN`, `Infinity` and `-Infinity`.

use std::collections::VecDeque;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use serde_json::{Map, Number, Value};

use crate::error::{CodecError, Result};
use crate::stream::{FieldType, ProtocolReader, ProtocolWriter};

fn type_name(ftype: FieldType) -> &'static str {
    match ftype {
        FieldType::Bool => "tf",
        FieldType::I8 => "i8",
        FieldType::I16 => "i16",
        FieldType::I32 => "i32",
        FieldType::I64 => "i64",
        FieldType::Double => "dbl",
        FieldType::Binary => "str",
        FieldType::Struct => "rec",
        FieldType::Map => "map",
        FieldType::Set => "set",
        FieldType::List => "lst",
    }
}

fn type_from_name(name: &str) -> Result<FieldType> {
    match name {
        "tf" => Ok(FieldType::Bool),
        "i8" => Ok(FieldType::I8),
        "i16" => Ok(FieldType::I16),
        "i32" => Ok(FieldType::I32),
        "i64" => Ok(FieldType::I64),
        "dbl" => Ok(FieldType::Double),
        "str" => Ok(FieldType::Binary),
        "rec" => Ok(FieldType::Struct),
        "map" => Ok(FieldType::Map),
        "set" => Ok(FieldType::Set),
        "lst" => Ok(FieldType::List),
        other => Err(CodecError::UnknownTypeName(other.to_string())),
    }
}

enum WFrame {
    Struct {
        fields: Map<String, Value>,
        pending: Option<(i16, &'static str)>,
    },
    Seq {
        items: Vec<Value>,
    },
    Map {
        key_name: &'static str,
        value_name: &'static str,
        len: usize,
        entries: Map<String, Value>,
        key: Option<String>,
    },
}

fn stringify_key(value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(CodecError::UnexpectedJson("map key must be a scalar")),
    }
}

/// Serializer for the JSON encoding. Builds a value tree through a
/// frame stack, then renders it in one pass in `into_bytes`.
#[derive(Default)]
pub struct JsonWriter {
    frames: Vec<WFrame>,
    root: Option<Value>,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self.root {
            Some(value) => Ok(serde_json::to_vec(&value)?),
            None => Err(CodecError::UnexpectedJson("no value was written")),
        }
    }

    /// Route a finished value into the enclosing frame. Struct frames
    /// wrap it in the pending field's type object, map frames alternate
    /// between key and value position.
    fn emit(&mut self, value: Value) -> Result<()> {
        match self.frames.last_mut() {
            Some(WFrame::Struct { fields, pending }) => match pending.take() {
                Some((id, tname)) => {
                    let mut wrap = Map::with_capacity(1);
                    wrap.insert(tname.to_string(), value);
                    fields.insert(id.to_string(), Value::Object(wrap));
                }
                None => return Err(CodecError::UnexpectedJson("value outside a field")),
            },
            Some(WFrame::Seq { items }) => items.push(value),
            Some(WFrame::Map { entries, key, .. }) => match key.take() {
                Some(k) => {
                    entries.insert(k, value);
                }
                None => *key = Some(stringify_key(value)?),
            },
            None => self.root = Some(value),
        }
        Ok(())
    }
}

impl ProtocolWriter for JsonWriter {
    fn write_struct_begin(&mut self) -> Result<()> {
        self.frames.push(WFrame::Struct {
            fields: Map::new(),
            pending: None,
        });
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(WFrame::Struct { fields, .. }) => self.emit(Value::Object(fields)),
            _ => Err(CodecError::UnexpectedJson("unbalanced struct end")),
        }
    }

    fn write_field_begin(&mut self, id: i16, ftype: FieldType) -> Result<()> {
        match self.frames.last_mut() {
            Some(WFrame::Struct { pending, .. }) => {
                *pending = Some((id, type_name(ftype)));
                Ok(())
            }
            _ => Err(CodecError::UnexpectedJson("field outside a struct")),
        }
    }

    fn write_field_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.emit(Value::from(v as i64))
    }

    fn write_i8(&mut self, v: i8) -> Result<()> {
        self.emit(Value::from(i64::from(v)))
    }

    fn write_i16(&mut self, v: i16) -> Result<()> {
        self.emit(Value::from(i64::from(v)))
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.emit(Value::from(i64::from(v)))
    }

    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.emit(Value::from(v))
    }

    fn write_double(&mut self, v: f64) -> Result<()> {
        let value = if v.is_nan() {
            Value::String("NaN".to_string())
        } else if v == f64::INFINITY {
            Value::String("Infinity".to_string())
        } else if v == f64::NEG_INFINITY {
            Value::String("-Infinity".to_string())
        } else {
            match Number::from_f64(v) {
                Some(n) => Value::Number(n),
                None => return Err(CodecError::UnexpectedJson("unrepresentable double")),
            }
        };
        self.emit(value)
    }

    fn write_string(&mut self, v: &str) -> Result<()> {
        self.emit(Value::String(v.to_string()))
    }

    fn write_binary(&mut self, v: &[u8]) -> Result<()> {
        self.emit(Value::String(STANDARD_NO_PAD.encode(v)))
    }

    fn write_list_begin(&mut self, elem: FieldType, len: usize) -> Result<()> {
        let items = vec![
            Value::String(type_name(elem).to_string()),
            Value::from(len as u64),
        ];
        self.frames.push(WFrame::Seq { items });
        Ok(())
    }

    fn write_list_end(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(WFrame::Seq { items }) => self.emit(Value::Array(items)),
            _ => Err(CodecError::UnexpectedJson("unbalanced list end")),
        }
    }

    fn write_set_begin(&mut self, elem: FieldType, len: usize) -> Result<()> {
        self.write_list_begin(elem, len)
    }

    fn write_set_end(&mut self) -> Result<()> {
        self.write_list_end()
    }

    fn write_map_begin(&mut self, key: FieldType, value: FieldType, len: usize) -> Result<()> {
        self.frames.push(WFrame::Map {
            key_name: type_name(key),
            value_name: type_name(value),
            len,
            entries: Map::new(),
            key: None,
        });
        Ok(())
    }

    fn write_map_end(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(WFrame::Map {
                key_name,
                value_name,
                len,
                entries,
                ..
            }) => self.emit(Value::Array(vec![
                Value::String(key_name.to_string()),
                Value::String(value_name.to_string()),
                Value::from(len as u64),
                Value::Object(entries),
            ])),
            _ => Err(CodecError::UnexpectedJson("unbalanced map end")),
        }
    }
}

enum RFrame {
    Struct {
        fields: VecDeque<(String, Value)>,
        current: Option<Value>,
    },
    Seq {
        items: VecDeque<Value>,
    },
    Map {
        pairs: VecDeque<(String, Value)>,
        expect_key: bool,
    },
}

/// Deserializer for the JSON encoding. Parses the payload up front,
/// then serves reads by walking the value tree with a frame stack.
pub struct JsonReader {
    frames: Vec<RFrame>,
    root: Option<Value>,
}

impl JsonReader {
    pub fn new(bytes: &[u8]) -> Result<Self> {
        let root: Value = serde_json::from_slice(bytes)?;
        Ok(Self {
            frames: Vec::new(),
            root: Some(root),
        })
    }

    fn next_value(&mut self) -> Result<Value> {
        match self.frames.last_mut() {
            Some(RFrame::Struct { current, .. }) => current
                .take()
                .ok_or(CodecError::UnexpectedJson("no field value to read")),
            Some(RFrame::Seq { items }) => items.pop_front().ok_or(CodecError::UnexpectedEof),
            Some(RFrame::Map { pairs, expect_key }) => {
                if *expect_key {
                    let key = pairs.front().ok_or(CodecError::UnexpectedEof)?.0.clone();
                    *expect_key = false;
                    Ok(Value::String(key))
                } else {
                    let (_, value) = pairs.pop_front().ok_or(CodecError::UnexpectedEof)?;
                    *expect_key = true;
                    Ok(value)
                }
            }
            None => self
                .root
                .take()
                .ok_or(CodecError::UnexpectedJson("no value to read")),
        }
    }

    fn next_i64(&mut self, what: &'static str) -> Result<i64> {
        match self.next_value()? {
            Value::Number(n) => n.as_i64().ok_or(CodecError::OutOfRange(what)),
            // Map keys arrive as strings even for integer key types.
            Value::String(s) => s
                .parse()
                .map_err(|_| CodecError::UnexpectedJson("expected an integer")),
            _ => Err(CodecError::UnexpectedJson("expected an integer")),
        }
    }
}

impl ProtocolReader for JsonReader {
    fn read_struct_begin(&mut self) -> Result<()> {
        match self.next_value()? {
            Value::Object(map) => {
                self.frames.push(RFrame::Struct {
                    fields: map.into_iter().collect(),
                    current: None,
                });
                Ok(())
            }
            _ => Err(CodecError::UnexpectedJson("struct must be an object")),
        }
    }

    fn read_struct_end(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(RFrame::Struct { .. }) => Ok(()),
            _ => Err(CodecError::UnexpectedJson("unbalanced struct end")),
        }
    }

    fn read_field_begin(&mut self) -> Result<Option<(i16, FieldType)>> {
        let (fields, current) = match self.frames.last_mut() {
            Some(RFrame::Struct { fields, current }) => (fields, current),
            _ => return Err(CodecError::UnexpectedJson("field outside a struct")),
        };
        let Some((key, value)) = fields.pop_front() else {
            return Ok(None);
        };
        let id: i16 = key
            .parse()
            .map_err(|_| CodecError::UnexpectedJson("field key must be a numeric id"))?;
        let Value::Object(wrap) = value else {
            return Err(CodecError::UnexpectedJson("field value must be a typed object"));
        };
        let mut members = wrap.into_iter();
        let Some((tname, inner)) = members.next() else {
            return Err(CodecError::UnexpectedJson("field object is empty"));
        };
        if members.next().is_some() {
            return Err(CodecError::UnexpectedJson("field object has multiple types"));
        }
        let ftype = type_from_name(&tname)?;
        *current = Some(inner);
        Ok(Some((id, ftype)))
    }

    fn read_field_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool> {
        match self.next_value()? {
            Value::Number(n) => Ok(matches!(n.as_i64(), Some(v) if v != 0)),
            Value::Bool(b) => Ok(b),
            Value::String(s) => Ok(s == "1"),
            _ => Err(CodecError::UnexpectedJson("expected a boolean")),
        }
    }

    fn read_i8(&mut self) -> Result<i8> {
        i8::try_from(self.next_i64("i8")?).map_err(|_| CodecError::OutOfRange("i8"))
    }

    fn read_i16(&mut self) -> Result<i16> {
        i16::try_from(self.next_i64("i16")?).map_err(|_| CodecError::OutOfRange("i16"))
    }

    fn read_i32(&mut self) -> Result<i32> {
        i32::try_from(self.next_i64("i32")?).map_err(|_| CodecError::OutOfRange("i32"))
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.next_i64("i64")
    }

    fn read_double(&mut self) -> Result<f64> {
        match self.next_value()? {
            Value::Number(n) => n
                .as_f64()
                .ok_or(CodecError::UnexpectedJson("expected a double")),
            Value::String(s) => match s.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => other
                    .parse()
                    .map_err(|_| CodecError::UnexpectedJson("expected a double")),
            },
            _ => Err(CodecError::UnexpectedJson("expected a double")),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        match self.next_value()? {
            Value::String(s) => Ok(s),
            _ => Err(CodecError::UnexpectedJson("expected a string")),
        }
    }

    fn read_binary(&mut self) -> Result<Vec<u8>> {
        let s = self.read_string()?;
        // Accept both padded and unpadded base64.
        Ok(STANDARD_NO_PAD.decode(s.trim_end_matches('='))?)
    }

    fn read_list_begin(&mut self) -> Result<(FieldType, usize)> {
        let Value::Array(items) = self.next_value()? else {
            return Err(CodecError::UnexpectedJson("container must be an array"));
        };
        let mut items: VecDeque<Value> = items.into();
        let elem = match items.pop_front() {
            Some(Value::String(name)) => type_from_name(&name)?,
            _ => {
                return Err(CodecError::UnexpectedJson(
                    "container header missing element type",
                ))
            }
        };
        let len = match items.pop_front() {
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| usize::try_from(v).ok())
                .ok_or(CodecError::UnexpectedJson("container header missing length"))?,
            _ => {
                return Err(CodecError::UnexpectedJson(
                    "container header missing length",
                ))
            }
        };
        if len != items.len() {
            return Err(CodecError::UnexpectedJson("container length mismatch"));
        }
        self.frames.push(RFrame::Seq { items });
        Ok((elem, len))
    }

    fn read_list_end(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(RFrame::Seq { .. }) => Ok(()),
            _ => Err(CodecError::UnexpectedJson("unbalanced list end")),
        }
    }

    fn read_set_begin(&mut self) -> Result<(FieldType, usize)> {
        self.read_list_begin()
    }

    fn read_set_end(&mut self) -> Result<()> {
        self.read_list_end()
    }

    fn read_map_begin(&mut self) -> Result<(FieldType, FieldType, usize)> {
        let Value::Array(header) = self.next_value()? else {
            return Err(CodecError::UnexpectedJson("map must be an array"));
        };
        let mut header: VecDeque<Value> = header.into();
        let key = match header.pop_front() {
            Some(Value::String(name)) => type_from_name(&name)?,
            _ => return Err(CodecError::UnexpectedJson("map header missing key type")),
        };
        let value = match header.pop_front() {
            Some(Value::String(name)) => type_from_name(&name)?,
            _ => return Err(CodecError::UnexpectedJson("map header missing value type")),
        };
        let len = match header.pop_front() {
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| usize::try_from(v).ok())
                .ok_or(CodecError::UnexpectedJson("map header missing length"))?,
            _ => return Err(CodecError::UnexpectedJson("map header missing length")),
        };
        let pairs: VecDeque<(String, Value)> = match header.pop_front() {
            Some(Value::Object(map)) => map.into_iter().collect(),
            None if len == 0 => VecDeque::new(),
            _ => return Err(CodecError::UnexpectedJson("map entries must be an object")),
        };
        if len != pairs.len() {
            return Err(CodecError::UnexpectedJson("map length mismatch"));
        }
        self.frames.push(RFrame::Map {
            pairs,
            expect_key: true,
        });
        Ok((key, value, len))
    }

    fn read_map_end(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(RFrame::Map { .. }) => Ok(()),
            _ => Err(CodecError::UnexpectedJson("unbalanced map end")),
        }
    }

    fn skip(&mut self, _ftype: FieldType) -> Result<()> {
        // The payload is already parsed; dropping the next value is enough.
        self.next_value().map(|_| ())
    }
}
