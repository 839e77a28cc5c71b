//! Hand-rolled contract for a small arithmetic service, mirroring the
//! struct and envelope code the IDL compiler emits: argument structs,
//! result envelopes, one marker type per RPC, and a typed facade.

use courier_client::{
    ClientConfig, Method, MethodSpec, NoException, ReplyField, ReplyStruct, RpcClient,
    ServiceContract,
};
use courier_protocol::{CodecError, FieldType, ProtocolReader, ProtocolWriter, WireStruct};
use thiserror::Error;

/// Arithmetic service contract
pub struct Calculator;

impl ServiceContract for Calculator {
    const SERVICE: &'static str = "Calculator";
    const METHODS: &'static [MethodSpec] = &[
        MethodSpec::two_way("add"),
        MethodSpec::two_way("divide"),
        MethodSpec::two_way("ping"),
        MethodSpec::one_way("logUsage"),
    ];
}

// ===== add =====

pub struct Add;

impl Method for Add {
    type Service = Calculator;
    const NAME: &'static str = "add";
    type Args = AddArgs;
    type Reply = AddReply;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddArgs {
    pub a: i32,
    pub b: i32,
}

impl WireStruct for AddArgs {
    fn write(&self, writer: &mut dyn ProtocolWriter) -> Result<(), CodecError> {
        writer.write_struct_begin()?;
        writer.write_field_begin(1, FieldType::I32)?;
        writer.write_i32(self.a)?;
        writer.write_field_end()?;
        writer.write_field_begin(2, FieldType::I32)?;
        writer.write_i32(self.b)?;
        writer.write_field_end()?;
        writer.write_stop()?;
        writer.write_struct_end()
    }

    fn read(reader: &mut dyn ProtocolReader) -> Result<Self, CodecError> {
        let mut args = AddArgs::default();
        reader.read_struct_begin()?;
        while let Some((id, ftype)) = reader.read_field_begin()? {
            match (id, ftype) {
                (1, FieldType::I32) => args.a = reader.read_i32()?,
                (2, FieldType::I32) => args.b = reader.read_i32()?,
                (_, other) => reader.skip(other)?,
            }
            reader.read_field_end()?;
        }
        reader.read_struct_end()?;
        Ok(args)
    }
}

pub struct AddReply;

impl ReplyStruct for AddReply {
    type Ok = i32;
    type Exception = NoException;

    fn read_field(
        id: i16,
        ftype: FieldType,
        reader: &mut dyn ProtocolReader,
    ) -> Result<Option<ReplyField<i32, NoException>>, CodecError> {
        match (id, ftype) {
            (0, FieldType::I32) => Ok(Some(ReplyField::Ok(reader.read_i32()?))),
            _ => Ok(None),
        }
    }

    fn void() -> Option<i32> {
        None
    }
}

// ===== divide =====

pub struct Divide;

impl Method for Divide {
    type Service = Calculator;
    const NAME: &'static str = "divide";
    type Args = DivideArgs;
    type Reply = DivideReply;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DivideArgs {
    pub numerator: i32,
    pub denominator: i32,
}

impl WireStruct for DivideArgs {
    fn write(&self, writer: &mut dyn ProtocolWriter) -> Result<(), CodecError> {
        writer.write_struct_begin()?;
        writer.write_field_begin(1, FieldType::I32)?;
        writer.write_i32(self.numerator)?;
        writer.write_field_end()?;
        writer.write_field_begin(2, FieldType::I32)?;
        writer.write_i32(self.denominator)?;
        writer.write_field_end()?;
        writer.write_stop()?;
        writer.write_struct_end()
    }

    fn read(reader: &mut dyn ProtocolReader) -> Result<Self, CodecError> {
        let mut args = DivideArgs::default();
        reader.read_struct_begin()?;
        while let Some((id, ftype)) = reader.read_field_begin()? {
            match (id, ftype) {
                (1, FieldType::I32) => args.numerator = reader.read_i32()?,
                (2, FieldType::I32) => args.denominator = reader.read_i32()?,
                (_, other) => reader.skip(other)?,
            }
            reader.read_field_end()?;
        }
        reader.read_struct_end()?;
        Ok(args)
    }
}

/// Declared exception raised when the denominator is zero
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct DivByZero {
    pub message: String,
}

impl WireStruct for DivByZero {
    fn write(&self, writer: &mut dyn ProtocolWriter) -> Result<(), CodecError> {
        writer.write_struct_begin()?;
        writer.write_field_begin(1, FieldType::Binary)?;
        writer.write_string(&self.message)?;
        writer.write_field_end()?;
        writer.write_stop()?;
        writer.write_struct_end()
    }

    fn read(reader: &mut dyn ProtocolReader) -> Result<Self, CodecError> {
        let mut message = String::new();
        reader.read_struct_begin()?;
        while let Some((id, ftype)) = reader.read_field_begin()? {
            match (id, ftype) {
                (1, FieldType::Binary) => message = reader.read_string()?,
                (_, other) => reader.skip(other)?,
            }
            reader.read_field_end()?;
        }
        reader.read_struct_end()?;
        Ok(DivByZero { message })
    }
}

/// Every exception the divide method declares
#[derive(Debug, Error)]
pub enum DivideException {
    #[error(transparent)]
    DivByZero(#[from] DivByZero),
}

pub struct DivideReply;

impl ReplyStruct for DivideReply {
    type Ok = i32;
    type Exception = DivideException;

    fn read_field(
        id: i16,
        ftype: FieldType,
        reader: &mut dyn ProtocolReader,
    ) -> Result<Option<ReplyField<i32, DivideException>>, CodecError> {
        match (id, ftype) {
            (0, FieldType::I32) => Ok(Some(ReplyField::Ok(reader.read_i32()?))),
            (1, FieldType::Struct) => Ok(Some(ReplyField::Exception(
                DivByZero::read(reader)?.into(),
            ))),
            _ => Ok(None),
        }
    }

    fn void() -> Option<i32> {
        None
    }
}

// ===== ping =====

pub struct Ping;

impl Method for Ping {
    type Service = Calculator;
    const NAME: &'static str = "ping";
    type Args = PingArgs;
    type Reply = PingReply;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PingArgs;

impl WireStruct for PingArgs {
    fn write(&self, writer: &mut dyn ProtocolWriter) -> Result<(), CodecError> {
        writer.write_struct_begin()?;
        writer.write_stop()?;
        writer.write_struct_end()
    }

    fn read(reader: &mut dyn ProtocolReader) -> Result<Self, CodecError> {
        reader.read_struct_begin()?;
        while let Some((_, ftype)) = reader.read_field_begin()? {
            reader.skip(ftype)?;
            reader.read_field_end()?;
        }
        reader.read_struct_end()?;
        Ok(PingArgs)
    }
}

pub struct PingReply;

impl ReplyStruct for PingReply {
    type Ok = ();
    type Exception = NoException;

    fn read_field(
        _id: i16,
        _ftype: FieldType,
        _reader: &mut dyn ProtocolReader,
    ) -> Result<Option<ReplyField<(), NoException>>, CodecError> {
        Ok(None)
    }

    fn void() -> Option<()> {
        Some(())
    }
}

// ===== logUsage (one-way) =====

pub struct LogUsage;

impl Method for LogUsage {
    type Service = Calculator;
    const NAME: &'static str = "logUsage";
    type Args = LogUsageArgs;
    type Reply = LogUsageReply;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogUsageArgs {
    pub event: String,
}

impl WireStruct for LogUsageArgs {
    fn write(&self, writer: &mut dyn ProtocolWriter) -> Result<(), CodecError> {
        writer.write_struct_begin()?;
        writer.write_field_begin(1, FieldType::Binary)?;
        writer.write_string(&self.event)?;
        writer.write_field_end()?;
        writer.write_stop()?;
        writer.write_struct_end()
    }

    fn read(reader: &mut dyn ProtocolReader) -> Result<Self, CodecError> {
        let mut args = LogUsageArgs::default();
        reader.read_struct_begin()?;
        while let Some((id, ftype)) = reader.read_field_begin()? {
            match (id, ftype) {
                (1, FieldType::Binary) => args.event = reader.read_string()?,
                (_, other) => reader.skip(other)?,
            }
            reader.read_field_end()?;
        }
        reader.read_struct_end()?;
        Ok(args)
    }
}

pub struct LogUsageReply;

impl ReplyStruct for LogUsageReply {
    type Ok = ();
    type Exception = NoException;

    fn read_field(
        _id: i16,
        _ftype: FieldType,
        _reader: &mut dyn ProtocolReader,
    ) -> Result<Option<ReplyField<(), NoException>>, CodecError> {
        Ok(None)
    }

    fn void() -> Option<()> {
        Some(())
    }
}

// ===== typed facade =====

/// Convenience wrapper exposing one snake_case method per RPC
pub struct CalculatorClient {
    inner: RpcClient<Calculator>,
}

impl CalculatorClient {
    pub fn with_config(config: ClientConfig) -> courier_client::Result<Self> {
        Ok(Self {
            inner: RpcClient::with_config(config)?,
        })
    }

    pub async fn add(&self, a: i32, b: i32) -> courier_client::Result<i32> {
        self.inner.call::<Add>(&AddArgs { a, b }).await
    }

    pub async fn divide(
        &self,
        numerator: i32,
        denominator: i32,
    ) -> courier_client::Result<i32, DivideException> {
        self.inner
            .call::<Divide>(&DivideArgs {
                numerator,
                denominator,
            })
            .await
    }

    pub async fn ping(&self) -> courier_client::Result<()> {
        self.inner.call::<Ping>(&PingArgs).await
    }

    pub async fn log_usage(&self, event: &str) -> courier_client::Result<()> {
        self.inner
            .call::<LogUsage>(&LogUsageArgs {
                event: event.to_string(),
            })
            .await
    }
}
