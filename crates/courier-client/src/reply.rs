//! Decoding of result envelopes.
//!
//! A reply body is a struct whose field 0 carries the success value and
//! whose other fields carry the method's declared exceptions. A valid
//! reply sets at most one of them; an empty reply is a success only for
//! void methods.

use courier_protocol::{
    from_bytes, BinaryReader, CodecError, CompactReader, Encoding, Fault, FieldType, JsonReader,
    ProtocolReader,
};

use crate::error::{BadResponse, BadResponseKind, Error};

/// One recognized field of a result envelope.
pub enum ReplyField<T, E> {
    Ok(T),
    Exception(E),
}

/// The generated result envelope for one RPC.
///
/// `read_field` decodes one field the envelope declares and returns
/// `None` for everything else; unrecognized fields, including fields
/// with the right id but the wrong wire type, are skipped by the
/// decode loop rather than failing the call.
pub trait ReplyStruct {
    type Ok;
    type Exception;

    fn read_field(
        id: i16,
        ftype: FieldType,
        reader: &mut dyn ProtocolReader,
    ) -> Result<Option<ReplyField<Self::Ok, Self::Exception>>, CodecError>;

    /// The success value of an empty envelope, or `None` when the
    /// method returns a value and an empty envelope is malformed.
    fn void() -> Option<Self::Ok>;
}

/// Interpret a 200 response body as the method's result.
pub fn decode_reply<R: ReplyStruct>(
    rpc: &'static str,
    bytes: &[u8],
    encoding: Encoding,
) -> Result<R::Ok, Error<R::Exception>> {
    let mut fields = match scan::<R>(bytes, encoding) {
        Ok(fields) => fields,
        Err(source) => return Err(bad(rpc, BadResponseKind::Decode(source))),
    };
    if fields.len() > 1 {
        return Err(bad(rpc, BadResponseKind::MultipleFields(fields.len())));
    }
    match fields.pop() {
        Some(ReplyField::Ok(value)) => Ok(value),
        Some(ReplyField::Exception(exception)) => Err(Error::Exception(exception)),
        None => match R::void() {
            Some(ok) => Ok(ok),
            None => Err(bad(rpc, BadResponseKind::MissingResult)),
        },
    }
}

/// Decode the fault struct carried by a non-200 response. An
/// undecodable body surfaces as a bad response, not a made-up fault.
pub fn decode_fault(
    rpc: &'static str,
    bytes: &[u8],
    encoding: Encoding,
) -> Result<Fault, BadResponse> {
    from_bytes::<Fault>(bytes, encoding).map_err(|source| BadResponse {
        rpc,
        kind: BadResponseKind::Decode(source),
    })
}

fn bad<E>(rpc: &'static str, kind: BadResponseKind) -> Error<E> {
    Error::BadResponse(BadResponse { rpc, kind })
}

fn scan<R: ReplyStruct>(
    bytes: &[u8],
    encoding: Encoding,
) -> Result<Vec<ReplyField<R::Ok, R::Exception>>, CodecError> {
    match encoding {
        Encoding::Binary => scan_with::<R>(&mut BinaryReader::new(bytes)),
        Encoding::Compact => scan_with::<R>(&mut CompactReader::new(bytes)),
        Encoding::Json => scan_with::<R>(&mut JsonReader::new(bytes)?),
    }
}

fn scan_with<R: ReplyStruct>(
    reader: &mut dyn ProtocolReader,
) -> Result<Vec<ReplyField<R::Ok, R::Exception>>, CodecError> {
    let mut fields = Vec::new();
    reader.read_struct_begin()?;
    while let Some((id, ftype)) = reader.read_field_begin()? {
        match R::read_field(id, ftype, reader)? {
            Some(field) => fields.push(field),
            None => reader.skip(ftype)?,
        }
        reader.read_field_end()?;
    }
    reader.read_struct_end()?;
    Ok(fields)
}
