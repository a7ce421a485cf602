//! # Codec
//!
//! The translation layer between `Value` and the `twinpack` wire format, plus
//! the typed `encode`/`decode` entry points built on `Wire` and their
//! stream counterparts `encode_to`/`decode_from`.
//!
//! ## Invariants
//! - **Recursion Safety**: All recursive operations are bounded by `MAX_RECURSION_DEPTH`.
//! - **Determinism**: A value encodes to the same bytes every time; maps and
//!   records keep their order.
//! - **Whole input**: Decoding a top-level value must consume every byte.

use crate::error::Error;
use crate::error::Result;
use crate::value::Record;
use crate::value::Value;
use crate::wire::Wire;

use twinpack::Decoder;
use twinpack::Encoder;
use twinpack::Error as PackError;
use twinpack::Tag;

use std::io::Read;
use std::io::Write;

/// The maximum nesting depth for Values before failing.
pub const MAX_RECURSION_DEPTH: usize = 64;

/// Encodes a `Value` into the encoder stream.
///
/// # Errors
/// Returns `Error::RecursionLimitExceeded` if the value is too deeply nested.
pub fn encode_value(enc: &mut Encoder, val: &Value) -> Result<()> {
    encode_value_impl(enc, val, 0)
}

fn encode_value_impl(enc: &mut Encoder, val: &Value, depth: usize) -> Result<()> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::RecursionLimitExceeded);
    }

    match val {
        Value::Null => enc.null()?,
        Value::Bool(b) => enc.bool(*b)?,
        Value::Byte(v) => enc.i8(*v)?,
        Value::Short(v) => enc.i16(*v)?,
        Value::Int(v) => enc.i32(*v)?,
        Value::Long(v) => enc.i64(*v)?,
        Value::Float(v) => enc.f32(*v)?,
        Value::Double(v) => enc.f64(*v)?,
        Value::Char(v) => enc.char(*v)?,
        Value::Str(v) => enc.str(v)?,
        Value::Bytes(v) => enc.bytes(v)?,
        Value::List(items) => {
            enc.list_begin()?;
            for item in items {
                encode_value_impl(enc, item, depth + 1)?;
            }
            enc.list_end()?;
        }
        Value::Map(entries) => {
            enc.map_begin()?;
            for (k, v) in entries {
                encode_value_impl(enc, k, depth + 1)?;
                encode_value_impl(enc, v, depth + 1)?;
            }
            enc.map_end()?;
        }
        Value::Record(record) => {
            enc.record_begin(&record.class)?;
            for (name, value) in &record.fields {
                enc.field_begin(name)?;
                encode_value_impl(enc, value, depth + 1)?;
                enc.field_end()?;
            }
            enc.record_end()?;
        }
    }
    Ok(())
}

/// Decodes the next `Value` from the stream.
///
/// # Errors
/// Returns `Error::RecursionLimitExceeded` if nesting exceeds the limit.
pub fn decode_value(dec: &mut Decoder) -> Result<Value> {
    decode_value_impl(dec, 0)
}

fn decode_value_impl(dec: &mut Decoder, depth: usize) -> Result<Value> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::RecursionLimitExceeded);
    }

    let value = match dec.peek_tag()? {
        Tag::Null => { dec.null()?; Value::Null }
        Tag::BoolTrue | Tag::BoolFalse => Value::Bool(dec.bool()?),
        Tag::I8 => Value::Byte(dec.i8()?),
        Tag::I16 => Value::Short(dec.i16()?),
        Tag::I32 => Value::Int(dec.i32()?),
        Tag::I64 => Value::Long(dec.i64()?),
        Tag::F32 => Value::Float(dec.f32()?),
        Tag::F64 => Value::Double(dec.f64()?),
        Tag::Char => Value::Char(dec.char()?),
        Tag::Str => Value::Str(dec.str()?.to_string()),
        Tag::Bytes => Value::Bytes(dec.bytes()?.to_vec()),
        Tag::List => {
            let mut iter = dec.list()?;
            let mut items = Vec::new();
            while let Some(mut item) = iter.next()? {
                items.push(decode_value_impl(&mut item, depth + 1)?);
            }
            Value::List(items)
        }
        Tag::Map => {
            let mut iter = dec.map()?;
            let mut entries = Vec::new();
            while let Some((mut k, mut v)) = iter.next()? {
                let key = decode_value_impl(&mut k, depth + 1)?;
                let val = decode_value_impl(&mut v, depth + 1)?;
                entries.push((key, val));
            }
            Value::Map(entries)
        }
        Tag::Record => {
            let (class, mut iter) = dec.record()?;
            let mut record = Record::new(class);
            while let Some((name, mut v)) = iter.next()? {
                record.fields.push((name.to_string(), decode_value_impl(&mut v, depth + 1)?));
            }
            Value::Record(record)
        }
        Tag::Field => {
            return Err(Error::ProtocolViolation("Field outside of a record".into()));
        }
    };
    Ok(value)
}

/// Encodes one dynamic value into a standalone buffer.
pub fn to_bytes(val: &Value) -> Result<Vec<u8>> {
    let mut enc = Encoder::new();
    encode_value(&mut enc, val)?;
    Ok(enc.into_bytes()?)
}

/// Decodes a standalone buffer holding exactly one dynamic value.
///
/// # Errors
/// Returns `Error::EmptyInput` for an empty buffer and
/// `Error::ProtocolViolation` if bytes remain after the value.
pub fn from_bytes(bytes: &[u8]) -> Result<Value> {
    if bytes.is_empty() {
        return Err(Error::EmptyInput);
    }
    let mut dec = Decoder::new(bytes);
    let value = decode_value(&mut dec)?;
    if !dec.is_empty() {
        return Err(Error::ProtocolViolation(format!("{} trailing bytes", dec.remaining())));
    }
    Ok(value)
}

/// Encodes a typed value.
pub fn encode<T: Wire>(value: &T) -> Result<Vec<u8>> {
    to_bytes(&value.to_value())
}

/// Decodes a typed value, failing if the bytes do not hold a `T`.
pub fn decode<T: Wire>(bytes: &[u8]) -> Result<T> {
    T::from_value(from_bytes(bytes)?)
}

/// Encodes a homogeneous sequence as a single list.
pub fn encode_list<T: Wire>(items: &[T]) -> Result<Vec<u8>> {
    to_bytes(&Value::List(items.iter().map(Wire::to_value).collect()))
}

/// Decodes a list produced by `encode_list`.
pub fn decode_list<T: Wire>(bytes: &[u8]) -> Result<Vec<T>> {
    decode_values(bytes)?.into_iter().map(T::from_value).collect()
}

/// Writes one typed value to `writer` as a length-prefixed frame.
///
/// Frames are `[len: u32 LE][twinpack bytes]`, so several values can share
/// one stream and each is read back with `decode_from`.
pub fn encode_to<T: Wire, W: Write>(value: &T, writer: &mut W) -> Result<()> {
    let bytes = encode(value)?;
    let len = u32::try_from(bytes.len()).map_err(|_| PackError::BlobTooLarge(bytes.len()))?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Reads one frame written by `encode_to` and decodes it as a `T`.
///
/// # Errors
/// A stream that ends inside a frame gives `Error::Pack(UnexpectedEnd)`.
pub fn decode_from<T: Wire, R: Read>(reader: &mut R) -> Result<T> {
    let mut header = [0u8; 4];
    reader.read_exact(&mut header)?;
    let len = u32::from_le_bytes(header) as u64;

    // never trust the header for the allocation size
    let mut bytes = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut bytes)?;
    if (bytes.len() as u64) < len {
        return Err(PackError::UnexpectedEnd.into());
    }
    decode(&bytes)
}

/// Encodes a heterogeneous argument vector.
pub fn encode_values(values: &[Value]) -> Result<Vec<u8>> {
    let mut enc = Encoder::new();
    encode_value_list(&mut enc, values)?;
    Ok(enc.into_bytes()?)
}

/// Decodes a heterogeneous argument vector.
pub fn decode_values(bytes: &[u8]) -> Result<Vec<Value>> {
    match from_bytes(bytes)? {
        Value::List(items) => Ok(items),
        other => Err(other.mismatch("List")),
    }
}

pub(crate) fn encode_value_list(enc: &mut Encoder, values: &[Value]) -> Result<()> {
    enc.list_begin()?;
    for val in values {
        encode_value_impl(enc, val, 1)?;
    }
    enc.list_end()?;
    Ok(())
}
