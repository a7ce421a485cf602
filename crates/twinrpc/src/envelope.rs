//! # Envelopes
//!
//! The two message shapes of the protocol: a `CallEnvelope` travels to the
//! remote peer, a `ResultEnvelope` comes back.
//!
//! ## Invariants
//! - **Panic Safety**: All decoding paths return `Result`, never panicking on unknown data.
//! - **Forward Compatibility**: Unknown fields are safely skipped.
//! - **Lenient on read**: a decoded call may carry an empty target or method;
//!   rejecting it is the dispatcher's job, so the peer still gets an answer.

use crate::codec::decode_value;
use crate::codec::encode_value;
use crate::codec::encode_value_list;
use crate::error::Error;
use crate::error::Result;
use crate::value::Value;

use twinpack::Decoder;
use twinpack::Encoder;

const CALL_CLASS: &str = "Call";
const RESULT_CLASS: &str = "Result";

/// One outgoing method call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallEnvelope {
    pub target: String,
    pub method: String,
    /// Positional arguments, in declaration order.
    pub args: Vec<Value>,
    pub credential: String,
}

impl CallEnvelope {
    /// Builds an envelope for transmission.
    ///
    /// # Errors
    /// Returns `Error::InvalidEnvelope` if `target` or `method` is empty.
    pub fn new(
        target: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
        credential: impl Into<String>,
    ) -> Result<Self> {
        let envelope = Self {
            target: target.into(),
            method: method.into(),
            args,
            credential: credential.into(),
        };
        if envelope.target.is_empty() {
            return Err(Error::InvalidEnvelope("target identifier is empty"));
        }
        if envelope.method.is_empty() {
            return Err(Error::InvalidEnvelope("method name is empty"));
        }
        Ok(envelope)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        enc.record_begin(CALL_CLASS)?;
        write_str(&mut enc, "target", &self.target)?;
        write_str(&mut enc, "method", &self.method)?;
        enc.field_begin("args")?;
        encode_value_list(&mut enc, &self.args)?;
        enc.field_end()?;
        write_str(&mut enc, "credential", &self.credential)?;
        enc.record_end()?;
        Ok(enc.into_bytes()?)
    }

    /// Decodes a call. A missing credential decodes as empty.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut fields = open_record(bytes, CALL_CLASS)?;
        let mut target = None;
        let mut method = None;
        let mut args = None;
        let mut credential = None;

        while let Some((name, mut val)) = fields.next()? {
            match name {
                "target" => target = Some(val.str()?.to_string()),
                "method" => method = Some(val.str()?.to_string()),
                "args" => match decode_value(&mut val)? {
                    Value::List(items) => args = Some(items),
                    other => return Err(other.mismatch("List")),
                },
                "credential" => credential = Some(val.str()?.to_string()),
                _ => {}
            }
        }

        Ok(Self {
            target: target.ok_or(Error::ProtocolViolation("Missing target".into()))?,
            method: method.ok_or(Error::ProtocolViolation("Missing method".into()))?,
            args: args.ok_or(Error::ProtocolViolation("Missing args".into()))?,
            credential: credential.unwrap_or_default(),
        })
    }
}

/// What the remote call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Failure {
        message: Option<String>,
        error_type: Option<String>,
    },
}

/// The answer to one `CallEnvelope`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEnvelope {
    pub outcome: Outcome,
    pub elapsed_ms: u64,
}

impl ResultEnvelope {
    pub fn success(value: Value, elapsed_ms: u64) -> Self {
        Self { outcome: Outcome::Success(value), elapsed_ms }
    }

    pub fn failure(
        message: Option<String>,
        error_type: Option<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self { outcome: Outcome::Failure { message, error_type }, elapsed_ms }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// The returned value, for successful outcomes.
    pub fn value(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Success(v) => Some(v),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        enc.record_begin(RESULT_CLASS)?;

        enc.field_begin("success")?;
        enc.bool(self.is_success())?;
        enc.field_end()?;

        match &self.outcome {
            Outcome::Success(value) => {
                enc.field_begin("value")?;
                encode_value(&mut enc, value)?;
                enc.field_end()?;
            }
            Outcome::Failure { message, error_type } => {
                write_opt_str(&mut enc, "error_message", message.as_deref())?;
                write_opt_str(&mut enc, "error_type", error_type.as_deref())?;
            }
        }

        enc.field_begin("elapsed_ms")?;
        enc.i64(i64::try_from(self.elapsed_ms).unwrap_or(i64::MAX))?;
        enc.field_end()?;

        enc.record_end()?;
        Ok(enc.into_bytes()?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut fields = open_record(bytes, RESULT_CLASS)?;
        let mut success = None;
        let mut value = None;
        let mut message = None;
        let mut error_type = None;
        let mut elapsed = None;

        while let Some((name, mut val)) = fields.next()? {
            match name {
                "success" => success = Some(val.bool()?),
                "value" => value = Some(decode_value(&mut val)?),
                "error_message" => message = read_opt_str(&mut val)?,
                "error_type" => error_type = read_opt_str(&mut val)?,
                "elapsed_ms" => elapsed = Some(val.i64()?),
                _ => {}
            }
        }

        let success = success.ok_or(Error::ProtocolViolation("Missing success".into()))?;
        let elapsed = elapsed.ok_or(Error::ProtocolViolation("Missing elapsed_ms".into()))?;
        let elapsed_ms = u64::try_from(elapsed).unwrap_or(0);

        let outcome = if success {
            Outcome::Success(value.ok_or(Error::ProtocolViolation("Missing value".into()))?)
        } else {
            Outcome::Failure { message, error_type }
        };
        Ok(Self { outcome, elapsed_ms })
    }
}

fn open_record<'a>(bytes: &'a [u8], class: &str) -> Result<twinpack::FieldIter<'a>> {
    if bytes.is_empty() {
        return Err(Error::EmptyInput);
    }
    let mut dec = Decoder::new(bytes);
    let (found, fields) = dec.record()?;
    if found != class {
        return Err(Error::ProtocolViolation(format!("expected {} record, found {}", class, found)));
    }
    if !dec.is_empty() {
        return Err(Error::ProtocolViolation(format!("{} trailing bytes", dec.remaining())));
    }
    Ok(fields)
}

// Helpers for Field construction
fn write_str(enc: &mut Encoder, name: &str, val: &str) -> Result<()> {
    enc.field_begin(name)?;
    enc.str(val)?;
    enc.field_end()?;
    Ok(())
}

fn write_opt_str(enc: &mut Encoder, name: &str, val: Option<&str>) -> Result<()> {
    enc.field_begin(name)?;
    match val {
        Some(s) => enc.str(s)?,
        None => enc.null()?,
    }
    enc.field_end()?;
    Ok(())
}

fn read_opt_str(dec: &mut Decoder) -> Result<Option<String>> {
    if dec.peek_null() {
        dec.null()?;
        return Ok(None);
    }
    Ok(Some(dec.str()?.to_string()))
}
