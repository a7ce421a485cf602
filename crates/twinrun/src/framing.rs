//! # Framing
//!
//! Lays call and result envelopes onto transport messages, and back.
//!
//! In `Envelope` framing the bodies carry whole envelopes. In `Headers`
//! framing the call metadata and the result status move into headers: the
//! request body is the argument list and the response body is the return
//! value, or the error message on failure. Both sides rebuild the same
//! envelopes, so the dispatcher and interceptor never see the difference.

use crate::config::Framing;
use crate::transport::Message;

use twinrpc::CallEnvelope;
use twinrpc::Error;
use twinrpc::Outcome;
use twinrpc::Result;
use twinrpc::ResultEnvelope;
use twinrpc::Value;
use twinrpc::codec;

pub const TARGET_HEADER: &str = "x-twin-target";
pub const METHOD_HEADER: &str = "x-twin-method";
pub const CREDENTIAL_HEADER: &str = "x-twin-credential";
pub const SUCCESS_HEADER: &str = "x-twin-success";
pub const ERROR_TYPE_HEADER: &str = "x-twin-error-type";
pub const ELAPSED_HEADER: &str = "x-twin-elapsed-ms";

pub fn encode_call(call: &CallEnvelope, framing: Framing) -> Result<Message> {
    match framing {
        Framing::Envelope => Ok(Message::new(call.encode()?)),
        Framing::Headers => Ok(Message::new(codec::encode_values(&call.args)?)
            .with_header(TARGET_HEADER, call.target.as_str())
            .with_header(METHOD_HEADER, call.method.as_str())
            .with_header(CREDENTIAL_HEADER, call.credential.as_str())),
    }
}

/// Rebuilds a call. Absent headers read as empty strings.
pub fn decode_call(message: &Message, framing: Framing) -> Result<CallEnvelope> {
    match framing {
        Framing::Envelope => CallEnvelope::decode(&message.body),
        Framing::Headers => Ok(CallEnvelope {
            target: message.header(TARGET_HEADER).unwrap_or_default().to_string(),
            method: message.header(METHOD_HEADER).unwrap_or_default().to_string(),
            args: codec::decode_values(&message.body)?,
            credential: message.header(CREDENTIAL_HEADER).unwrap_or_default().to_string(),
        }),
    }
}

pub fn encode_result(result: &ResultEnvelope, framing: Framing) -> Result<Message> {
    if framing == Framing::Envelope {
        return Ok(Message::new(result.encode()?));
    }

    let elapsed = result.elapsed_ms.to_string();
    match &result.outcome {
        Outcome::Success(value) => Ok(Message::new(codec::to_bytes(value)?)
            .with_header(SUCCESS_HEADER, "true")
            .with_header(ELAPSED_HEADER, elapsed)),
        Outcome::Failure { message, error_type } => {
            let body = match message {
                Some(msg) => Value::Str(msg.clone()),
                None => Value::Null,
            };
            let mut reply = Message::new(codec::to_bytes(&body)?)
                .with_header(SUCCESS_HEADER, "false")
                .with_header(ELAPSED_HEADER, elapsed);
            if let Some(error_type) = error_type {
                reply = reply.with_header(ERROR_TYPE_HEADER, error_type.as_str());
            }
            Ok(reply)
        }
    }
}

pub fn decode_result(message: &Message, framing: Framing) -> Result<ResultEnvelope> {
    if framing == Framing::Envelope {
        return ResultEnvelope::decode(&message.body);
    }

    let success = match message.header(SUCCESS_HEADER) {
        Some("true") => true,
        Some("false") => false,
        Some(other) => {
            return Err(Error::ProtocolViolation(format!("bad {} header `{}`", SUCCESS_HEADER, other)));
        }
        None => return Err(Error::ProtocolViolation(format!("Missing {}", SUCCESS_HEADER))),
    };
    let elapsed_ms = message
        .header(ELAPSED_HEADER)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let body = codec::from_bytes(&message.body)?;
    if success {
        return Ok(ResultEnvelope::success(body, elapsed_ms));
    }
    let text = match body {
        Value::Null => None,
        Value::Str(s) => Some(s),
        other => return Err(other.mismatch("String")),
    };
    let error_type = message.header(ERROR_TYPE_HEADER).map(str::to_string);
    Ok(ResultEnvelope::failure(text, error_type, elapsed_ms))
}
