//! # Error Definitions
//!
//! Failures of the codec and envelope layer. These are local, non-retriable
//! errors: the bytes were empty or malformed, did not fit the expected type,
//! or could not be moved through a stream.

use twinpack::Error as PackError;

/// Operational failures within the codec itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The underlying twinpack layer failed (truncated input, bad tag, scope misuse).
    Pack(PackError),
    /// There were no bytes to decode.
    EmptyInput,
    /// The decoded value does not have the shape the caller asked for.
    TypeMismatch { expected: String, found: String },
    /// Reading from or writing to a byte stream failed.
    Io { kind: std::io::ErrorKind, message: String },
    /// The message structure was malformed (wrong envelope class, trailing bytes).
    ProtocolViolation(String),
    /// An envelope was built with an empty target or method name.
    InvalidEnvelope(&'static str),
    /// The nested depth of the value exceeded the safety limit.
    RecursionLimitExceeded,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Pack(e) => write!(f, "wire format error: {}", e),
            Error::EmptyInput => write!(f, "cannot decode empty input"),
            Error::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            Error::Io { message, .. } => write!(f, "stream error: {}", message),
            Error::ProtocolViolation(msg) => write!(f, "protocol violation: {}", msg),
            Error::InvalidEnvelope(what) => write!(f, "invalid envelope: {}", what),
            Error::RecursionLimitExceeded => write!(f, "value nesting exceeds the recursion limit"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Pack(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PackError> for Error {
    fn from(e: PackError) -> Self { Self::Pack(e) }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return Self::Pack(PackError::UnexpectedEnd);
        }
        Self::Io { kind: e.kind(), message: e.to_string() }
    }
}

/// A specialized Result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;
