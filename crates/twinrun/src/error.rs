//! # Error Definitions
//!
//! Two layers of failure live here.
//!
//! - `Fault` is what a target method raises. It crosses the wire as a type
//!   identifier plus a message and is rebuilt on the other side.
//! - `Error` is what a caller of an intercepted method observes.
//!
//! Transport failures never appear in either: they are absorbed by falling
//! back to the local call.
//!
//! ## Reconstruction
//!
//! A failure envelope names its error by string. Known names, registered
//! custom names and the common `java.lang.*Exception` spellings map back to
//! the same `FaultKind`; anything else degrades to `Generic` and keeps only
//! the message.

use dashmap::DashSet;

use std::fmt;
use std::sync::LazyLock;

/// The kind of a method failure, with a stable type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FaultKind {
    IllegalArgument,
    IllegalState,
    UnsupportedOperation,
    NullPointer,
    IndexOutOfBounds,
    Arithmetic,
    Timeout,
    /// The method panicked.
    Panic,
    /// The call envelope was malformed.
    Validation,
    /// The credential did not match.
    Authentication,
    /// The target or method could not be found.
    Resolution,
    /// A value could not be encoded or decoded.
    Codec,
    /// A host-defined kind, registered with `register_fault_kind`.
    Custom(String),
    /// Anything that could not be reconstructed more precisely.
    Generic,
}

static CUSTOM_KINDS: LazyLock<DashSet<String>> = LazyLock::new(DashSet::new);

/// Makes `name` reconstructible as `FaultKind::Custom(name)` in this process.
pub fn register_fault_kind(name: impl Into<String>) {
    CUSTOM_KINDS.insert(name.into());
}

impl FaultKind {
    /// The identifier carried in a failure envelope.
    pub fn as_type_name(&self) -> &str {
        match self {
            FaultKind::IllegalArgument => "IllegalArgument",
            FaultKind::IllegalState => "IllegalState",
            FaultKind::UnsupportedOperation => "UnsupportedOperation",
            FaultKind::NullPointer => "NullPointer",
            FaultKind::IndexOutOfBounds => "IndexOutOfBounds",
            FaultKind::Arithmetic => "Arithmetic",
            FaultKind::Timeout => "Timeout",
            FaultKind::Panic => "Panic",
            FaultKind::Validation => "ValidationError",
            FaultKind::Authentication => "AuthenticationError",
            FaultKind::Resolution => "ResolutionError",
            FaultKind::Codec => "CodecError",
            FaultKind::Custom(name) => name,
            FaultKind::Generic => "RuntimeError",
        }
    }

    /// Maps an identifier back to a kind, or `None` if it is not constructible here.
    pub fn from_type_name(name: &str) -> Option<Self> {
        if CUSTOM_KINDS.contains(name) {
            return Some(FaultKind::Custom(name.to_string()));
        }

        let short = name.strip_prefix("java.lang.").unwrap_or(name);
        let short = short.strip_suffix("Exception").unwrap_or(short);
        Some(match short {
            "IllegalArgument" => FaultKind::IllegalArgument,
            "IllegalState" => FaultKind::IllegalState,
            "UnsupportedOperation" => FaultKind::UnsupportedOperation,
            "NullPointer" => FaultKind::NullPointer,
            "IndexOutOfBounds" | "ArrayIndexOutOfBounds" | "StringIndexOutOfBounds" => {
                FaultKind::IndexOutOfBounds
            }
            "Arithmetic" => FaultKind::Arithmetic,
            "Timeout" => FaultKind::Timeout,
            "Panic" => FaultKind::Panic,
            "ValidationError" => FaultKind::Validation,
            "AuthenticationError" => FaultKind::Authentication,
            "ResolutionError" => FaultKind::Resolution,
            "CodecError" => FaultKind::Codec,
            "RuntimeError" | "Runtime" => FaultKind::Generic,
            _ => return None,
        })
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_type_name())
    }
}

/// A failure raised by a target method, locally or on the remote peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub kind: FaultKind,
    pub message: Option<String>,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self { kind, message: Some(message.into()) }
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::new(FaultKind::IllegalArgument, message)
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::new(FaultKind::IllegalState, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(FaultKind::UnsupportedOperation, message)
    }

    /// Rebuilds a fault from the identifier and message of a failure envelope.
    ///
    /// Unknown or absent identifiers give a `Generic` fault with the same message.
    pub fn reconstruct(type_name: Option<&str>, message: Option<String>) -> Self {
        let kind = type_name
            .and_then(FaultKind::from_type_name)
            .unwrap_or(FaultKind::Generic);
        Self { kind, message }
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {}", self.kind, msg),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Fault {}

/// What a caller of an intercepted method can observe.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Interception is misconfigured; fatal and never retried.
    Configuration(String),
    /// The method raised a fault, locally or on the remote peer.
    Fault(Fault),
    /// A response arrived but could not be decoded; non-retriable.
    Codec(twinrpc::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Self::Fault(fault) => write!(f, "{}", fault),
            Self::Codec(e) => write!(f, "Codec error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fault(fault) => Some(fault),
            Self::Codec(e) => Some(e),
            Self::Configuration(_) => None,
        }
    }
}

impl From<Fault> for Error {
    fn from(f: Fault) -> Self { Self::Fault(f) }
}

impl From<twinrpc::Error> for Error {
    fn from(e: twinrpc::Error) -> Self { Self::Codec(e) }
}

pub type Result<T> = std::result::Result<T, Error>;
