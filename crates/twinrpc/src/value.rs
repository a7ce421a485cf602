//! # Dynamic Values
//!
//! `Value` is the self-describing form every argument and return value takes
//! on the wire. `TypeRef` is the declared counterpart: what a method parameter
//! says it accepts.
//!
//! ## Invariants
//! - **Boxed at runtime**: a numeric `Value` always reports the boxed form of
//!   its kind (`Value::Int(5)` is a `Boxed(Int)`); only declarations may be
//!   `Primitive`.
//! - **Ordered records**: record fields keep schema order, maps keep insertion order.

use crate::error::Error;
use crate::error::Result;

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// Key/value pairs in insertion order.
    Map(Vec<(Value, Value)>),
    Record(Record),
}

impl Value {
    /// The runtime type of this value, or `None` for `Null`.
    pub fn runtime_type(&self) -> Option<TypeRef> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => TypeRef::Boxed(Primitive::Bool),
            Value::Byte(_) => TypeRef::Boxed(Primitive::Byte),
            Value::Short(_) => TypeRef::Boxed(Primitive::Short),
            Value::Int(_) => TypeRef::Boxed(Primitive::Int),
            Value::Long(_) => TypeRef::Boxed(Primitive::Long),
            Value::Float(_) => TypeRef::Boxed(Primitive::Float),
            Value::Double(_) => TypeRef::Boxed(Primitive::Double),
            Value::Char(_) => TypeRef::Boxed(Primitive::Char),
            Value::Str(_) => TypeRef::Str,
            Value::Bytes(_) => TypeRef::Bytes,
            Value::List(_) => TypeRef::List,
            Value::Map(_) => TypeRef::Map,
            Value::Record(r) => TypeRef::Class(r.class.clone()),
        })
    }

    /// A short human-readable name for the runtime type, used in error messages.
    pub fn type_name(&self) -> String {
        match self.runtime_type() {
            Some(ty) => ty.to_string(),
            None => "null".to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Builds the mismatch error for a value that was not the `expected` shape.
    pub fn mismatch(&self, expected: impl Into<String>) -> Error {
        Error::TypeMismatch { expected: expected.into(), found: self.type_name() }
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self { Value::Record(r) }
}

/// A named object: a class name plus its fields in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub class: String,
    pub fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(class: impl Into<String>) -> Self {
        Self { class: class.into(), fields: Vec::new() }
    }

    /// Appends a field, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Takes the record out of `value`, checking that its class is `class` or a
/// registered subtype of it.
pub fn expect_record(value: Value, class: &str) -> Result<Record> {
    match value {
        Value::Record(r) if r.class == class || crate::schema::is_subtype(&r.class, class) => Ok(r),
        other => Err(other.mismatch(class)),
    }
}

/// The primitive kinds, each of which has a boxed counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Char => "char",
        }
    }

    pub fn boxed_name(self) -> &'static str {
        match self {
            Primitive::Bool => "Boolean",
            Primitive::Byte => "Byte",
            Primitive::Short => "Short",
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
            Primitive::Char => "Character",
        }
    }
}

/// A declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// The universal top type; accepts anything, including null.
    Any,
    /// An unboxed primitive; never null.
    Primitive(Primitive),
    /// The reference form of a primitive; may be null.
    Boxed(Primitive),
    Str,
    Bytes,
    List,
    Map,
    /// A record class, by name.
    Class(String),
}

impl TypeRef {
    /// True for every type that can hold null.
    pub fn is_reference(&self) -> bool {
        !matches!(self, TypeRef::Primitive(_))
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Any => write!(f, "Object"),
            TypeRef::Primitive(p) => write!(f, "{}", p.name()),
            TypeRef::Boxed(p) => write!(f, "{}", p.boxed_name()),
            TypeRef::Str => write!(f, "String"),
            TypeRef::Bytes => write!(f, "byte[]"),
            TypeRef::List => write!(f, "List"),
            TypeRef::Map => write!(f, "Map"),
            TypeRef::Class(name) => write!(f, "{}", name),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self { Value::$variant(v) }
        })*
    };
}

value_from! {
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    char => Char,
    String => Str,
    Vec<Value> => List,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self { Value::Str(v.to_string()) }
}
