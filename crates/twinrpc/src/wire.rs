//! # Typed Values
//!
//! `Wire` connects ordinary Rust types to the dynamic `Value` model: each
//! implementor declares its `TypeRef`, describes its schema once, and converts
//! to and from `Value`.
//!
//! Records implement it through `wire_record!`; this module covers the
//! primitives, strings, options, sequences and maps.

use crate::error::Result;
use crate::schema;
use crate::schema::Schema;
use crate::value::Primitive;
use crate::value::TypeRef;
use crate::value::Value;

use std::collections::BTreeMap;
use std::sync::Arc;

/// A Rust type with a stable wire shape.
pub trait Wire: Sized + Send + 'static {
    /// The declared type, as a method parameter would state it.
    fn type_ref() -> TypeRef;

    /// Builds this type's schema. Called at most once per race by the cache.
    fn describe() -> Schema {
        Schema::scalar::<Self>(Self::type_ref())
    }

    /// The cached schema for this type.
    fn schema() -> Arc<Schema> {
        schema::of::<Self>()
    }

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;
}

macro_rules! wire_primitive {
    ($($ty:ty => $variant:ident / $prim:ident),* $(,)?) => {
        $(impl Wire for $ty {
            fn type_ref() -> TypeRef { TypeRef::Primitive(Primitive::$prim) }

            fn to_value(&self) -> Value { Value::$variant(*self) }

            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(other.mismatch(Primitive::$prim.name())),
                }
            }
        })*
    };
}

wire_primitive! {
    bool => Bool / Bool,
    i8 => Byte / Byte,
    i16 => Short / Short,
    i32 => Int / Int,
    i64 => Long / Long,
    f32 => Float / Float,
    f64 => Double / Double,
    char => Char / Char,
}

impl Wire for String {
    fn type_ref() -> TypeRef { TypeRef::Str }

    fn to_value(&self) -> Value { Value::Str(self.clone()) }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(other.mismatch("String")),
        }
    }
}

/// The unit return of a method that produces nothing; travels as null.
impl Wire for () {
    fn type_ref() -> TypeRef { TypeRef::Any }

    fn to_value(&self) -> Value { Value::Null }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(()),
            other => Err(other.mismatch("void")),
        }
    }
}

/// Passes dynamic values through untouched; declared as the top type.
impl Wire for Value {
    fn type_ref() -> TypeRef { TypeRef::Any }

    fn to_value(&self) -> Value { self.clone() }

    fn from_value(value: Value) -> Result<Self> { Ok(value) }
}

/// `Option<T>` is the nullable reference form of `T`: an `Option<i32>`
/// parameter is declared `Integer`, not `int`.
impl<T: Wire> Wire for Option<T> {
    fn type_ref() -> TypeRef {
        match T::type_ref() {
            TypeRef::Primitive(p) => TypeRef::Boxed(p),
            other => other,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: Wire> Wire for Vec<T> {
    fn type_ref() -> TypeRef { TypeRef::List }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Wire::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(other.mismatch("List")),
        }
    }
}

/// Ordered maps keep encoding deterministic.
impl<K: Wire + Ord, V: Wire> Wire for BTreeMap<K, V> {
    fn type_ref() -> TypeRef { TypeRef::Map }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| -> Result<(K, V)> { Ok((K::from_value(k)?, V::from_value(v)?)) })
                .collect(),
            other => Err(other.mismatch("Map")),
        }
    }
}
