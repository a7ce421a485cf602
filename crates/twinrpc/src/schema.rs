//! # Type Schema Cache
//!
//! A process-wide map from Rust type to its serialization plan, built lazily
//! on first use and never evicted. A second index by class name lets the
//! resolver answer subtype questions about records that only exist as
//! dynamic `Value`s.
//!
//! Every `wire_record!` type is collected at link time and registered the
//! first time the class index is consulted, so subtype answers never depend
//! on which types this process happened to encode first.
//!
//! ## Invariants
//! - **Pure**: a schema is a function of its type alone, so a cached entry can never go stale.
//! - **First insert wins**: two threads racing on first use may both build a
//!   schema; only one is kept and both callers observe it.

use crate::value::TypeRef;
use crate::wire::Wire;

use dashmap::DashMap;

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::Once;

/// The serialization plan for one type.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// `std::any::type_name` of the Rust type, for diagnostics.
    pub rust_type: &'static str,
    pub ty: TypeRef,
    /// Record fields in serialization order; empty for non-records.
    pub fields: Vec<&'static str>,
    /// Direct supertypes of a record class.
    pub supertypes: Vec<&'static str>,
}

impl Schema {
    /// A schema for a non-record type.
    pub fn scalar<T: ?Sized + 'static>(ty: TypeRef) -> Self {
        Self { rust_type: std::any::type_name::<T>(), ty, fields: Vec::new(), supertypes: Vec::new() }
    }

    /// A schema for a record class.
    pub fn record<T: ?Sized + 'static>(
        class: &'static str,
        fields: &[&'static str],
        supertypes: &[&'static str],
    ) -> Self {
        Self {
            rust_type: std::any::type_name::<T>(),
            ty: TypeRef::Class(class.to_string()),
            fields: fields.to_vec(),
            supertypes: supertypes.to_vec(),
        }
    }

    /// The class name, for record schemas.
    pub fn class(&self) -> Option<&str> {
        match &self.ty {
            TypeRef::Class(name) => Some(name),
            _ => None,
        }
    }
}

/// A record type submitted by `wire_record!`.
pub struct RecordReg {
    pub register: fn(),
}

inventory::collect!(RecordReg);

static SEEDED: Once = Once::new();

/// Registers every collected record type, once per process.
fn seed() {
    SEEDED.call_once(|| {
        for reg in inventory::iter::<RecordReg> {
            (reg.register)();
        }
    });
}

struct SchemaCache {
    by_type: DashMap<TypeId, Arc<Schema>>,
    by_class: DashMap<String, Arc<Schema>>,
}

static CACHE: LazyLock<SchemaCache> = LazyLock::new(|| SchemaCache {
    by_type: DashMap::new(),
    by_class: DashMap::new(),
});

/// Returns the cached schema for `T`, building and registering it on first use.
///
/// Calling this ahead of time is how a host makes a record class known to
/// subtype checks before any value of it has crossed the wire.
pub fn of<T: Wire>() -> Arc<Schema> {
    let id = TypeId::of::<T>();
    if let Some(schema) = CACHE.by_type.get(&id) {
        return schema.value().clone();
    }

    // built outside any map guard; `describe` may itself touch the cache
    let built = Arc::new(T::describe());
    let schema = CACHE.by_type.entry(id).or_insert(built).value().clone();

    if let Some(class) = schema.class() {
        CACHE.by_class.entry(class.to_string()).or_insert_with(|| schema.clone());
    }
    schema
}

/// Makes `T` known to the cache without using its schema.
///
/// Record types declared with `wire_record!` are registered automatically; a
/// hand-written `Wire` impl for a record calls this at startup.
pub fn register<T: Wire>() {
    of::<T>();
}

/// Looks up a record schema by class name.
pub fn lookup(class: &str) -> Option<Arc<Schema>> {
    seed();
    CACHE.by_class.get(class).map(|s| s.value().clone())
}

/// True if `sub` is `sup` or transitively declares it as a supertype.
///
/// Classes that were never declared only match themselves.
pub fn is_subtype(sub: &str, sup: &str) -> bool {
    if sub == sup {
        return true;
    }

    let mut seen = HashSet::new();
    let mut pending = vec![sub.to_string()];
    while let Some(class) = pending.pop() {
        let Some(schema) = lookup(&class) else { continue };
        for parent in &schema.supertypes {
            if *parent == sup {
                return true;
            }
            if seen.insert(*parent) {
                pending.push(parent.to_string());
            }
        }
    }
    false
}

/// Number of types with a cached schema.
pub fn cached_types() -> usize {
    CACHE.by_type.len()
}
