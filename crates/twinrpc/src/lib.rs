//! # TwinRPC
//!
//! The wire half of remote method proxying.
//!
//! ## Architecture
//!
//! Arguments and return values are carried as dynamic `Value`s, typed Rust
//! values cross into that model through the `Wire` trait, and the `codec`
//! lays both onto `twinpack` bytes. A per-type `Schema` is computed once and
//! kept in a process-wide cache. The `envelope` module frames a call and its
//! result as two self-describing records.

mod macros;

#[cfg(test)]
mod tests;

pub mod codec;
pub mod envelope;
pub mod error;
pub mod schema;
pub mod value;
pub mod wire;

#[doc(hidden)]
pub use inventory;

pub use codec::decode;
pub use codec::decode_from;
pub use codec::decode_list;
pub use codec::decode_values;
pub use codec::encode;
pub use codec::encode_to;
pub use codec::encode_list;
pub use codec::encode_values;
pub use envelope::CallEnvelope;
pub use envelope::Outcome;
pub use envelope::ResultEnvelope;
pub use error::Error;
pub use error::Result;
pub use schema::Schema;
pub use value::Primitive;
pub use value::Record;
pub use value::TypeRef;
pub use value::Value;
pub use wire::Wire;
