//! # Method Resolver
//!
//! Picks the declared method a call should run, using only the method name and
//! the runtime types of the already-decoded arguments.
//!
//! ## Rules
//!
//! - Arity must match exactly; there are no varargs or defaults.
//! - An `Any` parameter accepts every argument, including null.
//! - A primitive parameter accepts only a value of the same primitive kind.
//!   There is no widening or narrowing between kinds.
//! - A reference parameter accepts null, a value of the same type, or a record
//!   whose class is a registered subtype.
//! - Methods declared on the class are tried in declaration order and the
//!   first match wins. There is no specificity ranking: with `f(Object)`
//!   declared before `f(String)`, a string argument selects `f(Object)`.
//! - If nothing matches, the superclass is searched the same way.

use crate::class::Class;
use crate::class::Handler;
use crate::class::Projection;
use crate::class::Receiver;
use crate::error::Fault;

use twinrpc::TypeRef;
use twinrpc::Value;
use twinrpc::schema;

use std::sync::Arc;

/// A resolved method, ready to invoke on the receiver it was resolved for.
#[derive(Clone)]
pub struct MethodRef {
    /// Name of the class that declares the method.
    pub declaring: String,
    pub params: Vec<TypeRef>,
    /// Superclass projections from the resolved receiver to the declaring class.
    chain: Vec<Projection>,
    handler: Handler,
}

impl MethodRef {
    /// Runs the method on `receiver`, an instance of the class it was resolved against.
    pub fn invoke(&self, receiver: &Receiver, args: Vec<Value>) -> Result<Value, Fault> {
        let mut this = receiver;
        for project in &self.chain {
            this = project(this).ok_or_else(|| {
                Fault::illegal_state(format!("receiver does not embed a {}", self.declaring))
            })?;
        }
        (self.handler)(this, args)
    }
}

impl std::fmt::Debug for MethodRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRef")
            .field("declaring", &self.declaring)
            .field("params", &self.params)
            .field("depth", &self.chain.len())
            .finish()
    }
}

/// Finds the method `name` on `class` (or a superclass) that accepts `args`.
pub fn resolve(class: &Arc<Class>, name: &str, args: &[Value]) -> Option<MethodRef> {
    let mut chain = Vec::new();
    let mut current = class;

    loop {
        let found = current.methods().iter().find(|m| {
            m.name == name
                && m.params.len() == args.len()
                && m.params.iter().zip(args).all(|(param, arg)| accepts(param, arg))
        });
        if let Some(method) = found {
            return Some(MethodRef {
                declaring: current.name().to_string(),
                params: method.params.clone(),
                chain,
                handler: method.handler.clone(),
            });
        }

        let superclass = current.superclass.as_ref()?;
        chain.push(superclass.project.clone());
        current = &superclass.class;
    }
}

/// True if a parameter declared as `param` accepts the runtime value `arg`.
pub fn accepts(param: &TypeRef, arg: &Value) -> bool {
    let Some(actual) = arg.runtime_type() else {
        return param.is_reference();
    };

    match (param, actual) {
        (TypeRef::Any, _) => true,
        (TypeRef::Primitive(want), TypeRef::Boxed(have)) => *want == have,
        (TypeRef::Boxed(want), TypeRef::Boxed(have)) => *want == have,
        (TypeRef::Class(want), TypeRef::Class(have)) => schema::is_subtype(&have, want),
        (want, have) => *want == have,
    }
}

/// Describes runtime argument types for diagnostics, e.g. `(Integer, null)`.
pub fn describe_args(args: &[Value]) -> String {
    let names: Vec<String> = args.iter().map(Value::type_name).collect();
    format!("({})", names.join(", "))
}
