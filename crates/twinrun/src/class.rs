//! # Method Tables
//!
//! A `Class` is an explicit, per-type method table: a name, an optional
//! superclass, and the methods in declaration order. Remote dispatch only
//! ever sees these tables; it never inspects Rust types directly.
//!
//! Inheritance is expressed by composition. A class may name a superclass
//! together with a projection from its receiver to the embedded parent; a
//! method found on the superclass runs on the projected receiver.

use crate::error::Fault;

use twinrpc::TypeRef;
use twinrpc::Value;
use twinrpc::Wire;
use twinrpc::schema;

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// A type-erased method receiver.
pub type Receiver = dyn Any + Send + Sync + 'static;

/// A type-erased method body.
pub type Handler = Arc<dyn Fn(&Receiver, Vec<Value>) -> Result<Value, Fault> + Send + Sync>;

/// Maps a receiver to its embedded superclass receiver.
pub type Projection = Arc<dyn Fn(&Receiver) -> Option<&Receiver> + Send + Sync>;

pub struct Method {
    pub name: String,
    /// Declared parameter types, positionally.
    pub params: Vec<TypeRef>,
    pub(crate) handler: Handler,
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

pub(crate) struct Superclass {
    pub(crate) class: Arc<Class>,
    pub(crate) project: Projection,
}

pub struct Class {
    name: String,
    pub(crate) superclass: Option<Superclass>,
    methods: Vec<Method>,
}

impl Class {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Methods declared directly on this class, in declaration order.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn superclass(&self) -> Option<&Arc<Class>> {
        self.superclass.as_ref().map(|s| &s.class)
    }
}

impl std::fmt::Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("superclass", &self.superclass().map(|c| c.name()))
            .field("methods", &self.methods)
            .finish()
    }
}

// Pins the closure to the higher-ranked signature; inference alone will not.
fn projection<F>(f: F) -> F
where
    F: for<'a> Fn(&'a Receiver) -> Option<&'a Receiver> + Send + Sync + 'static,
{
    f
}

/// Builds the method table for receivers of type `T`.
pub struct ClassBuilder<T> {
    name: String,
    superclass: Option<Superclass>,
    methods: Vec<Method>,
    _receiver: PhantomData<fn(&T)>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), superclass: None, methods: Vec::new(), _receiver: PhantomData }
    }

    /// Declares `parent` as the superclass, reached through `project`.
    pub fn extends<P: Any + Send + Sync>(mut self, parent: Arc<Class>, project: fn(&T) -> &P) -> Self {
        let project = projection(move |receiver: &Receiver| {
            receiver.downcast_ref::<T>().map(|t| project(t) as &Receiver)
        });
        self.superclass = Some(Superclass { class: parent, project: Arc::new(project) });
        self
    }

    /// Declares a method over raw values.
    ///
    /// The handler receives exactly `params.len()` arguments.
    pub fn method_raw<F>(mut self, name: impl Into<String>, params: Vec<TypeRef>, f: F) -> Self
    where
        F: Fn(&T, Vec<Value>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        let class = self.name.clone();
        let handler: Handler = Arc::new(move |receiver: &Receiver, args: Vec<Value>| {
            let this = receiver
                .downcast_ref::<T>()
                .ok_or_else(|| Fault::illegal_state(format!("receiver is not a {}", class)))?;
            f(this, args)
        });
        self.methods.push(Method { name: name.into(), params, handler });
        self
    }

    pub fn method0<R, F>(self, name: impl Into<String>, f: F) -> Self
    where
        R: Wire,
        F: Fn(&T) -> Result<R, Fault> + Send + Sync + 'static,
    {
        self.method_raw(name, Vec::new(), move |this, _args| f(this).map(|r| r.to_value()))
    }

    pub fn method1<A, R, F>(self, name: impl Into<String>, f: F) -> Self
    where
        A: Wire,
        R: Wire,
        F: Fn(&T, A) -> Result<R, Fault> + Send + Sync + 'static,
    {
        let params = vec![declare::<A>()];
        self.method_raw(name, params, move |this, args| {
            let [a] = take_args::<1>(args)?;
            f(this, arg(a)?).map(|r| r.to_value())
        })
    }

    pub fn method2<A, B, R, F>(self, name: impl Into<String>, f: F) -> Self
    where
        A: Wire,
        B: Wire,
        R: Wire,
        F: Fn(&T, A, B) -> Result<R, Fault> + Send + Sync + 'static,
    {
        let params = vec![declare::<A>(), declare::<B>()];
        self.method_raw(name, params, move |this, args| {
            let [a, b] = take_args::<2>(args)?;
            f(this, arg(a)?, arg(b)?).map(|r| r.to_value())
        })
    }

    pub fn method3<A, B, C, R, F>(self, name: impl Into<String>, f: F) -> Self
    where
        A: Wire,
        B: Wire,
        C: Wire,
        R: Wire,
        F: Fn(&T, A, B, C) -> Result<R, Fault> + Send + Sync + 'static,
    {
        let params = vec![declare::<A>(), declare::<B>(), declare::<C>()];
        self.method_raw(name, params, move |this, args| {
            let [a, b, c] = take_args::<3>(args)?;
            f(this, arg(a)?, arg(b)?, arg(c)?).map(|r| r.to_value())
        })
    }

    pub fn build(self) -> Arc<Class> {
        Arc::new(Class { name: self.name, superclass: self.superclass, methods: self.methods })
    }
}

/// Declares a parameter and makes its type known to subtype checks.
fn declare<A: Wire>() -> TypeRef {
    schema::register::<A>();
    A::type_ref()
}

fn take_args<const N: usize>(args: Vec<Value>) -> Result<[Value; N], Fault> {
    let found = args.len();
    <[Value; N]>::try_from(args)
        .map_err(|_| Fault::illegal_argument(format!("expected {} arguments, got {}", N, found)))
}

fn arg<A: Wire>(value: Value) -> Result<A, Fault> {
    A::from_value(value).map_err(|e| Fault::illegal_argument(e.to_string()))
}
