//! # Target Registry
//!
//! The host capability that turns a target identifier into a live receiver
//! and its method table. The dispatcher only ever asks `resolve_target`; how
//! the host keeps its objects is its own business. `BeanRegistry` is a
//! ready-made concurrent implementation.

use crate::class::Class;
use crate::class::Receiver;

use dashmap::DashMap;

use std::any::Any;
use std::sync::Arc;

/// A live receiver paired with its method table.
#[derive(Clone)]
pub struct Target {
    pub object: Arc<Receiver>,
    pub class: Arc<Class>,
}

impl Target {
    pub fn new<T: Any + Send + Sync>(object: Arc<T>, class: Arc<Class>) -> Self {
        Self { object, class }
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target").field("class", &self.class.name()).finish_non_exhaustive()
    }
}

/// Resolves call targets by identifier.
pub trait TargetRegistry: Send + Sync + 'static {
    fn resolve_target(&self, identifier: &str) -> Option<Target>;
}

/// A concurrent name-to-target map.
#[derive(Default)]
pub struct BeanRegistry {
    beans: DashMap<String, Target>,
}

impl BeanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `object` under `name`, replacing any previous target.
    pub fn register<T: Any + Send + Sync>(&self, name: impl Into<String>, object: Arc<T>, class: Arc<Class>) {
        self.beans.insert(name.into(), Target::new(object, class));
    }

    pub fn remove(&self, name: &str) -> Option<Target> {
        self.beans.remove(name).map(|(_, target)| target)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.beans.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.beans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }
}

impl TargetRegistry for BeanRegistry {
    fn resolve_target(&self, identifier: &str) -> Option<Target> {
        self.beans.get(identifier).map(|e| e.value().clone())
    }
}
