//! # Call Interceptor
//!
//! The client side. Every call on a decorated target passes through here
//! first and ends in exactly one of four states:
//!
//! - **local**: interception is off or the method is a root-type method.
//! - **local-fallback**: the exchange failed at the transport level (error,
//!   timeout, empty reply). The original call runs locally.
//! - **remote-success**: the peer returned a value, which becomes the result.
//! - **remote-error**: the peer reported a fault, which is rebuilt and raised.
//!   Once a result arrived there is no fallback.
//!
//! A missing credential is a configuration error and is raised immediately.
//!
//! ## Caveat
//!
//! A call abandoned on timeout is not cancelled on the peer. The remote side
//! may still run it, so a fallback can duplicate side effects.

use crate::config::Config;
use crate::error::Error;
use crate::error::Fault;
use crate::error::Result;
use crate::framing;
use crate::transport::Transport;

use twinrpc::CallEnvelope;
use twinrpc::Outcome;
use twinrpc::Value;
use twinrpc::Wire;

use std::sync::Arc;

/// Where the invoked method is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A method every object has (formatting, hashing, equality). Never remoted.
    Root,
    /// A method declared by the target's own type.
    Declared,
}

/// One intercepted call, before it is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub method: String,
    pub args: Vec<Value>,
    pub origin: Origin,
}

impl Invocation {
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self { method: method.into(), args, origin: Origin::Declared }
    }

    pub fn root(method: impl Into<String>) -> Self {
        Self { method: method.into(), args: Vec::new(), origin: Origin::Root }
    }
}

/// How the remote step ended.
#[derive(Debug)]
pub(crate) enum Remote {
    Local,
    Fallback,
    Returned(Value),
    Raised(Fault),
}

pub struct Interceptor {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
}

impl Interceptor {
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Intercepts one call on `target`, running `proceed` when the call stays local.
    ///
    /// `proceed` receives the original arguments.
    pub async fn intercept<F>(&self, target: &str, invocation: Invocation, proceed: F) -> Result<Value>
    where
        F: FnOnce(Vec<Value>) -> std::result::Result<Value, Fault>,
    {
        let args = invocation.args.clone();
        match self.remote(target, invocation).await? {
            Remote::Local | Remote::Fallback => proceed(args).map_err(Error::Fault),
            Remote::Returned(value) => Ok(value),
            Remote::Raised(fault) => Err(Error::Fault(fault)),
        }
    }

    /// Wraps `object` so its calls go through this interceptor, if it is eligible.
    ///
    /// Eligibility is by bean name or by type name; an ineligible object gets
    /// a proxy that always runs locally.
    pub fn decorate<T: Send + Sync + 'static>(self: &Arc<Self>, bean: &str, object: Arc<T>) -> Proxy<T> {
        let type_name = std::any::type_name::<T>();
        let eligible = self.config.is_eligible(bean, type_name);
        tracing::debug!(bean, type_name, eligible, "decorating target");
        Proxy {
            name: bean.to_string(),
            target: object,
            interceptor: eligible.then(|| self.clone()),
        }
    }

    pub(crate) async fn remote(&self, target: &str, invocation: Invocation) -> Result<Remote> {
        if !self.config.enabled || invocation.origin == Origin::Root {
            return Ok(Remote::Local);
        }

        let Some(credential) = self.config.credential() else {
            return Err(Error::Configuration(
                "remote invocation is enabled but no secret is configured".into(),
            ));
        };

        let arg_count = invocation.args.len();
        let call = CallEnvelope::new(target, invocation.method, invocation.args, credential)?;
        let request = framing::encode_call(&call, self.config.framing)?;

        tracing::info!(target_id = %call.target, method = %call.method, args = arg_count, "dispatching remote call");

        let budget = self.config.round_trip_budget();
        let response = match tokio::time::timeout(budget, self.transport.call(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!(target_id = %call.target, method = %call.method, error = %e, "transport failed; running locally");
                return Ok(Remote::Fallback);
            }
            Err(_) => {
                tracing::warn!(
                    target_id = %call.target,
                    method = %call.method,
                    budget_ms = budget.as_millis() as u64,
                    "round trip timed out; running locally"
                );
                return Ok(Remote::Fallback);
            }
        };

        if response.body.is_empty() {
            tracing::warn!(target_id = %call.target, method = %call.method, "empty response; running locally");
            return Ok(Remote::Fallback);
        }

        let result = framing::decode_result(&response, self.config.framing)?;
        match result.outcome {
            Outcome::Success(value) => {
                tracing::info!(
                    target_id = %call.target,
                    method = %call.method,
                    elapsed_ms = result.elapsed_ms,
                    "remote call returned"
                );
                Ok(Remote::Returned(value))
            }
            Outcome::Failure { message, error_type } => {
                tracing::info!(
                    target_id = %call.target,
                    method = %call.method,
                    error_type = error_type.as_deref().unwrap_or("-"),
                    error = message.as_deref().unwrap_or(""),
                    "remote call raised"
                );
                Ok(Remote::Raised(Fault::reconstruct(error_type.as_deref(), message)))
            }
        }
    }
}

/// A target wrapped for interception.
///
/// Each intercepted method is written once as a call to `call`, naming the
/// method, its arguments and the local body to run when the call stays local.
///
/// ```ignore
/// impl Proxy<OrderService> {
///     async fn get_order(&self, id: i64) -> twinrun::Result<Order> {
///         self.call("getOrder", vec![id.into()], |svc| svc.get_order(id)).await
///     }
/// }
/// ```
pub struct Proxy<T> {
    name: String,
    target: Arc<T>,
    interceptor: Option<Arc<Interceptor>>,
}

impl<T: Send + Sync + 'static> Proxy<T> {
    /// A proxy that never leaves the process.
    pub fn local(name: impl Into<String>, target: Arc<T>) -> Self {
        Self { name: name.into(), target, interceptor: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    pub fn is_intercepted(&self) -> bool {
        self.interceptor.is_some()
    }

    /// Calls `method` remotely when intercepted, else (or on fallback) runs `local`.
    pub async fn call<R, F>(&self, method: &str, args: Vec<Value>, local: F) -> Result<R>
    where
        R: Wire,
        F: FnOnce(&T) -> std::result::Result<R, Fault>,
    {
        self.run(Invocation::new(method, args), local).await
    }

    /// Calls a root-type method. It always runs locally.
    pub async fn call_root<R, F>(&self, method: &str, local: F) -> Result<R>
    where
        R: Wire,
        F: FnOnce(&T) -> std::result::Result<R, Fault>,
    {
        self.run(Invocation::root(method), local).await
    }

    async fn run<R, F>(&self, invocation: Invocation, local: F) -> Result<R>
    where
        R: Wire,
        F: FnOnce(&T) -> std::result::Result<R, Fault>,
    {
        let Some(interceptor) = &self.interceptor else {
            return local(&self.target).map_err(Error::Fault);
        };
        match interceptor.remote(&self.name, invocation).await? {
            Remote::Local | Remote::Fallback => local(&self.target).map_err(Error::Fault),
            Remote::Returned(value) => R::from_value(value).map_err(Error::Codec),
            Remote::Raised(fault) => Err(Error::Fault(fault)),
        }
    }
}
