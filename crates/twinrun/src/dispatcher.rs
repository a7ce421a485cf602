//! # Remote Dispatcher
//!
//! The server side: takes a call envelope, decides whether it may run, runs
//! it against a live target and reports the outcome.
//!
//! ## Invariants
//!
//! - **Checks in order**: credential, then envelope shape, then target, then
//!   method. A bad credential is reported as such whether or not the target
//!   exists, and in `Headers` framing before the argument body is decoded.
//! - **Always answers**: every outcome, including a body that could not be
//!   decoded, becomes a normally encoded result. Nothing here is a transport failure.
//! - **Isolated calls**: each method runs on the blocking pool. A slow method
//!   never stalls other calls and a panic becomes a `Panic` fault.
//! - **No secret, no service**: without a configured secret every call is
//!   rejected as unauthenticated.

use crate::config::Config;
use crate::config::Framing;
use crate::error::Fault;
use crate::error::FaultKind;
use crate::framing;
use crate::registry::TargetRegistry;
use crate::resolver;
use crate::transport::Message;

use twinrpc::CallEnvelope;
use twinrpc::ResultEnvelope;

use std::sync::Arc;
use std::time::Instant;

pub struct Dispatcher {
    secret: Option<String>,
    framing: Framing,
    registry: Arc<dyn TargetRegistry>,
}

impl Dispatcher {
    pub fn new(config: &Config, registry: Arc<dyn TargetRegistry>) -> Self {
        Self {
            secret: config.credential().map(str::to_string),
            framing: config.framing,
            registry,
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Runs one call and reports its outcome.
    pub async fn dispatch(&self, call: CallEnvelope) -> ResultEnvelope {
        if let Some(rejected) = self.authenticate(&call.target, &call.method, &call.credential) {
            return rejected;
        }

        if call.target.is_empty() || call.method.is_empty() {
            tracing::warn!(target_id = %call.target, method = %call.method, "call is missing target or method");
            return reject(FaultKind::Validation, "target identifier and method name are required");
        }

        let Some(target) = self.registry.resolve_target(&call.target) else {
            tracing::warn!(target_id = %call.target, "target not found");
            return reject(FaultKind::Resolution, format!("target not found: {}", call.target));
        };

        let Some(method) = resolver::resolve(&target.class, &call.method, &call.args) else {
            let signature = resolver::describe_args(&call.args);
            tracing::warn!(
                target_id = %call.target,
                method = %call.method,
                args = %signature,
                "no matching method"
            );
            return reject(
                FaultKind::Resolution,
                format!("method not found: {}.{}{}", target.class.name(), call.method, signature),
            );
        };

        tracing::debug!(
            target_id = %call.target,
            method = %call.method,
            declaring = %method.declaring,
            "invoking"
        );

        let started = Instant::now();
        let object = target.object.clone();
        let args = call.args;
        let outcome = tokio::task::spawn_blocking(move || method.invoke(&*object, args)).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = match outcome {
            Ok(result) => result,
            Err(join) if join.is_panic() => Err(Fault::new(FaultKind::Panic, panic_message(join.into_panic()))),
            Err(join) => Err(Fault::new(FaultKind::Generic, join.to_string())),
        };

        match outcome {
            Ok(value) => {
                tracing::info!(
                    target_id = %call.target,
                    method = %call.method,
                    returned = %value.type_name(),
                    elapsed_ms,
                    "invocation completed"
                );
                ResultEnvelope::success(value, elapsed_ms)
            }
            Err(fault) => {
                tracing::info!(
                    target_id = %call.target,
                    method = %call.method,
                    error_type = %fault.kind,
                    error = %fault.message(),
                    elapsed_ms,
                    "invocation raised"
                );
                ResultEnvelope::failure(
                    fault.message,
                    Some(fault.kind.as_type_name().to_string()),
                    elapsed_ms,
                )
            }
        }
    }

    /// Answers one transport message in the configured framing.
    ///
    /// With `Headers` framing the credential is checked before the body is
    /// decoded, so an unauthenticated peer never learns how its body was parsed.
    pub async fn handle(&self, request: Message) -> Message {
        if self.framing == Framing::Headers {
            let target = request.header(framing::TARGET_HEADER).unwrap_or_default();
            let method = request.header(framing::METHOD_HEADER).unwrap_or_default();
            let credential = request.header(framing::CREDENTIAL_HEADER).unwrap_or_default();
            if let Some(rejected) = self.authenticate(target, method, credential) {
                return self.reply(&rejected);
            }
        }

        let result = if request.body.is_empty() {
            tracing::warn!("empty request body");
            reject(FaultKind::Validation, "empty request body")
        } else {
            match framing::decode_call(&request, self.framing) {
                Ok(call) => self.dispatch(call).await,
                Err(e) => {
                    tracing::warn!(error = %e, "undecodable request body");
                    reject(FaultKind::Validation, format!("malformed call: {}", e))
                }
            }
        };
        self.reply(&result)
    }

    /// Returns the rejection for a call that may not run, or `None`.
    fn authenticate(&self, target: &str, method: &str, credential: &str) -> Option<ResultEnvelope> {
        let Some(secret) = self.secret.as_deref() else {
            tracing::warn!(target_id = target, method, "no secret configured; rejecting call");
            return Some(reject(FaultKind::Authentication, "remote invocation is not configured"));
        };
        if !credentials_match(secret, credential) {
            tracing::warn!(target_id = target, method, "credential mismatch");
            return Some(reject(FaultKind::Authentication, "invalid credential"));
        }
        None
    }

    fn reply(&self, result: &ResultEnvelope) -> Message {
        match framing::encode_result(result, self.framing) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, "result could not be encoded");
                let fallback = ResultEnvelope::failure(
                    Some(format!("result could not be encoded: {}", e)),
                    Some(FaultKind::Codec.as_type_name().to_string()),
                    result.elapsed_ms,
                );
                framing::encode_result(&fallback, self.framing).unwrap_or_default()
            }
        }
    }
}

fn reject(kind: FaultKind, message: impl Into<String>) -> ResultEnvelope {
    ResultEnvelope::failure(Some(message.into()), Some(kind.as_type_name().to_string()), 0)
}

/// Compares without exiting early on the first differing byte.
fn credentials_match(expected: &str, given: &str) -> bool {
    let (a, b) = (expected.as_bytes(), given.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "method panicked".to_string()
}
