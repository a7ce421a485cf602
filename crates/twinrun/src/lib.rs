//! # Twinrun
//!
//! Redirects selected method calls to a peer process, runs them there against
//! the peer's live objects, and hands back the result or a rebuilt fault.
//! When the peer cannot be reached the call simply runs locally.
//!
//! ## Architecture
//!
//! - **Client**: an `Interceptor` decorates targets into `Proxy`s. Each call
//!   becomes a `CallEnvelope`, goes out over a `Transport`, and comes back
//!   as a `ResultEnvelope`.
//! - **Server**: a `Dispatcher` authenticates the call, finds the target in a
//!   `TargetRegistry`, picks the method from its `Class` table with the
//!   resolver, and runs it on the blocking pool.
//! - **Plumbing**: `HttpTransport` and `http::router` speak HTTP;
//!   `LoopbackTransport` keeps both sides in one process.


pub mod class;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod framing;
pub mod http;
pub mod interceptor;
pub mod logging;
pub mod loopback;
pub mod registry;
pub mod resolver;
pub mod transport;

pub use class::Class;
pub use class::ClassBuilder;
pub use config::Config;
pub use config::Framing;
pub use dispatcher::Dispatcher;
pub use error::Error;
pub use error::Fault;
pub use error::FaultKind;
pub use error::Result;
pub use error::register_fault_kind;
pub use http::HttpTransport;
pub use interceptor::Interceptor;
pub use interceptor::Invocation;
pub use interceptor::Origin;
pub use interceptor::Proxy;
pub use loopback::LoopbackTransport;
pub use registry::BeanRegistry;
pub use registry::Target;
pub use registry::TargetRegistry;
pub use transport::Message;
pub use transport::Transport;
pub use transport::TransportError;
