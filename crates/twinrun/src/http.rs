//! # HTTP Plumbing
//!
//! A `Transport` that POSTs to the peer with reqwest, and an axum router that
//! serves a `Dispatcher`. Both are thin: they move bodies and `x-twin-*`
//! headers and leave all meaning to the framing layer.

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::transport;
use crate::transport::Message;
use crate::transport::Transport;
use crate::transport::TransportError;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;

use std::collections::BTreeMap;
use std::sync::Arc;

/// The path the dispatcher is served on.
pub const INVOKE_PATH: &str = "/debuger/invoke";

const OCTET_STREAM: &str = "application/octet-stream";

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Builds a client with the configured timeouts.
    ///
    /// Connecting is bounded by `connect_timeout`, each wait for response
    /// bytes by `read_timeout`, and the whole exchange by their sum.
    pub fn new(config: &Config) -> Result<Self, Error> {
        if config.endpoint.is_empty() {
            return Err(Error::Configuration("no remote endpoint configured".into()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .timeout(config.round_trip_budget())
            .build()
            .map_err(|e| Error::Configuration(format!("http client: {}", e)))?;
        Ok(Self { client, endpoint: config.endpoint.clone() })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn call(&self, request: Message) -> transport::Result<Message> {
        let Message { headers, body } = request;

        let mut builder = self.client.post(&self.endpoint).header(CONTENT_TYPE, OCTET_STREAM);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.body(body).send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let headers = collect_headers(response.headers());
        let body = response.bytes().await.map_err(classify)?;
        Ok(Message { headers, body: body.to_vec() })
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::ConnectionLost(e.to_string())
    } else {
        TransportError::Io(e.to_string())
    }
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

/// Routes `POST /debuger/invoke` to `dispatcher`.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route(INVOKE_PATH, post(handle_invoke))
        .with_state(dispatcher)
}

/// Serves `router(dispatcher)` on an already bound listener until it fails.
pub async fn serve(listener: tokio::net::TcpListener, dispatcher: Arc<Dispatcher>) -> std::io::Result<()> {
    tracing::info!(addr = ?listener.local_addr().ok(), path = INVOKE_PATH, "serving remote invocations");
    axum::serve(listener, router(dispatcher)).await
}

/// Every outcome is a 200; failures live in the reply itself.
async fn handle_invoke(
    State(dispatcher): State<Arc<Dispatcher>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = Message { headers: collect_headers(&headers), body: body.to_vec() };
    let reply = dispatcher.handle(request).await;

    let mut response = (StatusCode::OK, reply.body).into_response();
    let out = response.headers_mut();
    out.insert(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
    for (name, value) in reply.headers {
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
            out.insert(name, value);
        }
    }
    response
}
