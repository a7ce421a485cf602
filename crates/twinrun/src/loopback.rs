//! An in-process `Transport` that hands requests straight to a `Dispatcher`.
//!
//! Useful for tests and for single-process setups where both sides of the
//! protocol live in one binary.

use crate::dispatcher::Dispatcher;
use crate::transport;
use crate::transport::Message;
use crate::transport::Transport;

use std::sync::Arc;

pub struct LoopbackTransport {
    dispatcher: Arc<Dispatcher>,
}

impl LoopbackTransport {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait::async_trait]
impl Transport for LoopbackTransport {
    async fn call(&self, request: Message) -> transport::Result<Message> {
        Ok(self.dispatcher.handle(request).await)
    }
}
