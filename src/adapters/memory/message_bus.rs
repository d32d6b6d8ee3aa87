//! In-memory [`MessageBus`] — backs tests and `--local` mode.
//!
//! `subscribe` delivers to every subscriber on an exact subject match (no
//! NATS-style wildcards; those only matter for the production adapter).
//! `request_bytes` is deliberately simple: tests register a canned reply
//! via [`InMemoryMessageBus::set_auto_reply`] rather than running a real
//! responder loop, since the in-memory bus exists to make reconciler and
//! check-runner tests deterministic, not to model NATS semantics.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{BusMessage, MessageBus};

#[derive(Default)]
pub struct InMemoryMessageBus {
    subscribers: RwLock<HashMap<String, Vec<mpsc::UnboundedSender<BusMessage>>>>,
    auto_replies: Mutex<HashMap<String, Value>>,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a canned JSON reply for [`request_bytes`](MessageBus::request_bytes)
    /// calls against `subject`, used by tests that exercise the
    /// `natsResponse` completion check without a real NATS server.
    pub fn set_auto_reply(&self, subject: &str, reply: Value) {
        self.auto_replies.lock().unwrap().insert(subject.to_string(), reply);
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish_bytes(&self, subject: &str, payload: Vec<u8>) -> DomainResult<()> {
        let mut subscribers = self.subscribers.write().await;
        if let Some(senders) = subscribers.get_mut(subject) {
            let message = BusMessage { subject: subject.to_string(), payload };
            senders.retain(|tx| tx.send(message.clone()).is_ok());
        }
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> DomainResult<BoxStream<'static, BusMessage>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().await.entry(subject.to_string()).or_default().push(tx);
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn request_bytes(
        &self,
        subject: &str,
        _payload: Vec<u8>,
        timeout: Duration,
    ) -> DomainResult<BusMessage> {
        let reply = self.auto_replies.lock().unwrap().get(subject).cloned();
        if let Some(reply) = reply {
            let payload = serde_json::to_vec(&reply)?;
            return Ok(BusMessage { subject: subject.to_string(), payload });
        }
        tokio::time::sleep(timeout).await;
        Err(DomainError::ProtocolViolation(format!(
            "no reply received on {subject} within {timeout:?}"
        )))
    }
}
