//! Message bus port (spec §4.1, §6 "Cell-to-cell messaging").
//!
//! Cells communicate over subject-addressed messages rather than direct
//! connections, so the route table (spec §3) can restrict who a given cell
//! is allowed to address. The in-memory adapter backs tests and `--local`
//! mode; the NATS adapter backs production, grounded on the request/reply
//! and JetStream patterns used for mission and blackboard delivery.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::errors::DomainResult;

/// One message delivered on a subject.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct BusMessage {
    pub subject: String,
    pub payload: Vec<u8>,
}

/// Object-safe message-bus port: every method moves raw bytes, so this
/// trait can live behind `Arc<dyn MessageBus>` the way the gateway does.
/// [`publish_json`] and [`request_json`] provide the generic, serializing
/// convenience callers actually want.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish_bytes(&self, subject: &str, payload: Vec<u8>) -> DomainResult<()>;

    /// Subscribes to a subject (may include NATS-style wildcards in the
    /// production adapter), returning a stream of raw messages.
    async fn subscribe(&self, subject: &str) -> DomainResult<BoxStream<'static, BusMessage>>;

    /// Publishes `payload` and waits for exactly one reply on an
    /// ephemeral inbox subject, up to `timeout`. Used by the `natsResponse`
    /// completion check (spec §4.6).
    async fn request_bytes(
        &self,
        subject: &str,
        payload: Vec<u8>,
        timeout: std::time::Duration,
    ) -> DomainResult<BusMessage>;
}

/// Serializes `payload` as JSON and publishes it on `subject`.
pub async fn publish_json<T: Serialize + Sync>(
    bus: &dyn MessageBus,
    subject: &str,
    payload: &T,
) -> DomainResult<()> {
    let bytes = serde_json::to_vec(payload)?;
    bus.publish_bytes(subject, bytes).await
}

/// Serializes `payload` as JSON, sends a request, and decodes the reply.
pub async fn request_json<T: Serialize + Sync, R: DeserializeOwned>(
    bus: &dyn MessageBus,
    subject: &str,
    payload: &T,
    timeout: std::time::Duration,
) -> DomainResult<R> {
    let bytes = serde_json::to_vec(payload)?;
    let reply = bus.request_bytes(subject, bytes, timeout).await?;
    decode_payload(&reply)
}

/// Decodes a [`BusMessage`] payload as JSON, wrapping failures as a
/// protocol violation (spec §7).
pub fn decode_payload<T: DeserializeOwned>(message: &BusMessage) -> DomainResult<T> {
    serde_json::from_slice(&message.payload).map_err(|e| {
        DomainError::ProtocolViolation(format!("malformed payload on {}: {e}", message.subject))
    })
}
