//! Production [`MessageBus`] backed by a real NATS server.

use std::time::Duration;

use async_nats::Client;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{BusMessage, MessageBus};

pub struct NatsMessageBus {
    client: Client,
}

impl NatsMessageBus {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = async_nats::connect(url).await?;
        Ok(Self { client })
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageBus for NatsMessageBus {
    async fn publish_bytes(&self, subject: &str, payload: Vec<u8>) -> DomainResult<()> {
        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| DomainError::ProtocolViolation(format!("publish to {subject} failed: {e}")))?;
        self.client
            .flush()
            .await
            .map_err(|e| DomainError::ProtocolViolation(format!("flush after publish to {subject} failed: {e}")))?;
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> DomainResult<BoxStream<'static, BusMessage>> {
        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| DomainError::ProtocolViolation(format!("subscribe to {subject} failed: {e}")))?;

        Ok(Box::pin(subscriber.map(|message| BusMessage {
            subject: message.subject.to_string(),
            payload: message.payload.to_vec(),
        })))
    }

    async fn request_bytes(
        &self,
        subject: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> DomainResult<BusMessage> {
        let request = self.client.request(subject.to_string(), payload.into());
        let reply = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| DomainError::ProtocolViolation(format!("no reply on {subject} within {timeout:?}")))?
            .map_err(|e| DomainError::ProtocolViolation(format!("request to {subject} failed: {e}")))?;

        Ok(BusMessage {
            subject: reply.subject.to_string(),
            payload: reply.payload.to_vec(),
        })
    }
}
