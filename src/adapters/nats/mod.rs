//! NATS adapter backing the message-bus port in production.

pub mod message_bus;

pub use message_bus::NatsMessageBus;
