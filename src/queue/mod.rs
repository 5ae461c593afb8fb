//! Message queue: named channels, JSON envelopes, one consumer per channel.
//!
//! Delivery is at-least-once. Every handler is idempotent, so a duplicate
//! message only repeats work that is already recorded.

pub mod broker;
pub mod consumer;
pub mod message;

pub use broker::{InMemoryBroker, MessagePublisher, QueueReceivers};
pub use consumer::{spawn_consumers, QueueHandlers};
pub use message::{
    BatchSubmission, Channel, DeadLetterMessage, Envelope, QueueMessage, RetryMessage,
};
