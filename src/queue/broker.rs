use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::message::{Channel, Envelope, QueueMessage};
use crate::core::{AppError, Result};

/// Publishing side of the message queue.
///
/// Delivery is at-least-once; every consumer must tolerate duplicates.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, message: QueueMessage) -> Result<()>;
}

/// In-process broker: one bounded tokio channel per named queue
#[derive(Clone)]
pub struct InMemoryBroker {
    senders: HashMap<Channel, mpsc::Sender<Envelope>>,
}

/// Receiving ends handed to the consumer loops
pub struct QueueReceivers {
    receivers: HashMap<Channel, mpsc::Receiver<Envelope>>,
}

impl QueueReceivers {
    /// Take the receiver for a channel. Each channel has exactly one consumer.
    pub fn take(&mut self, channel: Channel) -> Option<mpsc::Receiver<Envelope>> {
        self.receivers.remove(&channel)
    }
}

impl InMemoryBroker {
    pub fn new(capacity: usize) -> (Self, QueueReceivers) {
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();

        for channel in Channel::ALL {
            let (tx, rx) = mpsc::channel(capacity.max(1));
            senders.insert(channel, tx);
            receivers.insert(channel, rx);
        }

        (Self { senders }, QueueReceivers { receivers })
    }
}

#[async_trait]
impl MessagePublisher for InMemoryBroker {
    async fn publish(&self, message: QueueMessage) -> Result<()> {
        let envelope = Envelope::seal(&message)?;
        let channel = envelope.channel;

        let sender = self
            .senders
            .get(&channel)
            .ok_or_else(|| AppError::queue(format!("Unknown channel {}", channel)))?;

        // A consumer may publish to its own channel, so never wait for space
        sender.try_send(envelope).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                AppError::queue(format!("Channel {} is full", channel))
            }
            mpsc::error::TrySendError::Closed(_) => {
                AppError::queue(format!("Channel {} is closed", channel))
            }
        })?;

        tracing::debug!(channel = %channel, "Message published");
        Ok(())
    }
}
