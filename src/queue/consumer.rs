use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::broker::QueueReceivers;
use super::message::{Channel, DeadLetterMessage, Envelope, QueueMessage};
use crate::modules::invoices::services::{BatchProcessor, RetryScheduler};
use crate::modules::transactions::services::ReconciliationService;

/// Services the consumer loops hand messages to
#[derive(Clone)]
pub struct QueueHandlers {
    pub batch_processor: Arc<BatchProcessor>,
    pub retry_scheduler: Arc<RetryScheduler>,
    pub reconciliation: Arc<ReconciliationService>,
}

impl QueueHandlers {
    /// Handle one message. Failures are logged here; nothing is redelivered.
    pub async fn handle(&self, message: QueueMessage) {
        match message {
            QueueMessage::BatchSubmission(batch) => {
                self.batch_processor
                    .process_batch(&batch.business_id, &batch.requests)
                    .await;
            }
            QueueMessage::Retry(retry) => {
                let invoice_no = retry.calculated_invoice.invoice_no.clone();
                match self.retry_scheduler.retry(retry).await {
                    Ok(outcome) => {
                        tracing::debug!(invoice_no = %invoice_no, outcome = ?outcome, "Retry handled")
                    }
                    Err(e) => tracing::error!(
                        invoice_no = %invoice_no,
                        error = %e,
                        "Retry outcome could not be published"
                    ),
                }
            }
            QueueMessage::DeadLetter(dead) => log_dead_letter(&dead),
            QueueMessage::PaymentCallback(callback) => {
                match self.reconciliation.reconcile(&callback).await {
                    Ok(outcome) => tracing::info!(
                        order_id = ?callback.order_id,
                        outcome = ?outcome,
                        "Payment callback reconciled"
                    ),
                    Err(e) => tracing::error!(
                        order_id = ?callback.order_id,
                        error = %e,
                        "Payment reconciliation failed"
                    ),
                }
            }
        }
    }
}

/// Dead letters stop here for manual resolution; the full payload is logged
fn log_dead_letter(dead: &DeadLetterMessage) {
    let payload = serde_json::to_string(&dead.calculated_invoice).unwrap_or_default();

    tracing::error!(
        invoice_no = %dead.calculated_invoice.invoice_no,
        business_id = %dead.business_id,
        attempt_no = dead.attempt_no,
        failed_at = %dead.failed_at,
        error = %dead.error,
        payload = %payload,
        "Invoice dead-lettered"
    );
}

/// One task per channel, each handling a single message at a time
pub fn spawn_consumers(mut receivers: QueueReceivers, handlers: QueueHandlers) -> Vec<JoinHandle<()>> {
    Channel::ALL
        .into_iter()
        .filter_map(|channel| {
            let rx = receivers.take(channel)?;
            Some(tokio::spawn(consume(channel, rx, handlers.clone())))
        })
        .collect()
}

async fn consume(channel: Channel, mut rx: mpsc::Receiver<Envelope>, handlers: QueueHandlers) {
    tracing::info!(channel = %channel, "Queue consumer started");

    while let Some(envelope) = rx.recv().await {
        match envelope.open() {
            Ok(message) => handlers.handle(message).await,
            Err(e) => tracing::error!(
                channel = %channel,
                message_id = %envelope.id,
                error = %e,
                "Dropping undecodable message"
            ),
        }
    }

    tracing::info!(channel = %channel, "Queue consumer stopped");
}
