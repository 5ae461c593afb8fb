use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::invoice_calculator::InvoiceCalculator;
use super::issuance_workflow::IssuanceWorkflow;
use crate::core::AppError;
use crate::modules::businesses::CredentialProvider;
use crate::modules::invoices::models::{CalculatedInvoice, InvoiceRequest};
use crate::queue::{DeadLetterMessage, MessagePublisher, QueueMessage, RetryMessage};

/// What happened to each item of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Reached PENDING in this pass
    pub issued: usize,
    /// Handed to the retry channel
    pub retried: usize,
    /// Handed to the dead-letter channel
    pub dead_lettered: usize,
    /// Failed calculation; nothing to retry
    pub rejected: usize,
    /// Failed and could not be published anywhere
    pub unrouted: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.issued + self.retried + self.dead_lettered + self.rejected + self.unrouted
    }
}

/// Processes a batch of invoice requests one at a time.
///
/// Items are paced by a fixed delay to stay under the gateway's and the mail
/// provider's rate limits. An item failure is routed to the queue and never
/// stops the batch.
pub struct BatchProcessor {
    calculator: InvoiceCalculator,
    workflow: Arc<IssuanceWorkflow>,
    credentials: Arc<dyn CredentialProvider>,
    publisher: Arc<dyn MessagePublisher>,
    item_delay: Duration,
}

impl BatchProcessor {
    pub fn new(
        workflow: Arc<IssuanceWorkflow>,
        credentials: Arc<dyn CredentialProvider>,
        publisher: Arc<dyn MessagePublisher>,
        item_delay: Duration,
    ) -> Self {
        Self {
            calculator: InvoiceCalculator::new(),
            workflow,
            credentials,
            publisher,
            item_delay,
        }
    }

    pub async fn process_batch(&self, business_id: &str, requests: &[InvoiceRequest]) -> BatchReport {
        let mut report = BatchReport::default();

        tracing::info!(business_id, items = requests.len(), "Processing invoice batch");

        // Once per batch, not once per item
        let credential = self.credentials.get_payment_credential(business_id).await;
        if let Err(e) = &credential {
            tracing::error!(
                business_id,
                error = %e,
                "Payment credential unavailable for batch"
            );
        }

        for (idx, request) in requests.iter().enumerate() {
            if idx > 0 && !self.item_delay.is_zero() {
                tokio::time::sleep(self.item_delay).await;
            }

            let calculated = match self.calculator.calculate(request) {
                Ok(calculated) => calculated,
                Err(e) => {
                    tracing::warn!(
                        business_id,
                        item = idx,
                        error = %e,
                        "Invoice request rejected"
                    );
                    report.rejected += 1;
                    continue;
                }
            };

            let result = match &credential {
                Ok(credential) => self
                    .workflow
                    .issue(&calculated, credential, business_id)
                    .await
                    .map(|_| ()),
                Err(e) => Err(replay_error(e)),
            };

            match result {
                Ok(()) => report.issued += 1,
                Err(e) => self.route_failure(business_id, calculated, e, &mut report).await,
            }
        }

        tracing::info!(
            business_id,
            issued = report.issued,
            retried = report.retried,
            dead_lettered = report.dead_lettered,
            rejected = report.rejected,
            unrouted = report.unrouted,
            "Invoice batch finished"
        );

        report
    }

    async fn route_failure(
        &self,
        business_id: &str,
        calculated: CalculatedInvoice,
        error: AppError,
        report: &mut BatchReport,
    ) {
        let invoice_no = calculated.invoice_no.clone();
        let retryable = error.is_retryable();

        let message = if retryable {
            tracing::warn!(
                business_id,
                invoice_no = %invoice_no,
                error = %error,
                "Issuance failed, scheduling retry"
            );
            QueueMessage::Retry(RetryMessage::first(business_id, calculated))
        } else {
            tracing::error!(
                business_id,
                invoice_no = %invoice_no,
                error = %error,
                "Issuance failed permanently"
            );
            QueueMessage::DeadLetter(DeadLetterMessage::new(business_id, calculated, 0, &error))
        };

        match self.publisher.publish(message).await {
            Ok(()) if retryable => report.retried += 1,
            Ok(()) => report.dead_lettered += 1,
            Err(e) => {
                tracing::error!(
                    business_id,
                    invoice_no = %invoice_no,
                    error = %e,
                    "Failed to enqueue failed invoice"
                );
                report.unrouted += 1;
            }
        }
    }
}

/// Fresh error with the same retry classification
fn replay_error(error: &AppError) -> AppError {
    if error.is_retryable() {
        AppError::internal(error.to_string())
    } else {
        AppError::configuration(error.to_string())
    }
}
