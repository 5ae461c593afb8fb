use std::sync::Arc;
use std::time::Duration;

use super::issuance_workflow::IssuanceWorkflow;
use crate::core::Result;
use crate::modules::businesses::CredentialProvider;
use crate::queue::{DeadLetterMessage, MessagePublisher, QueueMessage, RetryMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    Succeeded { invoice_no: String },
    /// Re-emitted with this attempt number
    Requeued { attempt_no: u32 },
    DeadLettered { attempt_no: u32 },
}

/// Re-runs the issuance workflow for a failed invoice after a fixed wait.
///
/// Attempts are counted on the message; once `max_attempts` is reached the
/// invoice goes to the dead-letter channel with the last error.
pub struct RetryScheduler {
    workflow: Arc<IssuanceWorkflow>,
    credentials: Arc<dyn CredentialProvider>,
    publisher: Arc<dyn MessagePublisher>,
    backoff: Duration,
    max_attempts: u32,
}

impl RetryScheduler {
    pub fn new(
        workflow: Arc<IssuanceWorkflow>,
        credentials: Arc<dyn CredentialProvider>,
        publisher: Arc<dyn MessagePublisher>,
        backoff: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            workflow,
            credentials,
            publisher,
            backoff,
            max_attempts,
        }
    }

    /// Errors only when the follow-up message cannot be published
    pub async fn retry(&self, message: RetryMessage) -> Result<RetryOutcome> {
        let invoice_no = message.calculated_invoice.invoice_no.clone();

        tracing::info!(
            invoice_no = %invoice_no,
            business_id = %message.business_id,
            attempt_no = message.attempt_no,
            backoff_secs = self.backoff.as_secs(),
            "Retrying invoice issuance"
        );

        if !self.backoff.is_zero() {
            tokio::time::sleep(self.backoff).await;
        }

        let error = match self.attempt(&message).await {
            Ok(()) => {
                tracing::info!(
                    invoice_no = %invoice_no,
                    attempt_no = message.attempt_no,
                    "Retry succeeded"
                );
                return Ok(RetryOutcome::Succeeded { invoice_no });
            }
            Err(e) => e,
        };

        if error.is_retryable() && message.attempt_no < self.max_attempts {
            let next = message.next_attempt();
            let attempt_no = next.attempt_no;

            tracing::warn!(
                invoice_no = %invoice_no,
                attempt_no,
                error = %error,
                "Retry failed, requeueing"
            );

            self.publisher.publish(QueueMessage::Retry(next)).await?;
            return Ok(RetryOutcome::Requeued { attempt_no });
        }

        let attempt_no = message.attempt_no;

        tracing::error!(
            invoice_no = %invoice_no,
            attempt_no,
            retryable = error.is_retryable(),
            error = %error,
            "Giving up on invoice, dead-lettering"
        );

        let dead_letter = DeadLetterMessage::new(
            &message.business_id,
            message.calculated_invoice,
            attempt_no,
            &error,
        );
        self.publisher
            .publish(QueueMessage::DeadLetter(dead_letter))
            .await?;

        Ok(RetryOutcome::DeadLettered { attempt_no })
    }

    async fn attempt(&self, message: &RetryMessage) -> Result<()> {
        let credential = self
            .credentials
            .get_payment_credential(&message.business_id)
            .await?;

        self.workflow
            .issue(&message.calculated_invoice, &credential, &message.business_id)
            .await
            .map(|_| ())
    }
}
