use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::invoices::models::{CalculatedInvoice, InvoiceRequest};
use crate::modules::transactions::models::PaymentCallback;

/// Named queue channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "invoice-batch-submit")]
    BatchSubmit,
    #[serde(rename = "invoice-retry")]
    Retry,
    #[serde(rename = "invoice-dead-letter")]
    DeadLetter,
    #[serde(rename = "payment-callback-submit")]
    PaymentCallback,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::BatchSubmit,
        Channel::Retry,
        Channel::DeadLetter,
        Channel::PaymentCallback,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::BatchSubmit => "invoice-batch-submit",
            Channel::Retry => "invoice-retry",
            Channel::DeadLetter => "invoice-dead-letter",
            Channel::PaymentCallback => "payment-callback-submit",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A batch of raw invoice requests for one business
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSubmission {
    pub business_id: String,
    pub requests: Vec<InvoiceRequest>,
}

/// One failed issuance waiting for another attempt.
///
/// The calculated invoice is carried as-is, so every attempt reuses the
/// same invoice number and totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryMessage {
    pub business_id: String,
    pub calculated_invoice: CalculatedInvoice,
    /// 1 for the first retry
    pub attempt_no: u32,
}

impl RetryMessage {
    pub fn first(business_id: &str, calculated_invoice: CalculatedInvoice) -> Self {
        Self {
            business_id: business_id.to_string(),
            calculated_invoice,
            attempt_no: 1,
        }
    }

    pub fn next_attempt(self) -> Self {
        Self {
            attempt_no: self.attempt_no + 1,
            ..self
        }
    }
}

/// An issuance that will not be retried again; needs manual resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterMessage {
    pub business_id: String,
    pub calculated_invoice: CalculatedInvoice,
    /// Last retry attempt made; 0 when the batch dead-lettered it directly
    pub attempt_no: u32,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

impl DeadLetterMessage {
    pub fn new(
        business_id: &str,
        calculated_invoice: CalculatedInvoice,
        attempt_no: u32,
        error: &AppError,
    ) -> Self {
        Self {
            business_id: business_id.to_string(),
            calculated_invoice,
            attempt_no,
            error: error.to_string(),
            failed_at: Utc::now(),
        }
    }
}

/// Everything that travels over the broker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum QueueMessage {
    BatchSubmission(BatchSubmission),
    Retry(RetryMessage),
    DeadLetter(DeadLetterMessage),
    PaymentCallback(PaymentCallback),
}

impl QueueMessage {
    pub fn channel(&self) -> Channel {
        match self {
            QueueMessage::BatchSubmission(_) => Channel::BatchSubmit,
            QueueMessage::Retry(_) => Channel::Retry,
            QueueMessage::DeadLetter(_) => Channel::DeadLetter,
            QueueMessage::PaymentCallback(_) => Channel::PaymentCallback,
        }
    }
}

/// Wire form of a message: the body is serialized JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub id: Uuid,
    pub channel: Channel,
    pub published_at: DateTime<Utc>,
    pub body: String,
}

impl Envelope {
    pub fn seal(message: &QueueMessage) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            channel: message.channel(),
            published_at: Utc::now(),
            body: serde_json::to_string(message)?,
        })
    }

    pub fn open(&self) -> Result<QueueMessage> {
        let message: QueueMessage = serde_json::from_str(&self.body)?;

        if message.channel() != self.channel {
            return Err(AppError::queue(format!(
                "Message {} of type {} arrived on {}",
                self.id,
                message.channel(),
                self.channel
            )));
        }

        Ok(message)
    }
}
