use async_trait::async_trait;

use crate::core::Result;
use crate::modules::invoices::models::Invoice;

/// Delivers customer-facing invoice and receipt messages
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Sent once the invoice is PENDING and has a payment link
    async fn send_invoice_notification(&self, invoice: &Invoice) -> Result<()>;

    /// Sent once the invoice is PAID
    async fn send_receipt_notification(&self, invoice: &Invoice) -> Result<()>;
}

/// Writes notifications to the log instead of a mail provider
#[derive(Debug, Default, Clone)]
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send_invoice_notification(&self, invoice: &Invoice) -> Result<()> {
        tracing::info!(
            invoice_no = %invoice.invoice_no,
            recipient = ?invoice.recipient.email,
            amount = %invoice.currency.format_amount(invoice.total_payable_amount),
            bill_url = ?invoice.bill_url,
            "Invoice notification sent"
        );
        Ok(())
    }

    async fn send_receipt_notification(&self, invoice: &Invoice) -> Result<()> {
        tracing::info!(
            invoice_no = %invoice.invoice_no,
            recipient = ?invoice.recipient.email,
            transaction_id = ?invoice.transaction_id,
            "Receipt notification sent"
        );
        Ok(())
    }
}
