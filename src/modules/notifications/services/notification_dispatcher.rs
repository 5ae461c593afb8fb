use std::sync::Arc;

use tokio::task::JoinHandle;

use super::notification_sender::NotificationSender;
use crate::modules::invoices::models::Invoice;

/// Fires notifications on detached tasks.
///
/// A failed send is logged and dropped; it never reaches the caller and never
/// rolls back an invoice state change.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn NotificationSender>,
}

#[derive(Debug, Clone, Copy)]
enum NotificationKind {
    Invoice,
    Receipt,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn NotificationSender>) -> Self {
        Self { sender }
    }

    pub fn dispatch_invoice(&self, invoice: Invoice) -> JoinHandle<()> {
        self.spawn(NotificationKind::Invoice, invoice)
    }

    pub fn dispatch_receipt(&self, invoice: Invoice) -> JoinHandle<()> {
        self.spawn(NotificationKind::Receipt, invoice)
    }

    fn spawn(&self, kind: NotificationKind, invoice: Invoice) -> JoinHandle<()> {
        let sender = Arc::clone(&self.sender);

        tokio::spawn(async move {
            let result = match kind {
                NotificationKind::Invoice => sender.send_invoice_notification(&invoice).await,
                NotificationKind::Receipt => sender.send_receipt_notification(&invoice).await,
            };

            if let Err(e) = result {
                tracing::warn!(
                    invoice_no = %invoice.invoice_no,
                    kind = ?kind,
                    error = %e,
                    "Notification failed"
                );
            }
        })
    }
}
