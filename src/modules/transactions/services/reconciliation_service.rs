use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::{Result, TimezoneConverter};
use crate::modules::gateways::models::BillTransaction;
use crate::modules::gateways::services::PaymentGateway;
use crate::modules::invoices::models::{Invoice, InvoiceStatus};
use crate::modules::invoices::repositories::InvoiceRepository;
use crate::modules::notifications::NotificationDispatcher;
use crate::modules::transactions::models::PaymentCallback;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// Invoice moved to a terminal status
    Settled {
        invoice_no: String,
        status: InvoiceStatus,
    },
    /// Duplicate or stray callback
    InvoiceNotFound,
    /// The gateway has no transaction for this invoice (yet)
    NoMatchingTransaction,
    /// The invoice was already in the status the gateway reports, or PAID
    AlreadySettled { status: InvoiceStatus },
}

/// Settles invoices from payment callbacks.
///
/// The callback is treated as a notification only: the outcome always comes
/// from the gateway's transaction list for the invoice's bill.
pub struct ReconciliationService {
    repository: Arc<dyn InvoiceRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifications: NotificationDispatcher,
}

impl ReconciliationService {
    pub fn new(
        repository: Arc<dyn InvoiceRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            repository,
            gateway,
            notifications,
        }
    }

    /// Only repository and gateway failures are errors; every "nothing to do"
    /// case is an outcome.
    pub async fn reconcile(&self, callback: &PaymentCallback) -> Result<ReconciliationOutcome> {
        let Some(invoice_no) = callback.invoice_no() else {
            tracing::warn!(billcode = ?callback.billcode, "Callback without order_id, ignoring");
            return Ok(ReconciliationOutcome::InvoiceNotFound);
        };

        let Some(mut invoice) = self.repository.find_by_invoice_no(invoice_no).await? else {
            tracing::warn!(invoice_no, "Callback for unknown invoice, ignoring");
            return Ok(ReconciliationOutcome::InvoiceNotFound);
        };

        if invoice.status == InvoiceStatus::Paid {
            tracing::info!(invoice_no, "Invoice already paid, ignoring callback");
            return Ok(ReconciliationOutcome::AlreadySettled {
                status: InvoiceStatus::Paid,
            });
        }

        // Only a bill this service created is ground truth; the callback's
        // bill code is never queried on its own
        let Some(bill_code) = resolve_bill_code(&invoice, callback) else {
            tracing::warn!(
                invoice_no,
                status = %invoice.status,
                reported = ?callback.billcode,
                "Invoice has no recorded bill, ignoring callback"
            );
            return Ok(ReconciliationOutcome::NoMatchingTransaction);
        };

        let transactions = self.gateway.list_transactions(&bill_code).await?;

        let Some(matched) = select_transaction(&transactions, invoice_no) else {
            tracing::warn!(
                invoice_no,
                bill_code = %bill_code,
                transactions = transactions.len(),
                "No gateway transaction references this invoice"
            );
            return Ok(ReconciliationOutcome::NoMatchingTransaction);
        };

        let status = if matched.is_success() {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Cancelled
        };

        if invoice.status == InvoiceStatus::Draft {
            // Bill recorded but issuance stopped before PENDING
            invoice = self.repository.set_pending(invoice_no).await?;
            tracing::info!(
                invoice_no,
                status = %invoice.status,
                "Completed issuance before settling"
            );
        }

        if !invoice.status.can_transition_to(status) {
            tracing::info!(
                invoice_no,
                current = %invoice.status,
                reported = %status,
                "Invoice already reflects gateway status"
            );
            return Ok(ReconciliationOutcome::AlreadySettled {
                status: invoice.status,
            });
        }

        let transaction_id = transaction_id(matched, callback, &bill_code);
        let transaction_time = transaction_time(matched, callback);

        let updated = self
            .repository
            .set_terminal(invoice_no, status, &transaction_id, transaction_time)
            .await?;

        if updated.status != status {
            // Lost a race with another callback for the same invoice
            tracing::info!(invoice_no, status = %updated.status, "Invoice settled concurrently");
            return Ok(ReconciliationOutcome::AlreadySettled {
                status: updated.status,
            });
        }

        tracing::info!(
            invoice_no,
            status = %status,
            transaction_id = %transaction_id,
            gateway_status = ?matched.payment_status,
            "Invoice reconciled"
        );

        if status == InvoiceStatus::Paid {
            self.notifications.dispatch_receipt(updated);
        }

        Ok(ReconciliationOutcome::Settled {
            invoice_no: invoice_no.to_string(),
            status,
        })
    }
}

/// The stored bill code; a differing callback bill code is only logged
fn resolve_bill_code(invoice: &Invoice, callback: &PaymentCallback) -> Option<String> {
    let stored = invoice.bill_code.as_deref()?;

    if let Some(reported) = callback.bill_code() {
        if reported != stored {
            tracing::warn!(
                invoice_no = %invoice.invoice_no,
                stored,
                reported,
                "Callback bill code differs from stored bill code"
            );
        }
    }

    Some(stored.to_string())
}

/// Transaction for this invoice; a successful attempt beats failed ones,
/// otherwise the latest attempt is used
fn select_transaction<'a>(
    transactions: &'a [BillTransaction],
    invoice_no: &str,
) -> Option<&'a BillTransaction> {
    let mut matching = transactions.iter().filter(|txn| txn.references(invoice_no));

    let mut latest = None;
    for txn in &mut matching {
        if txn.is_success() {
            return Some(txn);
        }
        latest = Some(txn);
    }
    latest
}

fn transaction_id(matched: &BillTransaction, callback: &PaymentCallback, bill_code: &str) -> String {
    [
        matched.payment_invoice_no.as_deref(),
        callback.transaction_id.as_deref(),
        callback.refno.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|id| !id.is_empty())
    .unwrap_or(bill_code)
    .to_string()
}

fn transaction_time(matched: &BillTransaction, callback: &PaymentCallback) -> DateTime<Utc> {
    [matched.payment_date.as_deref(), callback.transaction_time.as_deref()]
        .into_iter()
        .flatten()
        .find_map(TimezoneConverter::parse_gateway_time)
        .unwrap_or_else(Utc::now)
}
