use std::sync::Arc;

use crate::core::{AppError, Result};
use crate::modules::gateways::models::PaymentCredential;
use crate::modules::gateways::services::PaymentGateway;
use crate::modules::invoices::models::{CalculatedInvoice, Invoice, InvoiceStatus};
use crate::modules::invoices::repositories::InvoiceRepository;
use crate::modules::notifications::NotificationDispatcher;

/// Drives one calculated invoice from nothing to PENDING.
///
/// Steps, each skipped when the stored record shows it already happened:
/// 1. persist a DRAFT
/// 2. create the gateway bill and record its code
/// 3. DRAFT -> PENDING
/// 4. send the invoice notification (detached)
///
/// Re-running with the same calculated invoice resumes after the last
/// completed step, so a bill is never created twice for one invoice number.
pub struct IssuanceWorkflow {
    repository: Arc<dyn InvoiceRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifications: NotificationDispatcher,
}

impl IssuanceWorkflow {
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

    pub async fn issue(
        &self,
        calculated: &CalculatedInvoice,
        credential: &PaymentCredential,
        business_id: &str,
    ) -> Result<Invoice> {
        let invoice_no = calculated.invoice_no.as_str();

        let mut invoice = self.ensure_draft(calculated, business_id).await?;

        if invoice.bill_code.is_none() {
            let bill = self.gateway.create_bill(calculated, credential).await?;

            tracing::info!(
                invoice_no,
                bill_code = %bill.bill_code,
                gateway = self.gateway.name(),
                "Bill created"
            );

            invoice = self
                .repository
                .set_bill_code(invoice_no, &bill.bill_code, &bill.bill_url)
                .await?;
        } else {
            tracing::debug!(invoice_no, bill_code = ?invoice.bill_code, "Bill already exists");
        }

        if invoice.status == InvoiceStatus::Draft {
            invoice = self.repository.set_pending(invoice_no).await?;
            tracing::info!(invoice_no, status = %invoice.status, "Invoice issued");
        }

        if invoice.status.is_terminal() {
            tracing::info!(
                invoice_no,
                status = %invoice.status,
                "Invoice already settled, skipping notification"
            );
        } else {
            self.notifications.dispatch_invoice(invoice.clone());
        }

        Ok(invoice)
    }

    /// Step 1: read the stored record, creating the DRAFT when absent
    async fn ensure_draft(&self, calculated: &CalculatedInvoice, business_id: &str) -> Result<Invoice> {
        let invoice_no = calculated.invoice_no.as_str();

        if let Some(existing) = self.repository.find_by_invoice_no(invoice_no).await? {
            tracing::info!(
                invoice_no,
                status = %existing.status,
                has_bill = existing.has_bill(),
                "Resuming issuance"
            );

            return ensure_owner(existing, business_id);
        }

        match self
            .repository
            .create(&Invoice::new_draft(calculated, business_id))
            .await
        {
            Ok(created) => {
                tracing::info!(invoice_no, business_id, "Draft invoice created");
                ensure_owner(created, business_id)
            }
            Err(AppError::Conflict(_)) => {
                tracing::debug!(invoice_no, "Draft created concurrently, reading it back");
                let existing = self.repository.get_by_invoice_no(invoice_no).await?;
                ensure_owner(existing, business_id)
            }
            Err(e) => Err(e),
        }
    }
}

/// Ownership never changes; another business's number is a permanent failure
fn ensure_owner(invoice: Invoice, business_id: &str) -> Result<Invoice> {
    if invoice.business_id == business_id {
        return Ok(invoice);
    }

    tracing::error!(
        invoice_no = %invoice.invoice_no,
        owner = %invoice.business_id,
        business_id,
        "Invoice number belongs to another business"
    );

    Err(AppError::validation(format!(
        "Invoice '{}' belongs to another business",
        invoice.invoice_no
    )))
}
