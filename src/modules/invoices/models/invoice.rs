// Invoice record and its status lifecycle.
//
// DRAFT -> PENDING once a bill exists; PENDING -> PAID | CANCELLED only
// through payment reconciliation. The financial snapshot is written once
// at creation and never recomputed.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calculated_invoice::{CalculatedInvoice, Recipient, Supplier};
use super::line_item::LineItem;
use crate::core::Currency;

/// Invoice status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    /// Persisted, bill not yet confirmed
    Draft,

    /// Bill created, awaiting payment
    Pending,

    /// Gateway confirmed a successful payment
    Paid,

    /// Gateway reported the payment attempt as failed
    Cancelled,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Draft
    }
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    /// Allowed transitions. PAID is absorbing; CANCELLED may still become PAID
    /// when the gateway later reports a successful attempt on the same bill.
    /// A DRAFT has to reach PENDING before it can settle.
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, next),
            (Draft, Pending) | (Pending, Paid) | (Pending, Cancelled) | (Cancelled, Paid)
        )
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(InvoiceStatus::Draft),
            "PENDING" => Ok(InvoiceStatus::Pending),
            "PAID" => Ok(InvoiceStatus::Paid),
            "CANCELLED" => Ok(InvoiceStatus::Cancelled),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// A persisted invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Stable key, shared by every retry of the same logical invoice
    pub invoice_no: String,

    /// Owning business; immutable after creation
    pub business_id: String,

    pub invoice_type: String,
    pub currency: Currency,
    pub status: InvoiceStatus,
    pub issued_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub recipient: Recipient,
    pub supplier: Supplier,
    pub items: Vec<LineItem>,
    pub tax_rate: Decimal,

    pub total_net_amount: Decimal,
    pub total_tax_amount: Decimal,
    pub total_discount_amount: Decimal,
    pub total_payable_amount: Decimal,

    /// Set exactly once, when the gateway bill is created
    pub bill_code: Option<String>,
    pub bill_url: Option<String>,

    /// Set by reconciliation
    pub transaction_id: Option<String>,
    pub transaction_time: Option<DateTime<Utc>>,

    pub original_invoice_ref: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Build the DRAFT record for a calculated invoice
    pub fn new_draft(calculated: &CalculatedInvoice, business_id: &str) -> Self {
        let now = Utc::now();

        Self {
            invoice_no: calculated.invoice_no.clone(),
            business_id: business_id.to_string(),
            invoice_type: calculated.invoice_type.clone(),
            currency: calculated.currency,
            status: InvoiceStatus::Draft,
            issued_date: calculated.issued_date,
            due_date: calculated.due_date,
            recipient: calculated.recipient.clone(),
            supplier: calculated.supplier.clone(),
            items: calculated.items.clone(),
            tax_rate: calculated.tax_rate,
            total_net_amount: calculated.total_net_amount,
            total_tax_amount: calculated.total_tax_amount,
            total_discount_amount: calculated.total_discount_amount,
            total_payable_amount: calculated.total_payable_amount,
            bill_code: None,
            bill_url: None,
            transaction_id: None,
            transaction_time: None,
            original_invoice_ref: calculated.original_invoice_ref.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_bill(&self) -> bool {
        self.bill_code.is_some()
    }

    /// Record the gateway bill. A no-op when a bill is already recorded.
    pub fn apply_bill(&mut self, bill_code: &str, bill_url: &str) -> bool {
        if self.bill_code.is_some() {
            return false;
        }

        self.bill_code = Some(bill_code.to_string());
        self.bill_url = Some(bill_url.to_string());
        self.updated_at = Utc::now();
        true
    }

    /// DRAFT -> PENDING, only once a bill exists
    pub fn mark_pending(&mut self) -> bool {
        if self.status != InvoiceStatus::Draft || self.bill_code.is_none() {
            return false;
        }

        self.status = InvoiceStatus::Pending;
        self.updated_at = Utc::now();
        true
    }

    /// Move to PAID or CANCELLED, recording the settling transaction
    pub fn mark_terminal(
        &mut self,
        status: InvoiceStatus,
        transaction_id: &str,
        transaction_time: DateTime<Utc>,
    ) -> bool {
        if !status.is_terminal()
            || self.bill_code.is_none()
            || !self.status.can_transition_to(status)
        {
            return false;
        }

        self.status = status;
        self.transaction_id = Some(transaction_id.to_string());
        self.transaction_time = Some(transaction_time);
        self.updated_at = Utc::now();
        true
    }
}
