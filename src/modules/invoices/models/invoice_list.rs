// Paginated invoice listing for one business, with a pending/paid summary
// over every invoice that matches the filters (not just the current page).

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::invoice::{Invoice, InvoiceStatus};
use crate::core::{AppError, Currency, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Query string of `GET /businesses/{business_id}/invoices`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListQuery {
    /// 1-based page number
    #[serde(default = "first_page")]
    pub page_index: u32,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default)]
    pub invoice_type: Option<String>,

    #[serde(default)]
    pub status: Option<InvoiceStatus>,

    /// Issued on or after this UTC date
    #[serde(default)]
    pub date_from: Option<NaiveDate>,

    /// Issued on or before this UTC date (the whole day is included)
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

impl Default for InvoiceListQuery {
    fn default() -> Self {
        Self {
            page_index: first_page(),
            page_size: DEFAULT_PAGE_SIZE,
            invoice_type: None,
            status: None,
            date_from: None,
            date_to: None,
        }
    }
}

impl InvoiceListQuery {
    pub fn validate(&self) -> Result<()> {
        if self.page_index == 0 {
            return Err(AppError::validation("pageIndex starts at 1"));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(AppError::validation(format!(
                "pageSize must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(AppError::validation("dateFrom cannot be after dateTo"));
            }
        }

        Ok(())
    }

    /// Rows to skip before the requested page
    pub fn offset(&self) -> u64 {
        u64::from(self.page_index.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// A blank `invoiceType` does not filter
    pub fn invoice_type(&self) -> Option<&str> {
        self.invoice_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn issued_from(&self) -> Option<DateTime<Utc>> {
        self.date_from
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|at| at.and_utc())
    }

    /// Exclusive upper bound: midnight after `date_to`
    pub fn issued_before(&self) -> Option<DateTime<Utc>> {
        self.date_to
            .and_then(|date| date.checked_add_days(Days::new(1)))
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|at| at.and_utc())
    }

    /// Whether an invoice of the queried business passes every filter
    pub fn matches(&self, invoice: &Invoice) -> bool {
        if let Some(invoice_type) = self.invoice_type() {
            if invoice.invoice_type != invoice_type {
                return false;
            }
        }

        if let Some(status) = self.status {
            if invoice.status != status {
                return false;
            }
        }

        if let Some(from) = self.issued_from() {
            if invoice.issued_date < from {
                return false;
            }
        }

        if let Some(before) = self.issued_before() {
            if invoice.issued_date >= before {
                return false;
            }
        }

        true
    }
}

/// One row of the listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListItem {
    pub invoice_no: String,
    pub invoice_type: String,
    pub recipient_name: String,
    pub total_payable_amount: Decimal,
    pub currency: Currency,
    pub status: InvoiceStatus,
    pub issued_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub bill_url: Option<String>,
}

impl From<Invoice> for InvoiceListItem {
    fn from(invoice: Invoice) -> Self {
        Self {
            invoice_no: invoice.invoice_no,
            invoice_type: invoice.invoice_type,
            recipient_name: invoice.recipient.name,
            total_payable_amount: invoice.total_payable_amount,
            currency: invoice.currency,
            status: invoice.status,
            issued_date: invoice.issued_date,
            due_date: invoice.due_date,
            bill_url: invoice.bill_url,
        }
    }
}

/// Outstanding and collected amounts across the filtered invoices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub pending_amount: Decimal,
    pub total_paid: Decimal,
    pub pending_count: u64,
    pub paid_count: u64,
}

impl InvoiceSummary {
    /// Fold one status group (count and payable total) into the summary
    pub fn add_group(&mut self, status: InvoiceStatus, count: u64, amount: Decimal) {
        match status {
            InvoiceStatus::Pending => {
                self.pending_count += count;
                self.pending_amount += amount;
            }
            InvoiceStatus::Paid => {
                self.paid_count += count;
                self.total_paid += amount;
            }
            InvoiceStatus::Draft | InvoiceStatus::Cancelled => {}
        }
    }
}

/// A page of invoices plus totals over all pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedInvoiceList {
    pub items: Vec<InvoiceListItem>,
    pub total_page_count: u64,
    pub total_item_count: u64,
    pub page_number: u32,
    pub page_size: u32,
    pub invoice_summary: InvoiceSummary,
}

impl PaginatedInvoiceList {
    pub fn new(
        query: &InvoiceListQuery,
        invoices: Vec<Invoice>,
        total_item_count: u64,
        invoice_summary: InvoiceSummary,
    ) -> Self {
        let page_size = u64::from(query.page_size.max(1));

        Self {
            items: invoices.into_iter().map(InvoiceListItem::from).collect(),
            total_page_count: total_item_count.div_ceil(page_size),
            total_item_count,
            page_number: query.page_index,
            page_size: query.page_size,
            invoice_summary,
        }
    }
}
