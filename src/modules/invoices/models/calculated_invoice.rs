use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::line_item::{validate_tax_rate, LineItem, LineItemRequest};
use crate::core::{AppError, Currency, Result};

/// Standard invoice type code
pub const DEFAULT_INVOICE_TYPE: &str = "01";

fn default_invoice_type() -> String {
    DEFAULT_INVOICE_TYPE.to_string()
}

/// Buyer details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tin: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

/// Seller details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub name: String,
    #[serde(default)]
    pub tin: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub msic_code: Option<String>,
    #[serde(default)]
    pub business_activity_description: Option<String>,
}

/// A raw invoice request, one element of a batch submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    #[serde(default = "default_invoice_type")]
    pub invoice_type: String,

    #[serde(default)]
    pub currency: Currency,

    pub due_date: NaiveDate,

    /// Invoice-level tax rate in percent, used by lines without their own rate
    #[serde(default)]
    pub tax_rate: Option<Decimal>,

    pub recipient: Recipient,

    pub supplier: Supplier,

    pub items: Vec<LineItemRequest>,

    /// Reference to the invoice this one amends (credit/debit notes)
    #[serde(default)]
    pub original_invoice_ref: Option<String>,
}

impl InvoiceRequest {
    /// Validate everything that does not depend on calculated amounts
    pub fn validate(&self) -> Result<()> {
        if self.recipient.name.trim().is_empty() {
            return Err(AppError::validation("Recipient name cannot be empty"));
        }

        if self.supplier.name.trim().is_empty() {
            return Err(AppError::validation("Supplier name cannot be empty"));
        }

        if self.items.is_empty() {
            return Err(AppError::validation(
                "Invoice must have at least one line item",
            ));
        }

        if let Some(rate) = self.tax_rate {
            validate_tax_rate(rate)?;
        }

        for (idx, item) in self.items.iter().enumerate() {
            item.validate(idx)?;
        }

        Ok(())
    }
}

/// The frozen calculator output.
///
/// Carries the `invoice_no` that ties every retry of one logical invoice
/// together; it is serialized into retry and dead-letter messages as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedInvoice {
    pub invoice_no: String,
    pub invoice_type: String,
    pub currency: Currency,
    pub issued_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub recipient: Recipient,
    pub supplier: Supplier,
    pub tax_rate: Decimal,
    pub items: Vec<LineItem>,
    pub total_net_amount: Decimal,
    pub total_tax_amount: Decimal,
    pub total_discount_amount: Decimal,
    pub total_payable_amount: Decimal,
    #[serde(default)]
    pub original_invoice_ref: Option<String>,
}

impl CalculatedInvoice {
    /// Comma-separated item names, used for bill descriptions
    pub fn item_summary(&self) -> String {
        self.items
            .iter()
            .map(|item| item.item_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
