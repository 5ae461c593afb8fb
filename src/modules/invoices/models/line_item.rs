// Line items: the raw request shape and the frozen, calculated shape.
//
// A calculated line item is never recomputed after the invoice is created;
// it is the snapshot of what was billed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Result};

/// Maximum tax rate, in percent
const MAX_TAX_RATE: i64 = 100;

/// Largest amount a stored money column holds (DECIMAL(15, 2))
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, 2);

/// A line item as submitted by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    /// Description of the product or service
    pub item_name: String,

    /// Quantity of items (must be positive)
    pub quantity: u32,

    /// Price per unit
    pub unit_price: Decimal,

    /// Line tax rate in percent; falls back to the invoice-level rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Decimal>,

    /// Flat discount on this line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<Decimal>,

    /// E-invoice classification code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_code: Option<String>,
}

impl LineItemRequest {
    /// Validate the raw values (the discount bound is checked once the subtotal is known)
    pub fn validate(&self, index: usize) -> Result<()> {
        if self.item_name.trim().is_empty() {
            return Err(AppError::validation(format!(
                "Line item {} name cannot be empty",
                index
            )));
        }

        if self.item_name.len() > 255 {
            return Err(AppError::validation(format!(
                "Line item {} name cannot exceed 255 characters",
                index
            )));
        }

        if self.quantity == 0 {
            return Err(AppError::validation(format!(
                "Line item {} quantity must be positive",
                index
            )));
        }

        if self.unit_price < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Line item {} unit price must be non-negative, got: {}",
                index, self.unit_price
            )));
        }

        if self.unit_price > MAX_AMOUNT {
            return Err(AppError::validation(format!(
                "Line item {} unit price cannot exceed {}",
                index, MAX_AMOUNT
            )));
        }

        if let Some(rate) = self.tax_rate {
            validate_tax_rate(rate)?;
        }

        if let Some(discount) = self.discount_amount {
            if discount < Decimal::ZERO {
                return Err(AppError::validation(format!(
                    "Line item {} discount cannot be negative",
                    index
                )));
            }

            if discount > MAX_AMOUNT {
                return Err(AppError::validation(format!(
                    "Line item {} discount cannot exceed {}",
                    index, MAX_AMOUNT
                )));
            }
        }

        Ok(())
    }
}

/// Tax rate is a percentage in [0, 100]
pub fn validate_tax_rate(rate: Decimal) -> Result<()> {
    if rate < Decimal::ZERO {
        return Err(AppError::validation("Tax rate cannot be negative"));
    }

    if rate > Decimal::from(MAX_TAX_RATE) {
        return Err(AppError::validation("Tax rate cannot exceed 100%"));
    }

    Ok(())
}

/// A calculated line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub item_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_code: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// round(quantity × unit_price)
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    /// subtotal − discount
    pub net_amount: Decimal,
    /// Effective rate in percent
    pub tax_rate: Decimal,
    /// round(net × tax_rate / 100)
    pub tax_amount: Decimal,
    /// net + tax
    pub line_total: Decimal,
}
