use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::{AppError, Result, TimezoneConverter};
use crate::modules::invoices::models::{CalculatedInvoice, InvoiceRequest, LineItem, MAX_AMOUNT};

const INVOICE_PREFIX: &str = "INV";
const NAME_SEGMENT_MAX: usize = 8;
const FALLBACK_NAME: &str = "GUEST";
const SUFFIX_LEN: usize = 4;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Turns a raw invoice request into a frozen, fully calculated invoice.
///
/// All amounts are rounded half-up to the currency scale at line level; the
/// aggregates are sums of the rounded line values.
pub struct InvoiceCalculator;

impl InvoiceCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Calculate totals and assign a fresh invoice number
    pub fn calculate(&self, request: &InvoiceRequest) -> Result<CalculatedInvoice> {
        self.calculate_at(request, Utc::now())
    }

    /// Same as [`calculate`](Self::calculate) with an explicit issue time
    pub fn calculate_at(
        &self,
        request: &InvoiceRequest,
        issued_at: DateTime<Utc>,
    ) -> Result<CalculatedInvoice> {
        request.validate()?;

        let currency = request.currency;
        let invoice_rate = request.tax_rate.unwrap_or(Decimal::ZERO);
        let hundred = Decimal::from(100);

        let mut items = Vec::with_capacity(request.items.len());
        for (idx, raw) in request.items.iter().enumerate() {
            let line = || format!("Line item {}", idx);

            let subtotal = Decimal::from(raw.quantity)
                .checked_mul(raw.unit_price)
                .map(|value| currency.round(value));
            let subtotal = within_limit(subtotal, || format!("{} subtotal", line()))?;

            let discount = currency.round(raw.discount_amount.unwrap_or(Decimal::ZERO));
            if discount > subtotal {
                return Err(AppError::validation(format!(
                    "Line item {} discount {} exceeds subtotal {}",
                    idx, discount, subtotal
                )));
            }

            let net_amount = subtotal - discount;
            let tax_rate = raw.tax_rate.unwrap_or(invoice_rate);
            let tax_amount = net_amount
                .checked_mul(tax_rate)
                .and_then(|value| value.checked_div(hundred))
                .map(|value| currency.round(value));
            let tax_amount = within_limit(tax_amount, || format!("{} tax", line()))?;
            let line_total =
                within_limit(net_amount.checked_add(tax_amount), || format!("{} total", line()))?;

            items.push(LineItem {
                item_name: raw.item_name.trim().to_string(),
                classification_code: raw.classification_code.clone(),
                quantity: raw.quantity,
                unit_price: raw.unit_price,
                subtotal,
                discount_amount: discount,
                net_amount,
                tax_rate,
                tax_amount,
                line_total,
            });
        }

        let total_net_amount = sum(&items, |i| i.net_amount, "Total net amount")?;
        let total_tax_amount = sum(&items, |i| i.tax_amount, "Total tax amount")?;
        let total_discount_amount = sum(&items, |i| i.discount_amount, "Total discount")?;
        let total_payable_amount = within_limit(
            total_net_amount.checked_add(total_tax_amount),
            || "Total payable amount".to_string(),
        )?;

        Ok(CalculatedInvoice {
            invoice_no: generate_invoice_no(&request.recipient.name, issued_at),
            invoice_type: request.invoice_type.clone(),
            currency,
            issued_date: issued_at,
            due_date: request.due_date,
            recipient: request.recipient.clone(),
            supplier: request.supplier.clone(),
            tax_rate: invoice_rate,
            items,
            total_net_amount,
            total_tax_amount,
            total_discount_amount,
            total_payable_amount,
            original_invoice_ref: request.original_invoice_ref.clone(),
        })
    }
}

impl Default for InvoiceCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Overflowing or out-of-range amounts are a validation error, never a panic
fn within_limit(value: Option<Decimal>, what: impl FnOnce() -> String) -> Result<Decimal> {
    match value {
        Some(value) if value <= MAX_AMOUNT => Ok(value),
        _ => Err(AppError::validation(format!(
            "{} exceeds the maximum amount {}",
            what(),
            MAX_AMOUNT
        ))),
    }
}

fn sum(items: &[LineItem], amount: impl Fn(&LineItem) -> Decimal, what: &str) -> Result<Decimal> {
    let total = items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(amount(item)));
    within_limit(total, || what.to_string())
}

/// `INV-{yyMMddHHmm}-{NAME}-{XXXX}`, timestamp in Malaysia time
pub fn generate_invoice_no(recipient_name: &str, issued_at: DateTime<Utc>) -> String {
    let stamp = TimezoneConverter::utc_to_malaysia(issued_at).format("%y%m%d%H%M");

    format!(
        "{}-{}-{}-{}",
        INVOICE_PREFIX,
        stamp,
        name_segment(recipient_name),
        random_suffix()
    )
    .to_uppercase()
}

fn name_segment(recipient_name: &str) -> String {
    let first_word = recipient_name.split_whitespace().next().unwrap_or("");
    let cleaned: String = first_word
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .take(NAME_SEGMENT_MAX)
        .collect();

    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_uppercase()
    }
}

fn random_suffix() -> String {
    let mut value = Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        out.push(BASE36[(value % 36) as usize] as char);
        value /= 36;
    }
    out
}
