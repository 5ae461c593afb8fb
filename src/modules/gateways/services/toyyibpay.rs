use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::Value;

use super::gateway_trait::PaymentGateway;
use crate::config::ToyyibPayConfig;
use crate::core::{AppError, Currency, Result, TimezoneConverter};
use crate::modules::gateways::models::{Bill, BillTransaction, PaymentCredential};
use crate::modules::invoices::models::CalculatedInvoice;

const BILL_NAME_MAX: usize = 30;
const BILL_DESCRIPTION_MAX: usize = 100;
const BILL_TO_MAX: usize = 50;

/// Fixed amount
const PRICE_SETTING_FIXED: &str = "1";
/// Ask the payer for their details
const PAYOR_INFO_REQUIRED: &str = "1";
/// FPX and card
const PAYMENT_CHANNEL_ALL: &str = "2";

/// ToyyibPay client. Form-encoded requests, JSON responses.
pub struct ToyyibPayClient {
    client: Client,
    base_url: String,
    return_url: String,
    callback_url: String,
}

impl ToyyibPayClient {
    pub fn new(config: &ToyyibPayConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            return_url: config.return_url.clone(),
            callback_url: config.callback_url.clone(),
        })
    }

    fn payment_url(&self, bill_code: &str) -> String {
        format!("{}/{}", self.base_url, bill_code)
    }

    /// Form fields for `createBill`
    fn bill_form(
        &self,
        invoice: &CalculatedInvoice,
        credential: &PaymentCredential,
    ) -> Result<Vec<(&'static str, String)>> {
        let amount_in_cents = invoice
            .currency
            .to_minor_units(invoice.total_payable_amount)
            .to_i64()
            .ok_or_else(|| {
                AppError::validation(format!(
                    "Invoice {} amount {} cannot be billed",
                    invoice.invoice_no, invoice.total_payable_amount
                ))
            })?;

        let recipient = &invoice.recipient;

        Ok(vec![
            ("userSecretKey", credential.secret_key.clone()),
            ("categoryCode", credential.category_code.clone()),
            ("billName", bill_name(&invoice.invoice_no)),
            (
                "billDescription",
                sanitize(
                    &format!(
                        "Payment for {} - Invoice {}",
                        invoice.item_summary(),
                        invoice.invoice_no
                    ),
                    BILL_DESCRIPTION_MAX,
                    true,
                ),
            ),
            ("billPriceSetting", PRICE_SETTING_FIXED.to_string()),
            ("billPayorInfo", PAYOR_INFO_REQUIRED.to_string()),
            ("billAmount", amount_in_cents.to_string()),
            ("billReturnUrl", self.return_url.clone()),
            ("billCallbackUrl", self.callback_url.clone()),
            ("billExternalReferenceNo", invoice.invoice_no.clone()),
            ("billTo", sanitize(&recipient.name, BILL_TO_MAX, false)),
            ("billEmail", recipient.email.clone().unwrap_or_default()),
            (
                "billPhone",
                format_phone(recipient.phone.as_deref().unwrap_or_default()),
            ),
            ("billSplitPayment", "0".to_string()),
            ("billPaymentChannel", PAYMENT_CHANNEL_ALL.to_string()),
            ("billDisplayMerchant", "1".to_string()),
            ("billContentEmail", email_content(invoice)),
        ])
    }

    async fn post_form(&self, path: &str, form: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}/index.php/api/{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("ToyyibPay API error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "ToyyibPay API error {}: {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to parse ToyyibPay response: {}", e)))
    }
}

#[derive(Deserialize)]
struct CreateBillResponse {
    #[serde(rename = "BillCode")]
    bill_code: String,
}

#[async_trait]
impl PaymentGateway for ToyyibPayClient {
    async fn create_bill(
        &self,
        invoice: &CalculatedInvoice,
        credential: &PaymentCredential,
    ) -> Result<Bill> {
        if !self.supports_currency(invoice.currency) {
            return Err(AppError::validation(format!(
                "ToyyibPay does not support {}",
                invoice.currency
            )));
        }

        let form = self.bill_form(invoice, credential)?;
        let body = self.post_form("createBill", &form).await?;

        // Success is a one-element array
        let created = match body {
            Value::Array(mut items) if !items.is_empty() => {
                serde_json::from_value::<CreateBillResponse>(items.swap_remove(0)).map_err(
                    |e| AppError::Gateway(format!("Invalid ToyyibPay createBill response: {}", e)),
                )?
            }
            other => {
                return Err(AppError::Gateway(format!(
                    "ToyyibPay rejected bill for {}: {}",
                    invoice.invoice_no, other
                )))
            }
        };

        if created.bill_code.trim().is_empty() {
            return Err(AppError::gateway("ToyyibPay returned an empty bill code"));
        }

        tracing::info!(
            invoice_no = %invoice.invoice_no,
            bill_code = %created.bill_code,
            "ToyyibPay bill created"
        );

        Ok(Bill {
            bill_url: self.payment_url(&created.bill_code),
            bill_code: created.bill_code,
        })
    }

    async fn list_transactions(&self, bill_code: &str) -> Result<Vec<BillTransaction>> {
        let form = [("billCode", bill_code.to_string())];
        let body = self.post_form("getBillTransactions", &form).await?;

        match body {
            Value::Array(_) => serde_json::from_value(body).map_err(|e| {
                AppError::Gateway(format!("Invalid ToyyibPay transaction list: {}", e))
            }),
            other => Err(AppError::Gateway(format!(
                "Unexpected ToyyibPay transaction response for {}: {}",
                bill_code, other
            ))),
        }
    }

    fn name(&self) -> &str {
        "toyyibpay"
    }

    fn supports_currency(&self, currency: Currency) -> bool {
        currency == Currency::MYR
    }
}

fn bill_name(invoice_no: &str) -> String {
    let tail_start = invoice_no
        .char_indices()
        .rev()
        .nth(19)
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    sanitize(&format!("INV {}", &invoice_no[tail_start..]), BILL_NAME_MAX, true)
}

/// Keep ASCII alphanumerics and whitespace (plus `_` when allowed), then cut to `max`
fn sanitize(input: &str, max: usize, allow_underscore: bool) -> String {
    input
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric() || c.is_whitespace() || (allow_underscore && *c == '_')
        })
        .take(max)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Digits only, Malaysian country code in front of local numbers
fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.strip_prefix('0') {
        Some(rest) => format!("60{}", rest),
        None => digits,
    }
}

fn email_content(invoice: &CalculatedInvoice) -> String {
    let currency = invoice.currency;
    let items = invoice
        .items
        .iter()
        .map(|item| {
            format!(
                "{} x{}: {}",
                item.item_name,
                item.quantity,
                currency.format_amount(item.line_total)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let issued = TimezoneConverter::utc_to_malaysia(invoice.issued_date).format("%d %b %Y %H:%M");

    format!(
        "Invoice No: {}\nIssued: {}\nDue: {}\n\n{}\n\nSubtotal: {}\nTax: {}\nTotal: {}\n\nFrom: {}",
        invoice.invoice_no,
        issued,
        invoice.due_date.format("%d %b %Y"),
        items,
        currency.format_amount(invoice.total_net_amount),
        currency.format_amount(invoice.total_tax_amount),
        currency.format_amount(invoice.total_payable_amount),
        invoice.supplier.name
    )
}
