use crate::core::{Currency, Result};
use crate::modules::gateways::models::{Bill, BillTransaction, PaymentCredential};
use crate::modules::invoices::models::CalculatedInvoice;
use async_trait::async_trait;

/// Payment gateway trait for creating bills and reading back their payments
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a bill for the invoice and return its code and payment URL.
    ///
    /// The invoice number is sent as the bill's external reference so that
    /// transactions can be matched back to the invoice later.
    async fn create_bill(
        &self,
        invoice: &CalculatedInvoice,
        credential: &PaymentCredential,
    ) -> Result<Bill>;

    /// Authoritative list of payment attempts for a bill
    async fn list_transactions(&self, bill_code: &str) -> Result<Vec<BillTransaction>>;

    /// Get gateway name
    fn name(&self) -> &str;

    /// Check if gateway supports a currency
    fn supports_currency(&self, currency: Currency) -> bool;
}
