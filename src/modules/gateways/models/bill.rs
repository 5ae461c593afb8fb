use serde::{Deserialize, Serialize};

/// ToyyibPay reports a successful payment with this status code
pub const PAYMENT_STATUS_SUCCESS: &str = "1";

/// A bill created on the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub bill_code: String,
    /// Hosted payment page for the customer
    pub bill_url: String,
}

/// One payment attempt against a bill, as reported by `getBillTransactions`.
///
/// This list is the authority on whether an invoice was paid; webhook
/// payloads are only a hint to come and look.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillTransaction {
    #[serde(rename = "billExternalReferenceNo", default)]
    pub external_reference_no: Option<String>,

    /// "1" success, "2" pending, "3" failed
    #[serde(rename = "billpaymentStatus", default)]
    pub payment_status: Option<String>,

    /// Gateway-side transaction reference
    #[serde(rename = "billpaymentInvoiceNo", default)]
    pub payment_invoice_no: Option<String>,

    #[serde(rename = "billPaymentDate", default)]
    pub payment_date: Option<String>,

    #[serde(rename = "billpaymentAmount", default)]
    pub payment_amount: Option<String>,

    #[serde(rename = "billpaymentChannel", default)]
    pub payment_channel: Option<String>,
}

impl BillTransaction {
    pub fn is_success(&self) -> bool {
        self.payment_status.as_deref().map(str::trim) == Some(PAYMENT_STATUS_SUCCESS)
    }

    pub fn references(&self, invoice_no: &str) -> bool {
        self.external_reference_no.as_deref().map(str::trim) == Some(invoice_no)
    }
}

/// Per-business gateway keys
#[derive(Clone, PartialEq)]
pub struct PaymentCredential {
    pub secret_key: String,
    pub category_code: String,
}

impl std::fmt::Debug for PaymentCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentCredential")
            .field("secret_key", &"[REDACTED]")
            .field("category_code", &self.category_code)
            .finish()
    }
}
