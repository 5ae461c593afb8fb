// ToyyibPay callback payload.
//
// The callback only tells us *which* invoice to look at. Its status fields
// are never trusted for settlement; reconciliation re-reads the gateway.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Callback form posted by ToyyibPay to the callback URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentCallback {
    #[serde(default, deserialize_with = "lenient_string")]
    pub refno: Option<String>,

    /// "1" success, "2" pending, "3" failed (informational only)
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub reason: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub billcode: Option<String>,

    /// Our invoice number, echoed back as the bill's external reference
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub status_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub msg: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub transaction_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub fpx_transaction_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub hash: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub transaction_time: Option<String>,
}

impl PaymentCallback {
    /// Parse a raw callback body: form-encoded first, JSON as a fallback
    pub fn from_body(body: &[u8]) -> Option<Self> {
        serde_urlencoded::from_bytes::<Self>(body)
            .ok()
            .filter(|callback| !callback.is_empty())
            .or_else(|| serde_json::from_slice::<Self>(body).ok())
    }

    /// Invoice number the callback refers to, if any
    pub fn invoice_no(&self) -> Option<&str> {
        non_blank(&self.order_id)
    }

    pub fn bill_code(&self) -> Option<&str> {
        non_blank(&self.billcode)
    }

    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Accept strings and numbers alike; blank values become `None`
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
