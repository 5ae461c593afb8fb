use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::gateways::models::PaymentCredential;

/// Source of per-business gateway credentials
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Errors with `Configuration` when the business is unknown or has not
    /// finished its payment setup; retrying cannot fix either.
    async fn get_payment_credential(&self, business_id: &str) -> Result<PaymentCredential>;
}

/// Reads credentials from the `business_information` table
pub struct MySqlCredentialProvider {
    pool: MySqlPool,
}

impl MySqlCredentialProvider {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    category_code: Option<String>,
    user_secret_key: Option<String>,
}

#[async_trait]
impl CredentialProvider for MySqlCredentialProvider {
    async fn get_payment_credential(&self, business_id: &str) -> Result<PaymentCredential> {
        tracing::debug!(business_id, "Looking up payment credential");

        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT category_code, user_secret_key
            FROM business_information
            WHERE id = ?
            "#,
        )
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch payment credential: {}", e)))?;

        let row = row.ok_or_else(|| {
            AppError::configuration(format!("Business '{}' does not exist", business_id))
        })?;

        credential_from_parts(business_id, row.user_secret_key, row.category_code)
    }
}

fn credential_from_parts(
    business_id: &str,
    secret_key: Option<String>,
    category_code: Option<String>,
) -> Result<PaymentCredential> {
    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    match (non_blank(secret_key), non_blank(category_code)) {
        (Some(secret_key), Some(category_code)) => Ok(PaymentCredential {
            secret_key,
            category_code,
        }),
        _ => Err(AppError::configuration(format!(
            "Business '{}' has no payment integration configured",
            business_id
        ))),
    }
}
