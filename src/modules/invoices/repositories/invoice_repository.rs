// Invoice persistence.
//
// Every mutation is a conditional single-row update followed by a re-read,
// so a repeated call is a no-op that still returns the current record.
// Callers act on the returned record, never on their own copy.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use std::str::FromStr;

use crate::core::{AppError, Currency, Result};
use crate::modules::invoices::models::{
    Invoice, InvoiceListQuery, InvoiceStatus, InvoiceSummary, LineItem, PaginatedInvoiceList,
    Recipient, Supplier,
};

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn find_by_invoice_no(&self, invoice_no: &str) -> Result<Option<Invoice>>;

    /// Like `find_by_invoice_no`, but a miss is `AppError::NotFound`
    async fn get_by_invoice_no(&self, invoice_no: &str) -> Result<Invoice> {
        self.find_by_invoice_no(invoice_no)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice '{}' not found", invoice_no)))
    }

    /// Insert a DRAFT invoice. A duplicate key yields the existing record.
    async fn create(&self, invoice: &Invoice) -> Result<Invoice>;

    /// Record the gateway bill if none is recorded yet
    async fn set_bill_code(&self, invoice_no: &str, bill_code: &str, bill_url: &str)
        -> Result<Invoice>;

    /// DRAFT -> PENDING if the invoice is still a draft with a bill
    async fn set_pending(&self, invoice_no: &str) -> Result<Invoice>;

    /// Move to PAID or CANCELLED if the transition is allowed and a bill is recorded
    async fn set_terminal(
        &self,
        invoice_no: &str,
        status: InvoiceStatus,
        transaction_id: &str,
        transaction_time: DateTime<Utc>,
    ) -> Result<Invoice>;

    /// One page of a business's invoices, newest first, with the pending/paid
    /// summary over every matching invoice
    async fn list_by_business(
        &self,
        business_id: &str,
        query: &InvoiceListQuery,
    ) -> Result<PaginatedInvoiceList>;
}

/// MySQL-backed invoice repository
pub struct MySqlInvoiceRepository {
    pool: MySqlPool,
}

impl MySqlInvoiceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

macro_rules! invoice_columns {
    () => {
        r#"
        invoice_no, business_id, invoice_type, currency, status,
        issued_date, due_date, recipient, supplier, items, tax_rate,
        total_net_amount, total_tax_amount, total_discount_amount, total_payable_amount,
        bill_code, bill_url, transaction_id, transaction_time,
        original_invoice_ref, created_at, updated_at
        "#
    };
}

const SELECT_INVOICE: &str = concat!(
    "SELECT ",
    invoice_columns!(),
    " FROM invoices WHERE invoice_no = ?"
);

/// WHERE clause shared by the listing page and its summary
fn push_list_filters(builder: &mut QueryBuilder<'_, MySql>, business_id: &str, query: &InvoiceListQuery) {
    builder
        .push(" WHERE business_id = ")
        .push_bind(business_id.to_string());

    if let Some(invoice_type) = query.invoice_type() {
        builder
            .push(" AND invoice_type = ")
            .push_bind(invoice_type.to_string());
    }

    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }

    if let Some(from) = query.issued_from() {
        builder.push(" AND issued_date >= ").push_bind(from);
    }

    if let Some(before) = query.issued_before() {
        builder.push(" AND issued_date < ").push_bind(before);
    }
}

#[async_trait]
impl InvoiceRepository for MySqlInvoiceRepository {
    async fn find_by_invoice_no(&self, invoice_no: &str) -> Result<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>(SELECT_INVOICE)
            .bind(invoice_no)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to fetch invoice: {}", e)))?;

        row.map(InvoiceRow::into_invoice).transpose()
    }

    async fn create(&self, invoice: &Invoice) -> Result<Invoice> {
        let result = sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_no, business_id, invoice_type, currency, status,
                issued_date, due_date, recipient, supplier, items, tax_rate,
                total_net_amount, total_tax_amount, total_discount_amount, total_payable_amount,
                original_invoice_ref, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&invoice.invoice_no)
        .bind(&invoice.business_id)
        .bind(&invoice.invoice_type)
        .bind(invoice.currency.to_string())
        .bind(InvoiceStatus::Draft.as_str())
        .bind(invoice.issued_date)
        .bind(invoice.due_date)
        .bind(Json(&invoice.recipient))
        .bind(Json(&invoice.supplier))
        .bind(Json(&invoice.items))
        .bind(invoice.tax_rate)
        .bind(invoice.total_net_amount)
        .bind(invoice.total_tax_amount)
        .bind(invoice.total_discount_amount)
        .bind(invoice.total_payable_amount)
        .bind(&invoice.original_invoice_ref)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(e) => {
                let duplicate = e
                    .as_database_error()
                    .map(|db_err| db_err.is_unique_violation())
                    .unwrap_or(false);

                if !duplicate {
                    return Err(AppError::Internal(format!("Failed to create invoice: {}", e)));
                }

                tracing::debug!(
                    invoice_no = %invoice.invoice_no,
                    "Invoice already exists, reading existing record"
                );
            }
        }

        self.get_by_invoice_no(&invoice.invoice_no).await
    }

    async fn set_bill_code(
        &self,
        invoice_no: &str,
        bill_code: &str,
        bill_url: &str,
    ) -> Result<Invoice> {
        sqlx::query(
            r#"
            UPDATE invoices
            SET bill_code = ?, bill_url = ?, updated_at = UTC_TIMESTAMP()
            WHERE invoice_no = ? AND bill_code IS NULL
            "#,
        )
        .bind(bill_code)
        .bind(bill_url)
        .bind(invoice_no)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update bill code: {}", e)))?;

        self.get_by_invoice_no(invoice_no).await
    }

    async fn set_pending(&self, invoice_no: &str) -> Result<Invoice> {
        sqlx::query(
            r#"
            UPDATE invoices
            SET status = 'PENDING', updated_at = UTC_TIMESTAMP()
            WHERE invoice_no = ? AND status = 'DRAFT' AND bill_code IS NOT NULL
            "#,
        )
        .bind(invoice_no)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update invoice status: {}", e)))?;

        self.get_by_invoice_no(invoice_no).await
    }

    async fn set_terminal(
        &self,
        invoice_no: &str,
        status: InvoiceStatus,
        transaction_id: &str,
        transaction_time: DateTime<Utc>,
    ) -> Result<Invoice> {
        let guard = match status {
            InvoiceStatus::Paid => "status IN ('PENDING', 'CANCELLED')",
            InvoiceStatus::Cancelled => "status = 'PENDING'",
            other => {
                return Err(AppError::validation(format!(
                    "{} is not a terminal status",
                    other
                )))
            }
        };

        let sql = format!(
            r#"
            UPDATE invoices
            SET status = ?, transaction_id = ?, transaction_time = ?, updated_at = UTC_TIMESTAMP()
            WHERE invoice_no = ? AND bill_code IS NOT NULL AND {}
            "#,
            guard
        );

        sqlx::query(&sql)
            .bind(status.as_str())
            .bind(transaction_id)
            .bind(transaction_time)
            .bind(invoice_no)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to settle invoice: {}", e)))?;

        self.get_by_invoice_no(invoice_no).await
    }

    async fn list_by_business(
        &self,
        business_id: &str,
        query: &InvoiceListQuery,
    ) -> Result<PaginatedInvoiceList> {
        let mut totals = QueryBuilder::<MySql>::new(
            "SELECT status, COUNT(*) AS invoice_count, \
             COALESCE(SUM(total_payable_amount), 0) AS total_amount FROM invoices",
        );
        push_list_filters(&mut totals, business_id, query);
        totals.push(" GROUP BY status");

        let groups = totals
            .build_query_as::<StatusTotalRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to summarize invoices: {}", e)))?;

        let mut summary = InvoiceSummary::default();
        let mut total_item_count = 0u64;
        for group in groups {
            let status = InvoiceStatus::from_str(&group.status)
                .map_err(|e| AppError::Internal(format!("Invalid status in database: {}", e)))?;
            let count = u64::try_from(group.invoice_count).unwrap_or(0);

            total_item_count += count;
            summary.add_group(status, count, group.total_amount);
        }

        let mut page = QueryBuilder::<MySql>::new(concat!(
            "SELECT ",
            invoice_columns!(),
            " FROM invoices"
        ));
        push_list_filters(&mut page, business_id, query);
        page.push(" ORDER BY issued_date DESC, invoice_no DESC LIMIT ")
            .push_bind(query.page_size)
            .push(" OFFSET ")
            .push_bind(query.offset());

        let invoices = page
            .build_query_as::<InvoiceRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to list invoices: {}", e)))?
            .into_iter()
            .map(InvoiceRow::into_invoice)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            business_id,
            page = query.page_index,
            returned = invoices.len(),
            total = total_item_count,
            "Listed invoices"
        );

        Ok(PaginatedInvoiceList::new(query, invoices, total_item_count, summary))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatusTotalRow {
    status: String,
    invoice_count: i64,
    total_amount: Decimal,
}

// Helper struct for database mapping

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    invoice_no: String,
    business_id: String,
    invoice_type: String,
    currency: String,
    status: String,
    issued_date: DateTime<Utc>,
    due_date: NaiveDate,
    recipient: Json<Recipient>,
    supplier: Json<Supplier>,
    items: Json<Vec<LineItem>>,
    tax_rate: Decimal,
    total_net_amount: Decimal,
    total_tax_amount: Decimal,
    total_discount_amount: Decimal,
    total_payable_amount: Decimal,
    bill_code: Option<String>,
    bill_url: Option<String>,
    transaction_id: Option<String>,
    transaction_time: Option<DateTime<Utc>>,
    original_invoice_ref: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self) -> Result<Invoice> {
        let currency = Currency::from_str(&self.currency)
            .map_err(|e| AppError::Internal(format!("Invalid currency in database: {}", e)))?;
        let status = InvoiceStatus::from_str(&self.status)
            .map_err(|e| AppError::Internal(format!("Invalid status in database: {}", e)))?;

        Ok(Invoice {
            invoice_no: self.invoice_no,
            business_id: self.business_id,
            invoice_type: self.invoice_type,
            currency,
            status,
            issued_date: self.issued_date,
            due_date: self.due_date,
            recipient: self.recipient.0,
            supplier: self.supplier.0,
            items: self.items.0,
            tax_rate: self.tax_rate,
            total_net_amount: self.total_net_amount,
            total_tax_amount: self.total_tax_amount,
            total_discount_amount: self.total_discount_amount,
            total_payable_amount: self.total_payable_amount,
            bill_code: self.bill_code,
            bill_url: self.bill_url,
            transaction_id: self.transaction_id,
            transaction_time: self.transaction_time,
            original_invoice_ref: self.original_invoice_ref,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
