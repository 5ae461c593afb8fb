use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::core::{timezone::format_iso8601, AppError};
use crate::middleware::RateLimiter;
use crate::modules::invoices::models::{InvoiceListQuery, InvoiceRequest};
use crate::modules::invoices::repositories::InvoiceRepository;
use crate::queue::{BatchSubmission, MessagePublisher, QueueMessage};

/// Upper bound on invoices per submission
pub const MAX_BATCH_SIZE: usize = 100;

/// Body of a batch submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInvoiceRequest {
    pub invoices: Vec<InvoiceRequest>,
}

/// Returned once the batch is queued; issuance happens later
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub message: String,
    pub count: usize,
    pub timestamp: String,
}

/// Queue a batch of invoices for issuance
/// POST /businesses/{business_id}/invoices/batch
pub async fn submit_batch(
    publisher: web::Data<Arc<dyn MessagePublisher>>,
    path: web::Path<String>,
    request: web::Json<BatchInvoiceRequest>,
) -> Result<HttpResponse, AppError> {
    let business_id = path.into_inner();
    let requests = request.into_inner().invoices;

    if business_id.trim().is_empty() {
        return Err(AppError::validation("Business id cannot be empty"));
    }

    if requests.is_empty() {
        return Err(AppError::validation("Batch must contain at least one invoice"));
    }

    if requests.len() > MAX_BATCH_SIZE {
        return Err(AppError::validation(format!(
            "Batch cannot exceed {} invoices",
            MAX_BATCH_SIZE
        )));
    }

    for (idx, invoice) in requests.iter().enumerate() {
        invoice.validate().map_err(|e| match e {
            AppError::Validation(msg) => AppError::validation(format!("Invoice {}: {}", idx, msg)),
            other => other,
        })?;
    }

    let count = requests.len();

    publisher
        .publish(QueueMessage::BatchSubmission(BatchSubmission {
            business_id: business_id.clone(),
            requests,
        }))
        .await?;

    tracing::info!(business_id = %business_id, count, "Invoice batch queued");

    Ok(HttpResponse::Accepted().json(AcceptedResponse {
        message: format!("{} invoice(s) queued for processing", count),
        count,
        timestamp: format_iso8601(chrono::Utc::now()),
    }))
}

/// Get invoice by number
/// GET /invoices/{invoice_no}
pub async fn get_invoice(
    repository: web::Data<Arc<dyn InvoiceRepository>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let invoice_no = path.into_inner();
    let invoice = repository.get_by_invoice_no(&invoice_no).await?;

    Ok(HttpResponse::Ok().json(invoice))
}

/// List a business's invoices, newest first
/// GET /businesses/{business_id}/invoices?pageIndex=&pageSize=&status=&invoiceType=&dateFrom=&dateTo=
pub async fn list_invoices(
    repository: web::Data<Arc<dyn InvoiceRepository>>,
    path: web::Path<String>,
    query: web::Query<InvoiceListQuery>,
) -> Result<HttpResponse, AppError> {
    let business_id = path.into_inner();
    let query = query.into_inner();

    if business_id.trim().is_empty() {
        return Err(AppError::validation("Business id cannot be empty"));
    }

    query.validate()?;

    let page = repository.list_by_business(&business_id, &query).await?;

    tracing::debug!(
        business_id = %business_id,
        page = page.page_number,
        total = page.total_item_count,
        "Invoice list served"
    );

    Ok(HttpResponse::Ok().json(page))
}

/// Configure invoice routes, throttled by `limiter`
pub fn configure(cfg: &mut web::ServiceConfig, limiter: RateLimiter) {
    cfg.service(
        web::scope("/businesses/{business_id}/invoices")
            .wrap(limiter.clone())
            .route("", web::get().to(list_invoices))
            .route("/batch", web::post().to(submit_batch)),
    )
    .service(
        web::scope("/invoices")
            .wrap(limiter)
            .route("/{invoice_no}", web::get().to(get_invoice)),
    );
}
