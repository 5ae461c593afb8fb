/// Contract tests for the invoice API
///
/// POST /businesses/{business_id}/invoices/batch only validates and queues;
/// GET /invoices/{invoice_no} reads the stored record;
/// GET /businesses/{business_id}/invoices pages through a business's invoices.
#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use actix_web::{test, web, App};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use helpers::*;
use invoiceflow::middleware::{json_config, query_config, RateLimiter};
use invoiceflow::modules::invoices::controllers::configure;
use invoiceflow::modules::invoices::{
    Invoice, InvoiceRepository, InvoiceStatus, PaginatedInvoiceList,
};
use invoiceflow::queue::{MessagePublisher, QueueMessage};

fn invoice_json(recipient: &str) -> Value {
    json!({
        "dueDate": "2025-12-31",
        "taxRate": "6",
        "recipient": {
            "name": recipient,
            "email": "alice@example.com",
            "phone": "012-345 6789"
        },
        "supplier": {
            "name": "Acme Learning Sdn Bhd",
            "tin": "C1234567890"
        },
        "items": [
            { "itemName": "Monthly class fee", "quantity": 2, "unitPrice": "60.00" }
        ]
    })
}

macro_rules! app {
    ($publisher:expr, $repository:expr, $limit:expr) => {{
        let publisher: Arc<dyn MessagePublisher> = $publisher;
        let repository: Arc<dyn InvoiceRepository> = $repository;
        test::init_service(
            App::new()
                .app_data(json_config())
                .app_data(query_config())
                .app_data(web::Data::new(publisher))
                .app_data(web::Data::new(repository))
                .configure(|cfg| configure(cfg, RateLimiter::new($limit))),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_submit_batch_returns_accepted_and_queues() {
    let publisher = Arc::new(RecordingPublisher::new());
    let app = app!(publisher.clone(), Arc::new(InMemoryInvoiceRepository::new()), 1000);

    let req = test::TestRequest::post()
        .uri("/businesses/biz-001/invoices/batch")
        .set_json(json!({ "invoices": [invoice_json("Alice Tan"), invoice_json("Bob Lee")] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 202);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 2);
    assert!(body["timestamp"].is_string());

    let messages = publisher.messages();
    assert_eq!(messages.len(), 1);
    let QueueMessage::BatchSubmission(batch) = &messages[0] else {
        panic!("expected a batch submission, got {:?}", messages[0]);
    };
    assert_eq!(batch.business_id, "biz-001");
    assert_eq!(batch.requests.len(), 2);
    assert_eq!(batch.requests[1].recipient.name, "Bob Lee");
}

#[actix_web::test]
async fn test_empty_batch_rejected() {
    let publisher = Arc::new(RecordingPublisher::new());
    let app = app!(publisher.clone(), Arc::new(InMemoryInvoiceRepository::new()), 1000);

    let req = test::TestRequest::post()
        .uri("/businesses/biz-001/invoices/batch")
        .set_json(json!({ "invoices": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], 400);
    assert!(publisher.messages().is_empty());
}

#[actix_web::test]
async fn test_oversized_batch_rejected() {
    let app = app!(
        Arc::new(RecordingPublisher::new()),
        Arc::new(InMemoryInvoiceRepository::new()),
        1000
    );
    let invoices: Vec<Value> = (0..101).map(|i| invoice_json(&format!("Customer{}", i))).collect();

    let req = test::TestRequest::post()
        .uri("/businesses/biz-001/invoices/batch")
        .set_json(json!({ "invoices": invoices }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("cannot exceed 100"));
}

#[actix_web::test]
async fn test_invalid_invoice_names_its_position() {
    let publisher = Arc::new(RecordingPublisher::new());
    let app = app!(publisher.clone(), Arc::new(InMemoryInvoiceRepository::new()), 1000);

    let mut broken = invoice_json("Bob Lee");
    broken["items"][0]["quantity"] = json!(0);

    let req = test::TestRequest::post()
        .uri("/businesses/biz-001/invoices/batch")
        .set_json(json!({ "invoices": [invoice_json("Alice Tan"), broken] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("Invoice 1:"), "{}", message);
    assert!(message.contains("quantity must be positive"), "{}", message);
    assert!(publisher.messages().is_empty());
}

#[actix_web::test]
async fn test_unit_price_above_limit_rejected() {
    let publisher = Arc::new(RecordingPublisher::new());
    let app = app!(publisher.clone(), Arc::new(InMemoryInvoiceRepository::new()), 1000);

    let mut huge = invoice_json("Alice Tan");
    huge["items"][0]["unitPrice"] = json!("79228162514264337593543950335");

    let req = test::TestRequest::post()
        .uri("/businesses/biz-001/invoices/batch")
        .set_json(json!({ "invoices": [huge] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("unit price cannot exceed"), "{}", message);
    assert!(publisher.messages().is_empty());
}

#[actix_web::test]
async fn test_malformed_body_rejected() {
    let app = app!(
        Arc::new(RecordingPublisher::new()),
        Arc::new(InMemoryInvoiceRepository::new()),
        1000
    );

    let req = test::TestRequest::post()
        .uri("/businesses/biz-001/invoices/batch")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"invoices\": [")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_full_queue_returns_service_unavailable() {
    let app = app!(
        Arc::new(RecordingPublisher::failing()),
        Arc::new(InMemoryInvoiceRepository::new()),
        1000
    );

    let req = test::TestRequest::post()
        .uri("/businesses/biz-001/invoices/batch")
        .set_json(json!({ "invoices": [invoice_json("Alice Tan")] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 503);
}

#[actix_web::test]
async fn test_get_invoice() {
    let repository = Arc::new(InMemoryInvoiceRepository::new());
    let calculated = calculated("Alice Tan", "120.00");
    repository.insert(Invoice::new_draft(&calculated, BUSINESS_ID));
    let app = app!(Arc::new(RecordingPublisher::new()), repository, 1000);

    let req = test::TestRequest::get()
        .uri(&format!("/invoices/{}", calculated.invoice_no))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Invoice = test::read_body_json(resp).await;
    assert_eq!(body.invoice_no, calculated.invoice_no);
    assert_eq!(body.status, InvoiceStatus::Draft);
    assert_eq!(body.total_payable_amount, calculated.total_payable_amount);
}

#[actix_web::test]
async fn test_get_unknown_invoice_returns_not_found() {
    let app = app!(
        Arc::new(RecordingPublisher::new()),
        Arc::new(InMemoryInvoiceRepository::new()),
        1000
    );

    let req = test::TestRequest::get()
        .uri("/invoices/INV-0000000000-NOBODY-0000")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_rate_limit_applies_to_invoice_routes() {
    let app = app!(
        Arc::new(RecordingPublisher::new()),
        Arc::new(InMemoryInvoiceRepository::new()),
        1
    );

    let first = test::call_service(
        &app,
        test::TestRequest::get().uri("/invoices/INV-A").to_request(),
    )
    .await;
    assert_eq!(first.status(), 404);

    let second = test::call_service(
        &app,
        test::TestRequest::get().uri("/invoices/INV-B").to_request(),
    )
    .await;
    assert_eq!(second.status(), 429);
}

/// A stored invoice issued on 2025-11-{day}, moved to `status`
fn stored(recipient: &str, amount: &str, business_id: &str, day: u32, status: InvoiceStatus) -> Invoice {
    let mut invoice = Invoice::new_draft(&calculated(recipient, amount), business_id);
    invoice.issued_date = Utc.with_ymd_and_hms(2025, 11, day, 4, 0, 0).unwrap();

    if status != InvoiceStatus::Draft {
        let bill_code = format!("bill-{}", day);
        invoice.apply_bill(&bill_code, &format!("https://dev.toyyibpay.com/{}", bill_code));
        invoice.mark_pending();
    }
    if status.is_terminal() {
        invoice.mark_terminal(status, "TP0001", Utc::now());
    }
    invoice
}

fn listed_repository() -> Arc<InMemoryInvoiceRepository> {
    let repository = Arc::new(InMemoryInvoiceRepository::new());
    repository.insert(stored("Alice Tan", "32.42", BUSINESS_ID, 1, InvoiceStatus::Paid));
    repository.insert(stored("Bob Lee", "80.00", BUSINESS_ID, 2, InvoiceStatus::Pending));
    repository.insert(stored("Chong Wei", "45.50", BUSINESS_ID, 3, InvoiceStatus::Pending));
    repository.insert(stored("Devi Rao", "12.00", BUSINESS_ID, 4, InvoiceStatus::Cancelled));
    repository.insert(stored("Other Co", "99.00", "biz-002", 5, InvoiceStatus::Pending));
    repository
}

#[actix_web::test]
async fn test_list_invoices_newest_first_with_summary() {
    let app = app!(Arc::new(RecordingPublisher::new()), listed_repository(), 1000);

    let req = test::TestRequest::get()
        .uri("/businesses/biz-001/invoices")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let page: PaginatedInvoiceList = test::read_body_json(resp).await;

    let names: Vec<&str> = page.items.iter().map(|i| i.recipient_name.as_str()).collect();
    assert_eq!(names, ["Devi Rao", "Chong Wei", "Bob Lee", "Alice Tan"]);
    assert_eq!(page.total_item_count, 4);
    assert_eq!(page.total_page_count, 1);
    assert_eq!(page.page_number, 1);
    assert_eq!(page.page_size, 20);

    assert_eq!(page.invoice_summary.pending_count, 2);
    assert_eq!(page.invoice_summary.pending_amount, dec("125.50"));
    assert_eq!(page.invoice_summary.paid_count, 1);
    assert_eq!(page.invoice_summary.total_paid, dec("32.42"));
}

#[actix_web::test]
async fn test_list_invoices_filters_by_status_and_date() {
    let app = app!(Arc::new(RecordingPublisher::new()), listed_repository(), 1000);

    let req = test::TestRequest::get()
        .uri("/businesses/biz-001/invoices?status=PENDING&dateFrom=2025-11-03&dateTo=2025-11-30")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let page: PaginatedInvoiceList = test::read_body_json(resp).await;
    assert_eq!(page.total_item_count, 1);
    assert_eq!(page.items[0].recipient_name, "Chong Wei");
    assert_eq!(page.items[0].status, InvoiceStatus::Pending);
    assert!(page.items[0].bill_url.is_some());
    assert_eq!(page.invoice_summary.paid_count, 0);
}

#[actix_web::test]
async fn test_list_invoices_pagination() {
    let app = app!(Arc::new(RecordingPublisher::new()), listed_repository(), 1000);

    let req = test::TestRequest::get()
        .uri("/businesses/biz-001/invoices?pageIndex=2&pageSize=3")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let page: PaginatedInvoiceList = test::read_body_json(resp).await;
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].recipient_name, "Alice Tan");
    assert_eq!(page.total_item_count, 4);
    assert_eq!(page.total_page_count, 2);
    assert_eq!(page.page_number, 2);
    // The summary covers every page
    assert_eq!(page.invoice_summary.pending_count, 2);
}

#[actix_web::test]
async fn test_list_invoices_rejects_bad_query() {
    let app = app!(Arc::new(RecordingPublisher::new()), listed_repository(), 1000);

    for uri in [
        "/businesses/biz-001/invoices?pageSize=500",
        "/businesses/biz-001/invoices?pageIndex=0",
        "/businesses/biz-001/invoices?status=SETTLED",
        "/businesses/biz-001/invoices?dateFrom=2025-11-05&dateTo=2025-11-01",
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), 400, "{}", uri);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], 400, "{}", uri);
    }
}

#[actix_web::test]
async fn test_list_invoices_for_unknown_business_is_empty() {
    let app = app!(Arc::new(RecordingPublisher::new()), listed_repository(), 1000);

    let req = test::TestRequest::get()
        .uri("/businesses/biz-404/invoices")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let page: PaginatedInvoiceList = test::read_body_json(resp).await;
    assert!(page.items.is_empty());
    assert_eq!(page.total_item_count, 0);
    assert_eq!(page.total_page_count, 0);
}
