use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use invoiceflow::core::Currency;
use invoiceflow::modules::businesses::CredentialProvider;
use invoiceflow::modules::gateways::{BillTransaction, PaymentGateway};
use invoiceflow::modules::invoices::models::{LineItemRequest, Recipient, Supplier};
use invoiceflow::modules::invoices::{
    BatchProcessor, CalculatedInvoice, InvoiceCalculator, InvoiceRepository, InvoiceRequest,
    IssuanceWorkflow, RetryScheduler,
};
use invoiceflow::modules::notifications::NotificationDispatcher;
use invoiceflow::modules::transactions::{PaymentCallback, ReconciliationService};
use invoiceflow::queue::MessagePublisher;

use super::fakes::*;

pub const BUSINESS_ID: &str = "biz-001";
pub const MAX_ATTEMPTS: u32 = 3;

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn line(name: &str, quantity: u32, unit_price: &str) -> LineItemRequest {
    LineItemRequest {
        item_name: name.to_string(),
        quantity,
        unit_price: dec(unit_price),
        tax_rate: None,
        discount_amount: None,
        classification_code: None,
    }
}

pub fn recipient(name: &str) -> Recipient {
    Recipient {
        name: name.to_string(),
        email: Some(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
        phone: Some("012-345 6789".to_string()),
        tin: None,
        registration_number: None,
        address_line1: None,
        postcode: None,
        city: Some("Kuala Lumpur".to_string()),
        state: None,
        country_code: Some("MYS".to_string()),
    }
}

pub fn supplier() -> Supplier {
    Supplier {
        name: "Acme Learning Sdn Bhd".to_string(),
        tin: Some("C1234567890".to_string()),
        registration_number: Some("202001000001".to_string()),
        msic_code: Some("85499".to_string()),
        business_activity_description: Some("Tuition services".to_string()),
    }
}

pub fn invoice_request(recipient_name: &str, items: Vec<LineItemRequest>) -> InvoiceRequest {
    InvoiceRequest {
        invoice_type: "01".to_string(),
        currency: Currency::MYR,
        due_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        tax_rate: None,
        recipient: recipient(recipient_name),
        supplier: supplier(),
        items,
        original_invoice_ref: None,
    }
}

/// A simple valid request: one line of `amount`
pub fn simple_request(recipient_name: &str, amount: &str) -> InvoiceRequest {
    invoice_request(recipient_name, vec![line("Monthly class fee", 1, amount)])
}

pub fn calculated(recipient_name: &str, amount: &str) -> CalculatedInvoice {
    InvoiceCalculator::new()
        .calculate(&simple_request(recipient_name, amount))
        .unwrap()
}

pub fn transaction(invoice_no: &str, status: &str, payment_invoice_no: &str) -> BillTransaction {
    BillTransaction {
        external_reference_no: Some(invoice_no.to_string()),
        payment_status: Some(status.to_string()),
        payment_invoice_no: Some(payment_invoice_no.to_string()),
        payment_date: Some("01-11-2025 12:30:00".to_string()),
        payment_amount: Some("32.42".to_string()),
        payment_channel: Some("FPX".to_string()),
    }
}

pub fn callback(invoice_no: &str, bill_code: &str, status_id: &str) -> PaymentCallback {
    PaymentCallback {
        refno: Some("TP2511011234567890".to_string()),
        status: Some(status_id.to_string()),
        billcode: Some(bill_code.to_string()),
        order_id: Some(invoice_no.to_string()),
        status_id: Some(status_id.to_string()),
        ..Default::default()
    }
}

/// All services wired against the in-memory fakes; no pacing delays unless
/// built with [`Pipeline::with_delays`]
pub struct Pipeline {
    pub repository: Arc<InMemoryInvoiceRepository>,
    pub gateway: Arc<ScriptedGateway>,
    pub publisher: Arc<RecordingPublisher>,
    pub notifier: Arc<RecordingNotifier>,
    pub workflow: Arc<IssuanceWorkflow>,
    pub batch_processor: BatchProcessor,
    pub retry_scheduler: RetryScheduler,
    pub reconciliation: ReconciliationService,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_delays(Duration::ZERO, Duration::ZERO)
    }

    /// Batch `item_delay` between items, retry `backoff` before each attempt
    pub fn with_delays(item_delay: Duration, backoff: Duration) -> Self {
        Self::build(
            StaticCredentialProvider::with(BUSINESS_ID),
            RecordingPublisher::new(),
            item_delay,
            backoff,
        )
    }

    pub fn with_credentials(credentials: StaticCredentialProvider) -> Self {
        Self::build(credentials, RecordingPublisher::new(), Duration::ZERO, Duration::ZERO)
    }

    pub fn with_publisher(publisher: RecordingPublisher) -> Self {
        Self::build(
            StaticCredentialProvider::with(BUSINESS_ID),
            publisher,
            Duration::ZERO,
            Duration::ZERO,
        )
    }

    fn build(
        credentials: StaticCredentialProvider,
        publisher: RecordingPublisher,
        item_delay: Duration,
        backoff: Duration,
    ) -> Self {
        let repository = Arc::new(InMemoryInvoiceRepository::new());
        let gateway = Arc::new(ScriptedGateway::new());
        let publisher = Arc::new(publisher);
        let notifier = Arc::new(RecordingNotifier::new());
        let credentials: Arc<dyn CredentialProvider> = Arc::new(credentials);

        let dyn_repository: Arc<dyn InvoiceRepository> = repository.clone();
        let dyn_gateway: Arc<dyn PaymentGateway> = gateway.clone();
        let dyn_publisher: Arc<dyn MessagePublisher> = publisher.clone();
        let notifications = NotificationDispatcher::new(notifier.clone());

        let workflow = Arc::new(IssuanceWorkflow::new(
            dyn_repository.clone(),
            dyn_gateway.clone(),
            notifications.clone(),
        ));

        Self {
            batch_processor: BatchProcessor::new(
                workflow.clone(),
                credentials.clone(),
                dyn_publisher.clone(),
                item_delay,
            ),
            retry_scheduler: RetryScheduler::new(
                workflow.clone(),
                credentials,
                dyn_publisher,
                backoff,
                MAX_ATTEMPTS,
            ),
            reconciliation: ReconciliationService::new(dyn_repository, dyn_gateway, notifications),
            repository,
            gateway,
            publisher,
            notifier,
            workflow,
        }
    }
}
