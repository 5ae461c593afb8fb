pub mod batch_processor;
pub mod invoice_calculator;
pub mod issuance_workflow;
pub mod retry_scheduler;

pub use batch_processor::{BatchProcessor, BatchReport};
pub use invoice_calculator::{generate_invoice_no, InvoiceCalculator};
pub use issuance_workflow::IssuanceWorkflow;
pub use retry_scheduler::{RetryOutcome, RetryScheduler};
