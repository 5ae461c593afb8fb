// Invoices module

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{
    CalculatedInvoice, Invoice, InvoiceListQuery, InvoiceRequest, InvoiceStatus, LineItem,
    PaginatedInvoiceList,
};
pub use repositories::{InvoiceRepository, MySqlInvoiceRepository};
pub use services::{
    BatchProcessor, BatchReport, InvoiceCalculator, IssuanceWorkflow, RetryOutcome,
    RetryScheduler,
};
