//! InvoiceFlow: asynchronous invoice issuance and payment reconciliation.
//!
//! Batches are accepted over HTTP, queued, and issued one invoice at a time
//! against the ToyyibPay gateway. Payment callbacks are reconciled by
//! re-querying the gateway.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;
pub mod queue;

// Re-export commonly used types
pub use modules::gateways;
pub use modules::invoices;
pub use modules::transactions;
