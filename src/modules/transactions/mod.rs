// Transactions module
//
// Payment callbacks in, gateway-confirmed settlement out.

pub mod controllers;
pub mod models;
pub mod services;

pub use models::PaymentCallback;
pub use services::{ReconciliationOutcome, ReconciliationService};
