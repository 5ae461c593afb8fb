pub mod models;
pub mod services;

pub use models::{Bill, BillTransaction, PaymentCredential};
pub use services::{PaymentGateway, ToyyibPayClient};
