pub mod bill;

pub use bill::{Bill, BillTransaction, PaymentCredential, PAYMENT_STATUS_SUCCESS};
