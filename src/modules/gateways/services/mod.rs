pub mod gateway_trait;
pub mod toyyibpay;

pub use gateway_trait::PaymentGateway;
pub use toyyibpay::ToyyibPayClient;
