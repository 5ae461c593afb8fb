pub mod payment_callback;

pub use payment_callback::PaymentCallback;
