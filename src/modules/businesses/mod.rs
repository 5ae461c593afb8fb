// Businesses module
//
// Profile management lives elsewhere; this crate only reads the payment
// credentials a business has configured.

pub mod repositories;

pub use repositories::{CredentialProvider, MySqlCredentialProvider};
