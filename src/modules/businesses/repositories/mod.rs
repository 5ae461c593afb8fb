pub mod credential_provider;

pub use credential_provider::{CredentialProvider, MySqlCredentialProvider};
