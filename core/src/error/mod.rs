#[allow(clippy::module_inception)]
pub mod error;
pub mod store;

pub use error::{AccessDenied, CliError, DeepLinkError, SessionError};
pub use store::{KvStoreError, SecureStoreError};
