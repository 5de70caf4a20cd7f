pub mod r#trait;
mod types;

pub use r#trait::{KeyValueStore, SecureStore};
pub use types::{service_key, Credentials, SERVICE_NAMESPACE};
