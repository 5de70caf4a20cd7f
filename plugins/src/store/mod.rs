//! Secure and plain store backends.

mod file;
mod memory;

pub use file::{FileSecureStore, JsonFileKvStore};
pub use memory::{MemoryKvStore, MemorySecureStore};

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;
use storefront_core::api::KvStoreError;

/// Reject a write whose resulting store would exceed `limit` serialized bytes.
pub(crate) fn check_quota(
    items: &BTreeMap<String, JsonValue>,
    key: &str,
    value: &JsonValue,
    limit: usize,
) -> Result<(), KvStoreError> {
    let mut projected = items.clone();
    projected.insert(key.to_string(), value.clone());
    let needed = serde_json::to_vec(&projected)?.len();
    if needed > limit {
        return Err(KvStoreError::QuotaExceeded {
            key: key.to_string(),
            needed,
            limit,
        });
    }
    Ok(())
}
