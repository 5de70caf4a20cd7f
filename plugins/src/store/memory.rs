use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;

use storefront_core::api::{Credentials, KeyValueStore, KvStoreError, SecureStore, SecureStoreError};

use super::check_quota;

/// Process-local credential vault. Access can be revoked to emulate a
/// device credential reset.
#[derive(Default)]
pub struct MemorySecureStore {
    items: Mutex<HashMap<String, Credentials>>,
    denied: AtomicBool,
}

impl MemorySecureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_access_denied(&self, denied: bool) {
        self.denied.store(denied, Ordering::SeqCst);
    }

    fn check_access(&self) -> Result<(), SecureStoreError> {
        if self.denied.load(Ordering::SeqCst) {
            return Err(SecureStoreError::AccessDenied(
                "credential vault locked".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SecureStore for MemorySecureStore {
    fn name(&self) -> &str {
        "memory-secure"
    }

    async fn save_credentials(
        &self,
        service: &str,
        username: &str,
        secret: &str,
    ) -> Result<bool, SecureStoreError> {
        self.check_access()?;
        self.items
            .lock()
            .await
            .insert(service.to_string(), Credentials::new(username, secret));
        Ok(true)
    }

    async fn get_credentials(
        &self,
        service: &str,
    ) -> Result<Option<Credentials>, SecureStoreError> {
        self.check_access()?;
        Ok(self.items.lock().await.get(service).cloned())
    }

    async fn reset_credentials(&self, service: &str) -> Result<bool, SecureStoreError> {
        self.check_access()?;
        Ok(self.items.lock().await.remove(service).is_some())
    }
}

/// Process-local JSON key-value store with a byte quota.
pub struct MemoryKvStore {
    items: Mutex<BTreeMap<String, JsonValue>>,
    quota_bytes: usize,
}

impl MemoryKvStore {
    pub fn new(quota_bytes: usize) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            quota_bytes,
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    fn name(&self) -> &str {
        "memory-kv"
    }

    async fn get(&self, key: &str) -> Result<Option<JsonValue>, KvStoreError> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: JsonValue) -> Result<(), KvStoreError> {
        let mut items = self.items.lock().await;
        check_quota(&items, key, &value, self.quota_bytes)?;
        items.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KvStoreError> {
        self.items.lock().await.remove(key);
        Ok(())
    }

    async fn multi_get(
        &self,
        keys: &[&str],
    ) -> Result<Vec<(String, Option<JsonValue>)>, KvStoreError> {
        let items = self.items.lock().await;
        Ok(keys
            .iter()
            .map(|k| (k.to_string(), items.get(*k).cloned()))
            .collect())
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), KvStoreError> {
        let mut items = self.items.lock().await;
        for key in keys {
            items.remove(*key);
        }
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, KvStoreError> {
        Ok(self.items.lock().await.keys().cloned().collect())
    }
}
