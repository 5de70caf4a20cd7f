use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::types::Credentials;
use crate::error::{KvStoreError, SecureStoreError};

/// Platform credential vault with OS-level access control.
#[async_trait]
pub trait SecureStore: Send + Sync {
    fn name(&self) -> &str;

    async fn save_credentials(
        &self,
        service: &str,
        username: &str,
        secret: &str,
    ) -> Result<bool, SecureStoreError>;

    /// `Ok(None)` when nothing is stored; `AccessDenied` when the vault refuses.
    async fn get_credentials(&self, service: &str)
        -> Result<Option<Credentials>, SecureStoreError>;

    async fn reset_credentials(&self, service: &str) -> Result<bool, SecureStoreError>;
}

/// Unencrypted async key-value persistence holding JSON values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<JsonValue>, KvStoreError>;

    /// May fail with [`KvStoreError::QuotaExceeded`].
    async fn set(&self, key: &str, value: JsonValue) -> Result<(), KvStoreError>;

    async fn remove(&self, key: &str) -> Result<(), KvStoreError>;

    async fn multi_get(
        &self,
        keys: &[&str],
    ) -> Result<Vec<(String, Option<JsonValue>)>, KvStoreError> {
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            out.push((key.to_string(), self.get(key).await?));
        }
        Ok(out)
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), KvStoreError> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, KvStoreError>;
}
