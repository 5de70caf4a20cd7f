//! File-backed stores under the storefront data directory.
//!
//! Every operation re-reads the file so edits by another process are seen;
//! writes go through a temp file and rename.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;

use storefront_core::api::{Credentials, KeyValueStore, KvStoreError, SecureStore, SecureStoreError};

use super::check_quota;

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    restrict_permissions(&tmp).await?;
    tokio::fs::rename(&tmp, path).await
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    services: BTreeMap<String, StoredCredentials>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    username: String,
    /// base64 of the secret bytes
    secret: String,
}

/// Credential file readable only by its owner.
///
/// A file readable by group or others is refused with `AccessDenied`, as is
/// any OS permission error.
pub struct FileSecureStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSecureStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<CredentialFile, SecureStoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CredentialFile::default()),
            Err(e) => return Err(map_io(&self.path, e)),
        };
        self.check_mode().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            SecureStoreError::Backend(format!("corrupt credential file {}: {e}", self.path.display()))
        })
    }

    #[cfg(unix)]
    async fn check_mode(&self) -> Result<(), SecureStoreError> {
        use std::os::unix::fs::PermissionsExt;
        let meta = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| map_io(&self.path, e))?;
        if meta.permissions().mode() & 0o077 != 0 {
            return Err(SecureStoreError::AccessDenied(format!(
                "{} is accessible by other users",
                self.path.display()
            )));
        }
        Ok(())
    }

    #[cfg(not(unix))]
    async fn check_mode(&self) -> Result<(), SecureStoreError> {
        Ok(())
    }

    async fn persist(&self, file: &CredentialFile) -> Result<(), SecureStoreError> {
        let bytes = serde_json::to_vec_pretty(file)
            .map_err(|e| SecureStoreError::Backend(e.to_string()))?;
        write_atomic(&self.path, &bytes)
            .await
            .map_err(|e| map_io(&self.path, e))
    }
}

fn map_io(path: &Path, e: std::io::Error) -> SecureStoreError {
    if e.kind() == ErrorKind::PermissionDenied {
        SecureStoreError::AccessDenied(format!("{}: {e}", path.display()))
    } else {
        SecureStoreError::Backend(format!("{}: {e}", path.display()))
    }
}

#[async_trait]
impl SecureStore for FileSecureStore {
    fn name(&self) -> &str {
        "file-secure"
    }

    async fn save_credentials(
        &self,
        service: &str,
        username: &str,
        secret: &str,
    ) -> Result<bool, SecureStoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        file.services.insert(
            service.to_string(),
            StoredCredentials {
                username: username.to_string(),
                secret: base64::engine::general_purpose::STANDARD.encode(secret),
            },
        );
        self.persist(&file).await?;
        Ok(true)
    }

    async fn get_credentials(
        &self,
        service: &str,
    ) -> Result<Option<Credentials>, SecureStoreError> {
        let _guard = self.lock.lock().await;
        let file = self.load().await?;
        let Some(stored) = file.services.get(service) else {
            return Ok(None);
        };
        let secret = base64::engine::general_purpose::STANDARD
            .decode(&stored.secret)
            .ok()
            .and_then(|b| String::from_utf8(b).ok())
            .ok_or_else(|| {
                SecureStoreError::AccessDenied(format!("cannot decrypt secret for {service}"))
            })?;
        Ok(Some(Credentials::new(stored.username.clone(), secret)))
    }

    async fn reset_credentials(&self, service: &str) -> Result<bool, SecureStoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let removed = file.services.remove(service).is_some();
        if removed {
            self.persist(&file).await?;
        }
        Ok(removed)
    }
}

/// JSON object file with a byte quota.
pub struct JsonFileKvStore {
    path: PathBuf,
    quota_bytes: usize,
    lock: Mutex<()>,
}

impl JsonFileKvStore {
    pub fn new(path: impl Into<PathBuf>, quota_bytes: usize) -> Self {
        Self {
            path: path.into(),
            quota_bytes,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, JsonValue>, KvStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, items: &BTreeMap<String, JsonValue>) -> Result<(), KvStoreError> {
        let bytes = serde_json::to_vec(items)?;
        write_atomic(&self.path, &bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKvStore {
    fn name(&self) -> &str {
        "file-kv"
    }

    async fn get(&self, key: &str) -> Result<Option<JsonValue>, KvStoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: JsonValue) -> Result<(), KvStoreError> {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?;
        check_quota(&items, key, &value, self.quota_bytes)?;
        items.insert(key.to_string(), value);
        self.persist(&items).await
    }

    async fn remove(&self, key: &str) -> Result<(), KvStoreError> {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?;
        if items.remove(key).is_some() {
            self.persist(&items).await?;
        }
        Ok(())
    }

    async fn multi_get(
        &self,
        keys: &[&str],
    ) -> Result<Vec<(String, Option<JsonValue>)>, KvStoreError> {
        let _guard = self.lock.lock().await;
        let items = self.load().await?;
        Ok(keys
            .iter()
            .map(|k| (k.to_string(), items.get(*k).cloned()))
            .collect())
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), KvStoreError> {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?;
        let before = items.len();
        for key in keys {
            items.remove(*key);
        }
        if items.len() != before {
            self.persist(&items).await?;
        }
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, KvStoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_keys().collect())
    }
}
