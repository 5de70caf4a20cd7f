use std::sync::Arc;

use anyhow::Result;

use storefront_core::api::{
    resolve_data_dir, AppConfig, DeepLinkParser, DeepLinkRouter, KeyValueStore, SecureStore,
    SessionLoader, StorageBackend,
};

use crate::link::{ChannelLifecycle, ChannelLinkSource, LoopbackLinkOpener};
use crate::store::{FileSecureStore, JsonFileKvStore, MemoryKvStore, MemorySecureStore};

pub fn build_secure_store(cfg: &AppConfig) -> Result<Arc<dyn SecureStore>> {
    match cfg.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(MemorySecureStore::new())),
        StorageBackend::File => {
            let path = resolve_data_dir(cfg)?.join(&cfg.storage.secure_file);
            Ok(Arc::new(FileSecureStore::new(path)))
        }
    }
}

pub fn build_plain_store(cfg: &AppConfig) -> Result<Arc<dyn KeyValueStore>> {
    match cfg.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryKvStore::new(cfg.storage.plain_quota_bytes))),
        StorageBackend::File => {
            let path = resolve_data_dir(cfg)?.join(&cfg.storage.plain_file);
            Ok(Arc::new(JsonFileKvStore::new(
                path,
                cfg.storage.plain_quota_bytes,
            )))
        }
    }
}

pub fn build_session_loader(cfg: &AppConfig) -> Result<SessionLoader> {
    Ok(SessionLoader::new(
        build_secure_store(cfg)?,
        build_plain_store(cfg)?,
        cfg.session.clone(),
    ))
}

/// Router wired to in-process platform stand-ins. The returned sources are
/// how the host feeds URIs and lifecycle changes in.
pub struct RouterParts {
    pub router: DeepLinkRouter,
    pub links: Arc<ChannelLinkSource>,
    pub lifecycle: Arc<ChannelLifecycle>,
}

pub fn build_router(cfg: &AppConfig, initial_url: Option<String>) -> RouterParts {
    let links = Arc::new(ChannelLinkSource::new(initial_url));
    let lifecycle = Arc::new(ChannelLifecycle::new());
    let opener = Arc::new(LoopbackLinkOpener::new(
        DeepLinkParser::from_config(&cfg.deep_link),
        links.clone(),
        cfg.deep_link.browser_command.clone(),
    ));
    let router = DeepLinkRouter::with_opener(&cfg.deep_link, links.clone(), lifecycle.clone(), opener);
    RouterParts {
        router,
        links,
        lifecycle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storefront_core::api::AuthState;

    fn file_config(dir: &std::path::Path) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.storage.data_dir = Some(dir.to_string_lossy().to_string());
        cfg
    }

    #[tokio::test]
    async fn file_backed_loader_bootstraps_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = file_config(dir.path());

        let loader = build_session_loader(&cfg).unwrap();
        loader.save_credentials("user-42", "tok").await.unwrap();
        loader.save_theme("dark").await.unwrap();

        let loader = build_session_loader(&cfg).unwrap();
        let outcome = loader.bootstrap().await;
        assert_eq!(
            outcome.auth,
            AuthState::Authenticated {
                user_id: "user-42".into()
            }
        );
        assert_eq!(outcome.snapshot.theme(), Some("dark"));
        assert!(dir.path().join("credentials.json").exists());
        assert!(dir.path().join("storage.json").exists());
    }

    #[tokio::test]
    async fn memory_backend_enforces_configured_quota() {
        let mut cfg = AppConfig::default();
        cfg.storage.backend = StorageBackend::Memory;
        cfg.storage.plain_quota_bytes = 16;

        let store = build_plain_store(&cfg).unwrap();
        assert!(store.set("theme", json!("dark")).await.is_ok());
        assert!(store.set("cartItems", json!([1, 2, 3, 4])).await.is_err());
    }

    #[tokio::test]
    async fn router_test_link_loops_back_into_listeners() {
        let cfg = AppConfig::default();
        let parts = build_router(&cfg, None);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        parts.router.add_listener(move |ev| {
            tx.send(ev.route().to_string())?;
            Ok(())
        });
        parts.router.initialize().await;

        assert!(parts.router.test_deep_link("ecommerceapp://settings").await);
        assert_eq!(rx.recv().await.as_deref(), Some("settings"));
        assert!(!parts.router.test_deep_link("otherapp://settings").await);
    }
}
