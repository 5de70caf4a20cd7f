//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `storefront_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load_default, resolve_data_dir, AppConfig, DeepLinkConfig, LoggingConfig, SessionConfig,
    StorageBackend, StorageConfig,
};
pub use crate::deeplink::{
    AppLifecycleState, DeepLinkEvent, DeepLinkParser, DeepLinkRouter, KnownRoute,
    LifecycleSource, LinkOpener, LinkOrigin, LinkSource, ListenerHandle, PendingAction,
    RouterPhase, RouterStatus,
};
pub use crate::error::{
    AccessDenied, CliError, DeepLinkError, KvStoreError, SecureStoreError, SessionError,
};
pub use crate::session::{
    AuthState, BootstrapOutcome, CartItemRef, SessionLoader, SessionSnapshot, SnapshotSource,
};
pub use crate::store::{service_key, Credentials, KeyValueStore, SecureStore};
