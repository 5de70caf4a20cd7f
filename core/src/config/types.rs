use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub deep_link: DeepLinkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "storefront_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Root for the store files. `~` is expanded; empty means `~/.storefront`.
    #[serde(default)]
    pub data_dir: Option<String>,

    #[serde(default = "default_secure_file")]
    pub secure_file: String,

    #[serde(default = "default_plain_file")]
    pub plain_file: String,

    /// Upper bound on the serialized size of the plain store.
    #[serde(default = "default_plain_quota_bytes")]
    pub plain_quota_bytes: usize,
}

fn default_secure_file() -> String {
    "credentials.json".to_string()
}

fn default_plain_file() -> String {
    "storage.json".to_string()
}

fn default_plain_quota_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: None,
            secure_file: default_secure_file(),
            plain_file: default_plain_file(),
            plain_quota_bytes: default_plain_quota_bytes(),
        }
    }
}

/// Keys the session loader reads. Service keys are reverse-domain namespaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_token_service")]
    pub token_service: String,

    #[serde(default = "default_api_key_service")]
    pub api_key_service: String,

    #[serde(default = "default_theme_key")]
    pub theme_key: String,

    #[serde(default = "default_notifications_key")]
    pub notifications_key: String,

    #[serde(default = "default_cart_key")]
    pub cart_key: String,
}

fn default_token_service() -> String {
    "com.ecom:userToken".to_string()
}

fn default_api_key_service() -> String {
    "com.ecom:apiKey".to_string()
}

fn default_theme_key() -> String {
    "theme".to_string()
}

fn default_notifications_key() -> String {
    "notificationsEnabled".to_string()
}

fn default_cart_key() -> String {
    "cartItems".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_service: default_token_service(),
            api_key_service: default_api_key_service(),
            theme_key: default_theme_key(),
            notifications_key: default_notifications_key(),
            cart_key: default_cart_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepLinkConfig {
    #[serde(default = "default_custom_scheme_prefix")]
    pub custom_scheme_prefix: String,

    #[serde(default = "default_universal_link_prefix")]
    pub universal_link_prefix: String,

    /// Delay before draining pending actions after a late listener registers.
    #[serde(default = "default_pending_drain_delay_ms")]
    pub pending_drain_delay_ms: u64,

    /// Command used as the best-effort browser for https links, e.g. "xdg-open".
    #[serde(default)]
    pub browser_command: Option<String>,
}

fn default_custom_scheme_prefix() -> String {
    "ecommerceapp://".to_string()
}

fn default_universal_link_prefix() -> String {
    "https://miniecommerce.com/".to_string()
}

fn default_pending_drain_delay_ms() -> u64 {
    100
}

impl Default for DeepLinkConfig {
    fn default() -> Self {
        Self {
            custom_scheme_prefix: default_custom_scheme_prefix(),
            universal_link_prefix: default_universal_link_prefix(),
            pending_drain_delay_ms: default_pending_drain_delay_ms(),
            browser_command: None,
        }
    }
}
