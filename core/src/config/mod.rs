mod load;
mod types;

pub use load::{get_storefront_data_dir, load_default, load_from_path, resolve_data_dir};
pub use types::{
    AppConfig, DeepLinkConfig, LoggingConfig, SessionConfig, StorageBackend, StorageConfig,
};
