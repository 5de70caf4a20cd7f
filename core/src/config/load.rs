use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::AppConfig;

/// Get the default storefront data directory: ~/.storefront
pub fn get_storefront_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".storefront"))
}

/// Resolve `storage.data_dir`, expanding `~` and falling back to ~/.storefront.
pub fn resolve_data_dir(cfg: &AppConfig) -> anyhow::Result<PathBuf> {
    match cfg
        .storage
        .data_dir
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(dir) => {
            let expanded = shellexpand::full(dir)
                .with_context(|| format!("expand data_dir `{dir}`"))?;
            Ok(PathBuf::from(expanded.as_ref()))
        }
        None => get_storefront_data_dir(),
    }
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.storefront/config.toml (highest)
    let home_config = get_storefront_data_dir()?.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg = if home_config.exists() {
        load_from_path(&home_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var("STOREFRONT_DATA_DIR") {
        if !v.trim().is_empty() {
            cfg.storage.data_dir = Some(v);
        }
    }
    if let Ok(v) = std::env::var("STOREFRONT_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v;
        }
    }
}
