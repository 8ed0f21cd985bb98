//! Transport configuration schema and loader
//!
//! Configuration is stored as YAML next to the other user settings.
//! Default location: ~/.config/cockpit-hid/config.yaml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Background wallpaper shown on the CDU screen after connect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CduBackground {
    Gray,
    Black,
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    #[default]
    Logo,
}

/// Root transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HidConfig {
    /// Read timeout of each reader thread; bounds how long a disconnect waits
    pub read_timeout_ms: u64,

    /// Maximum queued input reports per device before the oldest is dropped
    pub queue_depth: usize,

    /// Interval between hot-plug re-enumerations
    pub hotplug_poll_ms: u64,

    /// Lower bound on ticks between two display refreshes of one device
    pub min_display_interval_ticks: u32,

    /// CDU wallpaper selected on connect
    pub cdu_background: CduBackground,

    /// FCU / EFIS backlight level applied on connect
    pub fcu_backlight: u8,

    /// PDC backlight level applied on connect
    pub pdc_backlight: u8,

    /// Product ids that are never opened even when recognized
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disabled_products: Vec<u16>,
}

impl Default for HidConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 10,
            queue_depth: 256,
            hotplug_poll_ms: 2000,
            min_display_interval_ticks: 2,
            cdu_background: CduBackground::default(),
            fcu_backlight: 180,
            pdc_backlight: 128,
            disabled_products: Vec::new(),
        }
    }
}

impl HidConfig {
    pub fn is_disabled(&self, product_id: u16) -> bool {
        self.disabled_products.contains(&product_id)
    }
}

/// Configuration loading failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cockpit-hid")
        .join("config.yaml")
}

/// Load configuration, reporting read and parse failures
///
/// A missing file is not an error and yields the defaults.
pub fn try_load_config(path: &Path) -> Result<HidConfig, ConfigError> {
    if !path.exists() {
        return Ok(HidConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist or can't be parsed, returns the defaults.
pub fn load_config(path: &Path) -> HidConfig {
    log::info!("load_config: Loading from {:?}", path);

    match try_load_config(path) {
        Ok(config) => {
            log::info!(
                "load_config: queue depth {}, read timeout {} ms, hot-plug poll {} ms",
                config.queue_depth,
                config.read_timeout_ms,
                config.hotplug_poll_ms
            );
            config
        }
        Err(e) => {
            log::warn!("load_config: {}", e);
            HidConfig::default()
        }
    }
}

/// Save configuration to a YAML file
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &HidConfig, path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;

    log::info!("save_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("save_config: Config saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("cockpit-hid-test-{}-{}", std::process::id(), name))
            .join("config.yaml")
    }

    #[test]
    fn test_default_config() {
        let config = HidConfig::default();
        assert_eq!(config.queue_depth, 256);
        assert_eq!(config.hotplug_poll_ms, 2000);
        assert_eq!(config.cdu_background, CduBackground::Logo);
        assert!(config.disabled_products.is_empty());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
queue_depth: 16
cdu_background: "blue"
disabled_products: [47969]
"#;
        let config: HidConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.queue_depth, 16);
        assert_eq!(config.cdu_background, CduBackground::Blue);
        assert!(config.is_disabled(0xBB61));
        assert_eq!(config.read_timeout_ms, 10);
        assert_eq!(config.fcu_backlight, 180);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = temp_path("missing");
        assert_eq!(try_load_config(&path).unwrap(), HidConfig::default());
        assert_eq!(load_config(&path), HidConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("save");
        let config = HidConfig {
            pdc_backlight: 42,
            min_display_interval_ticks: 5,
            ..HidConfig::default()
        };
        save_config(&config, &path).unwrap();
        assert_eq!(try_load_config(&path).unwrap(), config);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_invalid_yaml_is_reported() {
        let path = temp_path("invalid");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "queue_depth: [not, a, number]").unwrap();
        assert!(matches!(try_load_config(&path), Err(ConfigError::Parse { .. })));
        assert_eq!(load_config(&path), HidConfig::default());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
