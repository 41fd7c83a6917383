//! Configuration file support for Replog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/replog/config.toml`.

use crate::{Error, Result, TimerMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub features: FeatureConfig,

    #[serde(default)]
    pub rest: RestConfig,

    #[serde(default)]
    pub data: DataConfig,
}

/// Feature switches consumed by the session engine
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default = "default_true")]
    pub show_previous_performance: bool,

    #[serde(default = "default_true")]
    pub rest_timer_enabled: bool,

    #[serde(default)]
    pub timer_type: TimerMode,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            show_previous_performance: true,
            rest_timer_enabled: true,
            timer_type: TimerMode::default(),
        }
    }
}

/// Rest timer durations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestConfig {
    #[serde(default = "default_rest_seconds")]
    pub default_seconds: u32,

    #[serde(default = "default_adjust_step")]
    pub adjust_step_seconds: u32,

    #[serde(default = "default_presets")]
    pub presets: Vec<u32>,

    #[serde(default = "default_rest_seconds")]
    pub default_set_timer_seconds: u32,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            default_seconds: default_rest_seconds(),
            adjust_step_seconds: default_adjust_step(),
            presets: default_presets(),
            default_set_timer_seconds: default_rest_seconds(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_rest_seconds() -> u32 {
    150
}

fn default_adjust_step() -> u32 {
    10
}

fn default_presets() -> Vec<u32> {
    vec![60, 90, 120, 150, 180, 240, 300]
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME")
            .expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("replog")
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME")
                .expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("replog").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
