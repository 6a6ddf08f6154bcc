//! Layered application configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory name used under the platform config and data roots.
pub const APP_DIR: &str = "worldnav";

/// Prefix for environment overrides, e.g. `WORLDNAV_SEED=7`.
pub const ENV_PREFIX: &str = "WORLDNAV";

const DEFAULT_CONFIG: &str = r#"# World Navigation configuration.

# Where the city table and rankings are stored.
# data_dir = "/path/to/data"

# Fixed seed for reproducible city draws.
# seed = 42

# Set to false to keep everything in memory for this run.
persist = true
"#;

/// Runtime settings for the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding `cities.json` and the rankings blob.
    pub data_dir: PathBuf,
    /// Seed for the city-selection RNG; entropy when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Whether the stores write to disk.
    #[serde(default = "default_persist")]
    pub persist: bool,
}

fn default_persist() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            seed: None,
            persist: true,
        }
    }
}

impl AppConfig {
    /// Load defaults, the user config file and environment overrides, in that order.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Same as [`AppConfig::load`] with an explicit config file location.
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .set_default("persist", defaults.persist)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;
        let config: Self = settings
            .try_deserialize()
            .context("invalid configuration")?;
        info!(data_dir = %config.data_dir.display(), seed = ?config.seed, persist = config.persist, "Configuration loaded");
        Ok(config)
    }

    /// RNG for city draws, seeded when a seed is configured.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Location of the user configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Default data directory under the platform data root.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(&dir.path().join("absent.toml"))?;
        assert_eq!(config.data_dir, default_data_dir());
        assert!(config.persist);
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        let data_dir = dir.path().join("data");
        fs::write(
            &path,
            format!(
                "data_dir = {:?}\nseed = 99\npersist = false\n",
                data_dir.to_string_lossy()
            ),
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.data_dir, data_dir);
        assert_eq!(config.seed, Some(99));
        assert!(!config.persist);
        Ok(())
    }

    #[test]
    fn default_file_is_written_once_and_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.toml");
        write_default_config(&path)?;
        fs::write(&path, format!("{DEFAULT_CONFIG}\nseed = 1\n"))?;
        write_default_config(&path)?;
        assert!(fs::read_to_string(&path)?.contains("seed = 1"));

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.seed, Some(1));
        Ok(())
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let config = AppConfig {
            seed: Some(5),
            ..AppConfig::default()
        };
        let a: u64 = config.rng().gen();
        let b: u64 = config.rng().gen();
        assert_eq!(a, b);
    }
}
