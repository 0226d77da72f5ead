use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use legacom::IndexSettings;

/// Settings file looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "legacom.toml";

/// Index settings the mapping commands run against
#[derive(Debug)]
pub struct ToolContext {
    /// Settings file that was loaded, if any
    pub config_path: Option<PathBuf>,
    pub settings: IndexSettings,
}

impl ToolContext {
    /// Load settings from `explicit`, or from `legacom.toml` in the current directory
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::load_from(&current_dir, explicit)
    }

    /// Load settings relative to `dir`.
    ///
    /// An explicit path must exist. Without one, a missing `legacom.toml` means defaults.
    pub fn load_from(dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file {} does not exist", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Some(dir.join(DEFAULT_CONFIG_FILE)).filter(|path| path.exists()),
        };

        let settings = match &config_path {
            Some(path) => IndexSettings::load(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => IndexSettings::default(),
        };

        Ok(Self { config_path, settings })
    }

    /// Human readable origin of the settings
    pub fn source(&self) -> String {
        match &self.config_path {
            Some(path) => path.display().to_string(),
            None => "defaults".to_string(),
        }
    }
}
