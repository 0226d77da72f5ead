//! Index-level settings consumed while building field mappings.
//!
//! Settings are usually read from a TOML file:
//!
//! ```toml
//! [index]
//! version_created = "2.0.0-beta1"
//!
//! [index.analysis.analyzer.autocomplete]
//! type = "custom"
//! tokenizer = "standard"
//! filter = ["lowercase"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::version::IndexVersion;

/// Configuration file root; the index settings live under `[index]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub index: IndexSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Version of the engine that created the index. Gates legacy mapping keys.
    #[serde(default)]
    pub version_created: IndexVersion,
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default)]
    pub analyzer: BTreeMap<String, AnalyzerSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    #[serde(rename = "type", default = "default_analyzer_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<String>,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            kind: default_analyzer_kind(),
            tokenizer: None,
            filter: Vec::new(),
        }
    }
}

fn default_analyzer_kind() -> String {
    "custom".to_string()
}

/// Error raised while loading a settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl IndexSettings {
    pub fn with_version(version_created: IndexVersion) -> Self {
        Self {
            version_created,
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let file: SettingsFile = toml::from_str(content)?;
        Ok(file.index)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
