use crate::format::FormatPolicy;
use crate::kdf::KdfParams;
use crate::normalize::NormalizationConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything that, together with the master secret and site context,
/// determines a password. Missing keys fall back to their defaults; unknown
/// keys are rejected, since a misspelled option would otherwise silently
/// change every derived password.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub kdf: KdfParams,
    pub policy: FormatPolicy,
    pub label_steps: NormalizationConfig,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize settings")
    }
}
