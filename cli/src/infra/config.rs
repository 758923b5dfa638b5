//! Infrastructure implementation of the `ConfigStore` port.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::config::{CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE, EmbedConfig};

/// Production implementation of `ConfigStore` that reads a YAML file on disk.
#[derive(Debug, Clone)]
pub struct YamlConfigStore {
    path: PathBuf,
    /// Named by `--config` or the environment; must then exist.
    explicit: bool,
}

impl YamlConfigStore {
    /// `--config` first, then `AGENT_EMBEDDER_CONFIG`, then
    /// `./agent-embedder.yaml`.
    #[must_use]
    pub fn resolve(cli_path: Option<PathBuf>) -> Self {
        let env_path = std::env::var_os(CONFIG_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        match cli_path.or(env_path) {
            Some(path) => Self::at(path),
            None => Self {
                path: PathBuf::from(DEFAULT_CONFIG_FILE),
                explicit: false,
            },
        }
    }

    /// Store for a file that must exist.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            explicit: true,
        }
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<EmbedConfig> {
        if !self.explicit && !self.path.exists() {
            return Ok(EmbedConfig::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read {}", self.path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", self.path.display()))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
