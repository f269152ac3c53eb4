use std::path::{Path, PathBuf};

use config::{Config as ConfigBuilder, File};
use tracing::debug;

use crate::{DeferError, DeferResult};

use super::NamedConfigurations;

/// Where named configurations come from.
pub trait ConfigurationSource: Send + Sync {
    fn load(&self) -> DeferResult<NamedConfigurations>;

    /// Human readable origin for log lines.
    fn describe(&self) -> String;
}

/// Loads named configurations from a TOML, YAML or JSON file; the format is
/// picked from the file extension.
#[derive(Debug, Clone)]
pub struct FileConfigurationSource {
    path: PathBuf,
}

impl FileConfigurationSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigurationSource for FileConfigurationSource {
    fn load(&self) -> DeferResult<NamedConfigurations> {
        if !self.path.exists() {
            return Err(DeferError::Configuration(format!(
                "File not found: {}",
                self.path.display()
            )));
        }

        let named: NamedConfigurations = ConfigBuilder::builder()
            .add_source(File::from(self.path.as_path()).required(true))
            .build()?
            .try_deserialize()?;

        debug!(
            path = %self.path.display(),
            environments = named.environments.len(),
            has_default = named.default.is_some(),
            "loaded named configurations"
        );
        Ok(named)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory configurations, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigurationSource {
    named: NamedConfigurations,
}

impl StaticConfigurationSource {
    pub fn new(named: NamedConfigurations) -> Self {
        Self { named }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl ConfigurationSource for StaticConfigurationSource {
    fn load(&self) -> DeferResult<NamedConfigurations> {
        Ok(self.named.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}
