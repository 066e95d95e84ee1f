#[cfg(feature = "cli")]
pub mod cli;
pub mod registry_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use registry_config::RegistryConfig;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};

/// Plain settings for embedding the pipeline as a library.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub input_path: String,
    pub registry_path: Option<String>,
    pub workers: usize,
}

impl AnalysisSettings {
    pub fn new(input_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            registry_path: None,
            workers: 1,
        }
    }

    pub fn with_registry_path(mut self, path: impl Into<String>) -> Self {
        self.registry_path = Some(path.into());
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

impl ConfigProvider for AnalysisSettings {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn registry_path(&self) -> Option<&str> {
        self.registry_path.as_deref()
    }

    fn workers(&self) -> usize {
        self.workers
    }
}

impl Validate for AnalysisSettings {
    fn validate(&self) -> Result<()> {
        validation::field("input_path").file_path(&self.input_path)?;
        if let Some(path) = &self.registry_path {
            validation::field("registry_path").extension(path, &["toml", "json"])?;
        }
        validation::field("workers").at_least(self.workers, 1)?;
        Ok(())
    }
}
