use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "robot-taxonomy")]
#[command(about = "Classify robot records into a taxonomy and report diversity metrics")]
pub struct CliConfig {
    #[arg(long, help = "JSON array or NDJSON file of robot records")]
    pub input: String,

    #[arg(long, help = "Taxonomy registry (.toml or .json); the built-in registry when omitted")]
    pub registry: Option<String>,

    #[arg(long, default_value = "1")]
    pub workers: usize,

    #[arg(long, help = "List the nearest relatives of this record id")]
    pub similar_to: Option<String>,

    #[arg(long, default_value = "5")]
    pub top_n: usize,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn registry_path(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    fn workers(&self) -> usize {
        self.workers
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        let input = validation::field("input");
        input.file_path(&self.input)?;
        input.extension(&self.input, &["json", "ndjson", "jsonl"])?;

        if let Some(registry) = &self.registry {
            let field = validation::field("registry");
            field.file_path(registry)?;
            field.extension(registry, &["toml", "json"])?;
        }

        validation::field("workers").at_least(self.workers, 1)?;
        validation::field("top_n").at_least(self.top_n, 1)?;

        if let Some(id) = &self.similar_to {
            validation::field("similar_to").non_empty(id)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let config = CliConfig::parse_from(["robot-taxonomy", "--input", "robots.json"]);
        assert_eq!(config.input_path(), "robots.json");
        assert_eq!(config.registry_path(), None);
        assert_eq!(config.workers(), 1);
        assert_eq!(config.top_n, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_all_flags() {
        let config = CliConfig::parse_from([
            "robot-taxonomy",
            "--input",
            "robots.ndjson",
            "--registry",
            "custom.toml",
            "--workers",
            "4",
            "--similar-to",
            "spot",
            "--top-n",
            "3",
            "--verbose",
            "--json-logs",
        ]);
        assert_eq!(config.registry_path(), Some("custom.toml"));
        assert_eq!(config.workers(), 4);
        assert_eq!(config.similar_to.as_deref(), Some("spot"));
        assert!(config.verbose && config.json_logs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let csv = CliConfig::parse_from(["robot-taxonomy", "--input", "robots.csv"]);
        assert!(csv.validate().is_err());

        let zero_workers =
            CliConfig::parse_from(["robot-taxonomy", "--input", "robots.json", "--workers", "0"]);
        assert!(zero_workers.validate().is_err());

        let blank_id =
            CliConfig::parse_from(["robot-taxonomy", "--input", "robots.json", "--similar-to", " "]);
        assert!(blank_id.validate().is_err());
    }
}
