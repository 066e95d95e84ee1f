pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod taxonomy;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{InMemorySource, JsonFileSource};
pub use config::{AnalysisSettings, RegistryConfig};
pub use core::{classify_concurrently, AnalysisEngine, TaxonomyPipeline};
pub use domain::model::{ClassifiedRecord, Level, RawRecord};
pub use taxonomy::{
    build_store, classify, classify_batch, distance, diversity, nearest_relatives,
    AnalysisReport, ClassificationStore, TaxonomyRegistry,
};
pub use utils::error::{Result, TaxonomyError};
