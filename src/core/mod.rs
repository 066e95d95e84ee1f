pub mod engine;
pub mod parallel;
pub mod pipeline;

pub use crate::domain::model::{ClassifiedRecord, RawRecord};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RecordSource};
pub use crate::utils::error::Result;
pub use engine::AnalysisEngine;
pub use parallel::classify_concurrently;
pub use pipeline::TaxonomyPipeline;
