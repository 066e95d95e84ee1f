pub mod classifier;
pub mod evidence;
pub mod metrics;
pub mod registry;
pub mod report;
pub mod store;

pub use classifier::{classify, LevelDecision};
pub use evidence::EvidenceExtractor;
pub use metrics::{distance, diversity, nearest_relatives, DISTANCE_LEVELS, MAX_DISTANCE};
pub use registry::{Rule, TaxonomyRegistry, Trigger};
pub use report::{AnalysisReport, TaxonomySummary};
pub use store::{build_store, classify_batch, BatchOutcome, BatchReport, ClassificationStore};
