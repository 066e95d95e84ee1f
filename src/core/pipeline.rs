use crate::core::parallel::classify_concurrently;
use crate::domain::model::RawRecord;
use crate::domain::ports::{ConfigProvider, Pipeline, RecordSource};
use crate::taxonomy::registry::TaxonomyRegistry;
use crate::taxonomy::report::AnalysisReport;
use crate::taxonomy::store::{classify_batch, BatchOutcome};
use crate::utils::error::Result;
use std::sync::Arc;

/// Source → classification → analysis over one shared, read-only registry.
pub struct TaxonomyPipeline<S: RecordSource, C: ConfigProvider> {
    source: S,
    config: C,
    registry: Arc<TaxonomyRegistry>,
}

impl<S: RecordSource, C: ConfigProvider> TaxonomyPipeline<S, C> {
    pub fn new(source: S, config: C, registry: Arc<TaxonomyRegistry>) -> Self {
        Self {
            source,
            config,
            registry,
        }
    }

    /// 依設定載入分類表；未指定時使用內建分類表
    pub fn from_config(source: S, config: C) -> Result<Self> {
        let registry = match config.registry_path() {
            Some(path) => {
                tracing::info!("📚 Loading taxonomy registry from {}", path);
                TaxonomyRegistry::from_file(path)?
            }
            None => TaxonomyRegistry::builtin()?,
        };
        Ok(Self::new(source, config, Arc::new(registry)))
    }

    pub fn registry(&self) -> &TaxonomyRegistry {
        &self.registry
    }
}

#[async_trait::async_trait]
impl<S: RecordSource, C: ConfigProvider> Pipeline for TaxonomyPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<RawRecord>> {
        tracing::debug!("Fetching records from {}", self.config.input_path());
        self.source.fetch_records().await
    }

    async fn classify(&self, records: Vec<RawRecord>) -> Result<BatchOutcome> {
        let workers = self.config.workers();
        if workers > 1 {
            classify_concurrently(records, Arc::clone(&self.registry), workers).await
        } else {
            classify_batch(&records, &self.registry)
        }
    }

    async fn analyze(&self, outcome: BatchOutcome) -> Result<AnalysisReport> {
        AnalysisReport::build(&self.registry, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemorySource;
    use crate::config::AnalysisSettings;
    use crate::utils::error::TaxonomyError;

    fn sample() -> Vec<RawRecord> {
        vec![
            RawRecord::new("spot", "Spot").with_description("four-legged robot with cameras"),
            RawRecord::new("pepper", "Pepper").with_description("humanoid social companion"),
            RawRecord::new("spot", "Duplicate Spot"),
        ]
    }

    #[tokio::test]
    async fn test_pipeline_phases() {
        let pipeline = TaxonomyPipeline::from_config(
            InMemorySource::new(sample()),
            AnalysisSettings::new("memory"),
        )
        .unwrap();

        let records = pipeline.extract().await.unwrap();
        assert_eq!(records.len(), 3);

        let outcome = pipeline.classify(records).await.unwrap();
        assert_eq!(outcome.store.len(), 2);
        assert_eq!(outcome.report.failures.len(), 1);

        let report = pipeline.analyze(outcome).await.unwrap();
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.records()[1].class, "Humanoid");
    }

    #[tokio::test]
    async fn test_worker_count_does_not_change_outcome() {
        let sequential = TaxonomyPipeline::from_config(
            InMemorySource::new(sample()),
            AnalysisSettings::new("memory"),
        )
        .unwrap();
        let concurrent = TaxonomyPipeline::from_config(
            InMemorySource::new(sample()),
            AnalysisSettings::new("memory").with_workers(4),
        )
        .unwrap();

        let a = sequential.classify(sample()).await.unwrap();
        let b = concurrent.classify(sample()).await.unwrap();
        assert_eq!(a.store.all(), b.store.all());
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_missing_registry_file() {
        let result = TaxonomyPipeline::from_config(
            InMemorySource::default(),
            AnalysisSettings::new("memory").with_registry_path("/no/such/registry.toml"),
        );
        assert!(matches!(result, Err(TaxonomyError::IoError(_))));
    }
}
